/// Property-based tests for board generation using proptest
///
/// These tests check board composition and word handling over arbitrary
/// word pools and seeds.
use codenames::{
    CardType, Team,
    game::{generate_deck, normalize_words},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;

// Strategy for a pool of distinct words, at least a full board
fn word_pool_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{3,10}", 25..80).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn test_board_composition(words in word_pool_strategy(), seed in any::<u64>()) {
        let deck = generate_deck(&words, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert_eq!(deck.cards.len(), 25);
        prop_assert_eq!(deck.count(CardType::Neutral), 7);
        prop_assert_eq!(deck.count(CardType::Assassin), 1);

        let (first, second) = match deck.first_team {
            Team::Red => (CardType::Red, CardType::Blue),
            Team::Blue => (CardType::Blue, CardType::Red),
            Team::Spectator => unreachable!("spectators never start"),
        };
        prop_assert_eq!(deck.count(first), 9);
        prop_assert_eq!(deck.count(second), 8);
        prop_assert!(deck.cards.iter().all(|c| !c.revealed));
    }

    #[test]
    fn test_board_words_come_from_pool(words in word_pool_strategy(), seed in any::<u64>()) {
        let deck = generate_deck(&words, &mut StdRng::seed_from_u64(seed)).unwrap();
        let pool: HashSet<String> = normalize_words(&words).into_iter().collect();

        let board_words: HashSet<&str> = deck.cards.iter().map(|c| c.word.as_str()).collect();
        prop_assert_eq!(board_words.len(), 25, "words on a board are distinct");
        prop_assert!(deck.cards.iter().all(|c| pool.contains(&c.word)));

        let ids: HashSet<&str> = deck.cards.iter().map(|c| c.id.as_str()).collect();
        prop_assert_eq!(ids.len(), 25, "card ids are distinct");
    }

    #[test]
    fn test_same_seed_same_board(words in word_pool_strategy(), seed in any::<u64>()) {
        let a = generate_deck(&words, &mut StdRng::seed_from_u64(seed)).unwrap();
        let b = generate_deck(&words, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a.cards, b.cards);
        prop_assert_eq!(a.first_team, b.first_team);
    }

    #[test]
    fn test_small_pools_are_rejected(words in prop::collection::vec("[a-z]{3,10}", 0..25)) {
        prop_assert!(generate_deck(&words, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_normalization_is_idempotent(words in prop::collection::vec("[ a-zA-Z]{0,8}", 0..40)) {
        let once = normalize_words(&words);
        prop_assert_eq!(normalize_words(&once), once.clone());
        prop_assert!(once.iter().all(|w| !w.is_empty() && w.trim() == w.as_str()));
        prop_assert!(once.iter().all(|w| *w == w.to_uppercase()));
    }
}
