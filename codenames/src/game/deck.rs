//! Board generation.
//!
//! A board is drawn in two shuffles: the word pool is permuted and cut to
//! 25 words, types are assigned in fixed 9/8/7/1 order, and the resulting
//! pairs are permuted again so no card type can be inferred from position.

use rand::{Rng, seq::SliceRandom};
use std::collections::HashSet;
use uuid::{Builder, Uuid};

use super::{
    entities::{
        ASSASSIN_CARDS, BOARD_SIZE, Card, CardType, FIRST_TEAM_CARDS, NEUTRAL_CARDS,
        SECOND_TEAM_CARDS, Team,
    },
    errors::{GameError, GameResult},
};

/// A freshly generated board.
#[derive(Clone, Debug)]
pub struct Deck {
    pub cards: Vec<Card>,
    /// Team holding nine cards. It also takes the first turn.
    pub first_team: Team,
}

impl Deck {
    pub fn count(&self, card_type: CardType) -> usize {
        self.cards
            .iter()
            .filter(|c| c.card_type == card_type)
            .count()
    }
}

/// Uppercases, trims and de-duplicates a word pool, keeping first
/// occurrences in order.
pub fn normalize_words(words: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .iter()
        .map(|w| w.trim().to_uppercase())
        .filter(|w| !w.is_empty() && seen.insert(w.clone()))
        .collect()
}

/// Builds a 25-card board from `words` using `rng` for every random choice,
/// card IDs included, so a seeded RNG reproduces the exact same board.
pub fn generate_deck<R: Rng>(words: &[String], rng: &mut R) -> GameResult<Deck> {
    let mut pool = normalize_words(words);
    if pool.len() < BOARD_SIZE {
        return Err(GameError::InsufficientWords {
            required: BOARD_SIZE,
            available: pool.len(),
        });
    }

    pool.shuffle(rng);
    pool.truncate(BOARD_SIZE);

    let (first_team, first_color, second_color) = if rng.random_bool(0.5) {
        (Team::Red, CardType::Red, CardType::Blue)
    } else {
        (Team::Blue, CardType::Blue, CardType::Red)
    };

    let types = std::iter::repeat_n(first_color, FIRST_TEAM_CARDS)
        .chain(std::iter::repeat_n(second_color, SECOND_TEAM_CARDS))
        .chain(std::iter::repeat_n(CardType::Neutral, NEUTRAL_CARDS))
        .chain(std::iter::repeat_n(CardType::Assassin, ASSASSIN_CARDS));

    let mut cards: Vec<Card> = pool
        .into_iter()
        .zip(types)
        .map(|(word, card_type)| Card {
            id: card_id(rng).to_string(),
            word,
            card_type,
            revealed: false,
        })
        .collect();

    cards.shuffle(rng);

    Ok(Deck { cards, first_team })
}

fn card_id<R: Rng>(rng: &mut R) -> Uuid {
    Builder::from_random_bytes(rng.random()).into_uuid()
}
