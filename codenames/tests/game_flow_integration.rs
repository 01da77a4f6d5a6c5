//! Integration tests for complete game flows.
//!
//! Drives the engine through whole games while a hub viewer watches the
//! snapshots go by.

use async_trait::async_trait;
use codenames::{
    CardType, GameEngine, GameError, GameState, HubActor, HubConfig, HubPublisher, NoopPublisher,
    Team, UpdatePublisher,
    hub::{HubHandle, Payload},
    words::InMemoryWordRepository,
};
use rand::{SeedableRng, rngs::StdRng};
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, time};

/// Hub publisher that stalls on snapshots holding `slow_player` but not
/// `fast_player`, so an earlier commit is published after a later one.
struct StallingPublisher {
    inner: HubPublisher,
    slow_player: &'static str,
    fast_player: &'static str,
}

#[async_trait]
impl UpdatePublisher for StallingPublisher {
    async fn publish(&self, snapshot: &GameState) {
        if snapshot.player(self.slow_player).is_some()
            && snapshot.player(self.fast_player).is_none()
        {
            time::sleep(Duration::from_millis(200)).await;
        }
        self.inner.publish(snapshot).await;
    }
}

fn engine_with_hub(hub: &HubHandle) -> GameEngine {
    GameEngine::with_rng(
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(HubPublisher::new(hub.clone())),
        StdRng::seed_from_u64(42),
    )
}

fn decode(payload: Payload) -> GameState {
    serde_json::from_slice(&payload).unwrap()
}

/// Creates a game with one red and one blue guesser.
async fn seated_game(engine: &GameEngine) -> Arc<GameState> {
    let game = engine.create_game("host", "Host").await.unwrap();
    engine
        .join_game(&game.id, "red1", "Rita", Team::Red)
        .await
        .unwrap();
    engine
        .join_game(&game.id, "blue1", "Bruno", Team::Blue)
        .await
        .unwrap()
}

fn guesser(team: Team) -> &'static str {
    match team {
        Team::Red => "red1",
        _ => "blue1",
    }
}

fn unrevealed(state: &GameState, card_type: CardType) -> Vec<String> {
    state
        .cards
        .iter()
        .filter(|c| c.card_type == card_type && !c.revealed)
        .map(|c| c.id.clone())
        .collect()
}

#[tokio::test]
async fn test_first_team_clears_its_color_and_wins() {
    let engine = GameEngine::new(
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(NoopPublisher),
    );
    let game = seated_game(&engine).await;
    let starter = game.current_turn;
    let color = starter.card_type().unwrap();
    let ids = unrevealed(&game, color);
    assert_eq!(ids.len(), 9);

    let mut state = game;
    for (i, card_id) in ids.iter().enumerate() {
        state = engine
            .reveal_card(&state.id, card_id, guesser(starter))
            .await
            .unwrap();
        assert_eq!(state.cards_left(color), 9 - i - 1);
        if i + 1 < ids.len() {
            assert_eq!(state.current_turn, starter, "own color keeps the turn");
            assert!(!state.is_over());
        }
    }

    assert_eq!(state.winning_team, Some(starter));
    let counter = match starter {
        Team::Red => state.red_cards_left,
        _ => state.blue_cards_left,
    };
    assert_eq!(counter, 0);

    // The board is frozen once a winner exists.
    let leftover = unrevealed(&state, CardType::Neutral)[0].clone();
    let err = engine
        .reveal_card(&state.id, &leftover, guesser(starter))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::GameOver));
    let err = engine
        .end_turn(&state.id, guesser(starter))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::GameOver));
}

#[tokio::test]
async fn test_assassin_hands_victory_to_opponent() {
    let engine = GameEngine::new(
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(NoopPublisher),
    );
    let game = seated_game(&engine).await;
    let starter = game.current_turn;
    let assassin = unrevealed(&game, CardType::Assassin)[0].clone();

    let state = engine
        .reveal_card(&game.id, &assassin, guesser(starter))
        .await
        .unwrap();

    assert_eq!(state.winning_team, starter.opponent());
    assert!(state.card(&assassin).unwrap().revealed);
}

#[tokio::test]
async fn test_turns_alternate_between_teams() {
    let engine = GameEngine::new(
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(NoopPublisher),
    );
    let game = seated_game(&engine).await;
    let starter = game.current_turn;
    let second = starter.opponent().unwrap();

    // The second team cannot move first.
    let neutral = unrevealed(&game, CardType::Neutral)[0].clone();
    let err = engine
        .reveal_card(&game.id, &neutral, guesser(second))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::NotYourTurn));

    let state = engine.end_turn(&game.id, guesser(starter)).await.unwrap();
    assert_eq!(state.current_turn, second);

    // Revealing an opposing card passes the turn to its owner.
    let opposing = unrevealed(&state, starter.card_type().unwrap())[0].clone();
    let state = engine
        .reveal_card(&game.id, &opposing, guesser(second))
        .await
        .unwrap();
    assert_eq!(state.current_turn, starter);
    assert!(!state.is_over());
}

#[tokio::test]
async fn test_spymaster_roles_through_a_game() {
    let engine = GameEngine::new(
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(NoopPublisher),
    );
    let game = seated_game(&engine).await;
    engine
        .join_game(&game.id, "red2", "Rex", Team::Red)
        .await
        .unwrap();

    let state = engine.set_spymaster(&game.id, "red1").await.unwrap();
    assert_eq!(state.spymaster_of(Team::Red).unwrap().id, "red1");

    let err = engine.set_spymaster(&game.id, "red2").await.unwrap_err();
    assert!(matches!(err, GameError::SpymasterAlreadyAssigned(Team::Red)));

    let err = engine
        .change_team(&game.id, "red1", Team::Blue)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::SpymasterMustSpectate));

    let state = engine
        .change_team(&game.id, "red1", Team::Spectator)
        .await
        .unwrap();
    assert!(state.spymaster_of(Team::Red).is_none());

    let state = engine.set_spymaster(&game.id, "red2").await.unwrap();
    assert_eq!(state.spymaster_of(Team::Red).unwrap().id, "red2");
}

#[tokio::test]
async fn test_viewer_sees_every_committed_mutation() {
    let hub = HubActor::spawn(HubConfig::default());
    let engine = engine_with_hub(&hub);

    let game = engine.create_game("host", "Host").await.unwrap();
    let (viewer, mut queue) = hub.new_client("viewer", &game.id);
    hub.register(viewer).await.unwrap();

    engine
        .join_game(&game.id, "red1", "Rita", Team::Red)
        .await
        .unwrap();
    let snapshot = decode(queue.recv().await.unwrap());
    assert_eq!(snapshot.players.len(), 2);

    let last = engine
        .join_game(&game.id, "blue1", "Bruno", Team::Blue)
        .await
        .unwrap();
    let snapshot = decode(queue.recv().await.unwrap());
    assert_eq!(snapshot, *last);

    // Rejected actions publish nothing.
    let _ = engine.end_turn(&game.id, "nobody").await.unwrap_err();
    assert!(matches!(
        queue.try_recv(),
        Err(mpsc::error::TryRecvError::Empty)
    ));

    hub.shutdown().await;
}

#[tokio::test]
async fn test_viewers_of_other_games_are_not_notified() {
    let hub = HubActor::spawn(HubConfig::default());
    let engine = engine_with_hub(&hub);

    let first = engine.create_game("a", "A").await.unwrap();
    let second = engine.create_game("b", "B").await.unwrap();

    let (viewer, mut queue) = hub.new_client("viewer", &second.id);
    hub.register(viewer).await.unwrap();

    engine
        .join_game(&first.id, "red1", "Rita", Team::Red)
        .await
        .unwrap();
    engine
        .join_game(&second.id, "blue1", "Bruno", Team::Blue)
        .await
        .unwrap();

    let snapshot = decode(queue.recv().await.unwrap());
    assert_eq!(snapshot.id, second.id);
    assert!(queue.try_recv().is_err());
}

#[tokio::test]
async fn test_seeded_engines_deal_identical_boards() {
    let make = || {
        GameEngine::with_rng(
            Arc::new(InMemoryWordRepository::new()),
            Arc::new(NoopPublisher),
            StdRng::seed_from_u64(9),
        )
    };
    let a = make().create_game("u1", "A").await.unwrap();
    let b = make().create_game("u1", "A").await.unwrap();

    assert_eq!(a.cards, b.cards);
    assert_eq!(a.current_turn, b.current_turn);
    assert_ne!(a.id, b.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_viewers_end_on_latest_state_when_publishes_race() {
    let hub = HubActor::spawn(HubConfig::default());
    let engine = Arc::new(GameEngine::with_rng(
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(StallingPublisher {
            inner: HubPublisher::new(hub.clone()),
            slow_player: "u3",
            fast_player: "u4",
        }),
        StdRng::seed_from_u64(3),
    ));

    let game = engine.create_game("u1", "Alice").await.unwrap();
    engine
        .join_game(&game.id, "u2", "Bob", Team::Red)
        .await
        .unwrap();
    let (viewer, mut queue) = hub.new_client("viewer", &game.id);
    hub.register(viewer).await.unwrap();

    // u3 commits first but its publish stalls; u4 commits and publishes.
    let slow = {
        let engine = engine.clone();
        let game_id = game.id.clone();
        tokio::spawn(async move { engine.join_game(&game_id, "u3", "Cy", Team::Blue).await })
    };
    time::sleep(Duration::from_millis(50)).await;
    engine
        .join_game(&game.id, "u4", "Di", Team::Blue)
        .await
        .unwrap();
    slow.await.unwrap().unwrap();

    let stored = engine.get_game(&game.id).await.unwrap();
    assert_eq!(stored.players.len(), 4);

    let mut last = None;
    while let Ok(payload) = queue.try_recv() {
        last = Some(decode(payload));
    }
    let last = last.expect("viewer received no update");
    assert_eq!(last, *stored);

    hub.shutdown().await;
}
