//! Game engine: rule checks and state transitions for every session.
//!
//! Each operation validates and mutates a private copy of the session under
//! the store's write lock; the copy replaces the stored snapshot only when
//! the whole operation succeeds. The committed snapshot is then handed to
//! the update publisher, outside the lock; publishes of concurrent
//! operations may arrive out of order, so every snapshot carries the
//! session `version` it was committed at.

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use super::{
    deck::{Deck, generate_deck},
    entities::{CardType, GameState, Player, SessionId, Team},
    errors::{GameError, GameResult},
    store::SessionStore,
};
use crate::{publisher::UpdatePublisher, words::WordRepository};

/// What a successful reveal did to the game.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevealOutcome {
    /// Own color, more left: the team keeps guessing
    KeepGuessing,
    /// Opposing color or neutral: the turn passes to `next`
    TurnPassed { next: Team },
    /// Last card of a color found
    ColorCleared { winner: Team },
    /// Assassin hit, the other team wins
    Assassin { winner: Team },
}

fn require(value: &str, field: &str) -> GameResult<()> {
    if value.trim().is_empty() {
        return Err(GameError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}

fn playing_member<'a>(state: &'a GameState, player_id: &str) -> GameResult<&'a Player> {
    let player = state
        .player(player_id)
        .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
    if !player.team.is_playing() {
        return Err(GameError::SpectatorCannotAct);
    }
    Ok(player)
}

fn apply_reveal(state: &mut GameState, card_id: &str, player_id: &str) -> GameResult<RevealOutcome> {
    if state.is_over() {
        return Err(GameError::GameOver);
    }

    let player = playing_member(state, player_id)?;
    if player.is_spymaster {
        return Err(GameError::SpymasterCannotReveal);
    }
    let acting_team = player.team;
    if acting_team != state.current_turn {
        return Err(GameError::NotYourTurn);
    }

    let card = state
        .cards
        .iter_mut()
        .find(|c| c.id == card_id)
        .ok_or_else(|| GameError::CardNotFound(card_id.to_string()))?;
    if card.revealed {
        return Err(GameError::CardAlreadyRevealed);
    }
    card.revealed = true;
    let card_type = card.card_type;

    let outcome = match (card_type, card_type.owner()) {
        (_, Some(owner)) => {
            let left = match owner {
                Team::Red => &mut state.red_cards_left,
                _ => &mut state.blue_cards_left,
            };
            *left = left.saturating_sub(1);
            let cleared = *left == 0;

            if owner != acting_team {
                state.current_turn = owner;
            }

            if cleared {
                state.winning_team = Some(owner);
                RevealOutcome::ColorCleared { winner: owner }
            } else if owner == acting_team {
                RevealOutcome::KeepGuessing
            } else {
                RevealOutcome::TurnPassed { next: owner }
            }
        }
        (CardType::Assassin, None) => {
            let winner = acting_team.opponent().unwrap_or(Team::Spectator);
            state.winning_team = Some(winner);
            RevealOutcome::Assassin { winner }
        }
        (_, None) => {
            let next = acting_team.opponent().unwrap_or(acting_team);
            state.current_turn = next;
            RevealOutcome::TurnPassed { next }
        }
    };

    state.touch();
    Ok(outcome)
}

/// Owns every live session and applies the game rules to them.
pub struct GameEngine {
    store: SessionStore,
    words: Arc<dyn WordRepository>,
    publisher: Arc<dyn UpdatePublisher>,
    rng: Mutex<StdRng>,
}

impl GameEngine {
    pub fn new(words: Arc<dyn WordRepository>, publisher: Arc<dyn UpdatePublisher>) -> Self {
        Self::with_rng(words, publisher, StdRng::from_os_rng())
    }

    /// Engine drawing boards from the given RNG. A seeded RNG makes board
    /// generation reproducible.
    pub fn with_rng(
        words: Arc<dyn WordRepository>,
        publisher: Arc<dyn UpdatePublisher>,
        rng: StdRng,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            words,
            publisher,
            rng: Mutex::new(rng),
        }
    }

    pub async fn game_count(&self) -> usize {
        self.store.len().await
    }

    pub async fn game_ids(&self) -> Vec<SessionId> {
        self.store.ids().await
    }

    fn draw_deck(&self, words: &[String]) -> GameResult<Deck> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        generate_deck(words, &mut *rng)
    }

    async fn publish(&self, snapshot: &Arc<GameState>) {
        self.publisher.publish(snapshot).await;
    }

    /// Starts a new session with a fresh board. The creator joins as a
    /// spectator and picks a side later.
    pub async fn create_game(&self, creator_id: &str, username: &str) -> GameResult<Arc<GameState>> {
        require(creator_id, "creator_id")?;
        require(username, "username")?;

        let words = self.words.list_words().await.map_err(|e| {
            log::error!("Failed to load word pool: {e}");
            GameError::WordSource(e.client_message())
        })?;
        let deck = self.draw_deck(&words)?;

        let now = Utc::now();
        let state = GameState {
            id: Uuid::new_v4().to_string(),
            red_cards_left: deck.count(CardType::Red),
            blue_cards_left: deck.count(CardType::Blue),
            current_turn: deck.first_team,
            cards: deck.cards,
            players: vec![Player::new(creator_id, username, Team::Spectator)],
            winning_team: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let snapshot = self.store.insert(state).await;
        log::info!(
            "Game {} created by {} ({} starts)",
            snapshot.id,
            creator_id,
            snapshot.current_turn
        );
        self.publish(&snapshot).await;
        Ok(snapshot)
    }

    pub async fn get_game(&self, game_id: &str) -> GameResult<Arc<GameState>> {
        require(game_id, "game_id")?;
        self.store.get(game_id).await
    }

    /// Adds a player, or updates name and team of a player already in the
    /// session.
    pub async fn join_game(
        &self,
        game_id: &str,
        player_id: &str,
        username: &str,
        team: Team,
    ) -> GameResult<Arc<GameState>> {
        require(game_id, "game_id")?;
        require(player_id, "player_id")?;
        require(username, "username")?;

        let snapshot = self
            .store
            .update(game_id, |state| {
                match state.player_mut(player_id) {
                    Some(player) => {
                        if player.team != team {
                            player.is_spymaster = false;
                        }
                        player.username = username.to_string();
                        player.team = team;
                    }
                    None => state.players.push(Player::new(player_id, username, team)),
                }
                state.touch();
                Ok(())
            })
            .await?;

        log::info!("Player {} joined game {} as {}", player_id, game_id, team);
        self.publish(&snapshot).await;
        Ok(snapshot)
    }

    pub async fn reveal_card(
        &self,
        game_id: &str,
        card_id: &str,
        player_id: &str,
    ) -> GameResult<Arc<GameState>> {
        require(game_id, "game_id")?;
        require(card_id, "card_id")?;
        require(player_id, "player_id")?;

        let mut outcome = None;
        let snapshot = self
            .store
            .update(game_id, |state| {
                outcome = Some(apply_reveal(state, card_id, player_id)?);
                Ok(())
            })
            .await?;

        if let Some(outcome) = outcome {
            log::debug!("Game {}: card {} revealed, {:?}", game_id, card_id, outcome);
        }
        if let Some(winner) = snapshot.winning_team {
            log::info!("Game {} over, {} wins", game_id, winner);
        }

        self.publish(&snapshot).await;
        Ok(snapshot)
    }

    pub async fn set_spymaster(&self, game_id: &str, player_id: &str) -> GameResult<Arc<GameState>> {
        require(game_id, "game_id")?;
        require(player_id, "player_id")?;

        let snapshot = self
            .store
            .update(game_id, |state| {
                let team = playing_member(state, player_id)?.team;
                if let Some(current) = state.spymaster_of(team)
                    && current.id != player_id
                {
                    return Err(GameError::SpymasterAlreadyAssigned(team));
                }

                if let Some(player) = state.player_mut(player_id) {
                    player.is_spymaster = true;
                }
                state.touch();
                Ok(())
            })
            .await?;

        log::info!("Player {} is now spymaster in game {}", player_id, game_id);
        self.publish(&snapshot).await;
        Ok(snapshot)
    }

    pub async fn end_turn(&self, game_id: &str, player_id: &str) -> GameResult<Arc<GameState>> {
        require(game_id, "game_id")?;
        require(player_id, "player_id")?;

        let snapshot = self
            .store
            .update(game_id, |state| {
                if state.is_over() {
                    return Err(GameError::GameOver);
                }
                let team = playing_member(state, player_id)?.team;
                if team != state.current_turn {
                    return Err(GameError::NotYourTurn);
                }

                state.current_turn = team.opponent().unwrap_or(team);
                state.touch();
                Ok(())
            })
            .await?;

        log::debug!(
            "Game {}: turn ended by {}, {} to play",
            game_id,
            player_id,
            snapshot.current_turn
        );
        self.publish(&snapshot).await;
        Ok(snapshot)
    }

    /// Moves a player to `team`. A spymaster has to step down to spectator
    /// before joining another team; doing so clears the role.
    pub async fn change_team(
        &self,
        game_id: &str,
        player_id: &str,
        team: Team,
    ) -> GameResult<Arc<GameState>> {
        require(game_id, "game_id")?;
        require(player_id, "player_id")?;

        let snapshot = self
            .store
            .update(game_id, |state| {
                let player = state
                    .player_mut(player_id)
                    .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
                if player.is_spymaster && team != Team::Spectator {
                    return Err(GameError::SpymasterMustSpectate);
                }

                player.team = team;
                if team == Team::Spectator {
                    player.is_spymaster = false;
                }
                state.touch();
                Ok(())
            })
            .await?;

        log::info!("Player {} moved to {} in game {}", player_id, team, game_id);
        self.publish(&snapshot).await;
        Ok(snapshot)
    }
}
