//! Team word-guessing game: board model, deck generation, session storage
//! and the rule engine.
//!
//! This module provides:
//! - Cards, players, teams and the per-session [`GameState`]
//! - Two-stage shuffled board generation
//! - A copy-on-write session store
//! - The [`GameEngine`] applying every player action

pub mod deck;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod store;

pub use deck::{Deck, generate_deck, normalize_words};
pub use engine::{GameEngine, RevealOutcome};
pub use entities::{Card, CardType, GameState, Player, SessionId, Team};
pub use errors::{ErrorKind, GameError, GameResult};
pub use store::SessionStore;
