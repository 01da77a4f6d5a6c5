//! # Codenames
//!
//! Engine and real-time plumbing for a team word-guessing game: two teams
//! race to find their words on a shared 25-card board while avoiding the
//! assassin.
//!
//! ## Core Modules
//!
//! - [`game`]: Board generation, session store and rule engine
//! - [`hub`]: Session-scoped broadcast hub and per-connection pumps
//! - [`publisher`]: Bridge from committed game snapshots to the hub
//! - [`words`]: Word pool repositories (in-memory and PostgreSQL)
//! - [`db`]: PostgreSQL connection pool
//!
//! ## Example
//!
//! ```
//! use codenames::{GameEngine, NoopPublisher, Team, words::InMemoryWordRepository};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), codenames::GameError> {
//! let engine = GameEngine::new(
//!     Arc::new(InMemoryWordRepository::new()),
//!     Arc::new(NoopPublisher),
//! );
//!
//! let game = engine.create_game("u1", "Alice").await?;
//! let game = engine.join_game(&game.id, "u2", "Bob", Team::Red).await?;
//! assert_eq!(game.players.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod game;
pub mod hub;
pub mod publisher;
pub mod words;

pub use game::{
    Card, CardType, ErrorKind, GameEngine, GameError, GameResult, GameState, Player, SessionId,
    Team,
};
pub use hub::{HubActor, HubConfig, HubHandle};
pub use publisher::{HubPublisher, NoopPublisher, UpdatePublisher};
