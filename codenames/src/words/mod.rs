//! Word pool feeding the board generator.
//!
//! The engine only ever reads the active words; adding and deactivating
//! words is exposed to administrators through the HTTP layer.
//!
//! ## Example
//!
//! ```
//! use codenames::words::{InMemoryWordRepository, WordRepository};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = InMemoryWordRepository::new();
//! repo.add_word("nebula").await?;
//! assert!(repo.list_words().await?.contains(&"NEBULA".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod repository;

pub use errors::{WordError, WordResult};
pub use repository::{DEFAULT_WORDS, InMemoryWordRepository, PgWordRepository, WordRepository};
