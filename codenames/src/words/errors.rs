//! Word repository error types.

use thiserror::Error;

/// Word repository errors
#[derive(Debug, Error)]
pub enum WordError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Word is empty after trimming
    #[error("Word cannot be empty")]
    EmptyWord,
}

impl WordError {
    /// Client-safe message; database details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            WordError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for word repository operations
pub type WordResult<T> = Result<T, WordError>;
