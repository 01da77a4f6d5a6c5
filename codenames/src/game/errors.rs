//! Game error types.

use thiserror::Error;

use super::entities::Team;

/// Broad category of a [`GameError`], used by transports to pick a status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Missing or malformed input.
    Validation,
    /// Unknown session, player or card.
    NotFound,
    /// The request is well-formed but the rules forbid it right now.
    RuleViolation,
    /// Failure of a collaborator (word source).
    Internal,
}

/// Game errors
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid team: {0:?} (expected red, blue or spectator)")]
    InvalidTeam(String),

    #[error("Game not found: {0}")]
    SessionNotFound(String),

    #[error("Player not found in this game: {0}")]
    PlayerNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Game is already over")]
    GameOver,

    #[error("It's not your team's turn")]
    NotYourTurn,

    #[error("Spectators cannot act on the board")]
    SpectatorCannotAct,

    #[error("Spymasters cannot reveal cards")]
    SpymasterCannotReveal,

    #[error("Team {0} already has a spymaster")]
    SpymasterAlreadyAssigned(Team),

    #[error("Card is already revealed")]
    CardAlreadyRevealed,

    #[error("A spymaster must become a spectator before joining another team")]
    SpymasterMustSpectate,

    #[error("Not enough words to build a board: need {required}, have {available}")]
    InsufficientWords { required: usize, available: usize },

    #[error("Word source unavailable: {0}")]
    WordSource(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidRequest(_) | GameError::InvalidTeam(_) => ErrorKind::Validation,
            GameError::SessionNotFound(_)
            | GameError::PlayerNotFound(_)
            | GameError::CardNotFound(_) => ErrorKind::NotFound,
            GameError::GameOver
            | GameError::NotYourTurn
            | GameError::SpectatorCannotAct
            | GameError::SpymasterCannotReveal
            | GameError::SpymasterAlreadyAssigned(_)
            | GameError::CardAlreadyRevealed
            | GameError::SpymasterMustSpectate => ErrorKind::RuleViolation,
            GameError::InsufficientWords { .. } | GameError::WordSource(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
