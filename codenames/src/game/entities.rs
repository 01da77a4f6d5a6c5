use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::GameError;

/// Session identifiers are opaque strings handed out by the engine.
pub type SessionId = String;

/// Number of cards on every board.
pub const BOARD_SIZE: usize = 25;

/// Cards owned by the team that moves first.
pub const FIRST_TEAM_CARDS: usize = 9;

/// Cards owned by the team that moves second.
pub const SECOND_TEAM_CARDS: usize = 8;

pub const NEUTRAL_CARDS: usize = 7;

pub const ASSASSIN_CARDS: usize = 1;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
    Spectator,
}

impl Team {
    /// The opposing playing team. Spectators have no opponent.
    pub fn opponent(self) -> Option<Team> {
        match self {
            Self::Red => Some(Self::Blue),
            Self::Blue => Some(Self::Red),
            Self::Spectator => None,
        }
    }

    pub fn is_playing(self) -> bool {
        !matches!(self, Self::Spectator)
    }

    /// Color of the cards this team has to find.
    pub fn card_type(self) -> Option<CardType> {
        match self {
            Self::Red => Some(CardType::Red),
            Self::Blue => Some(CardType::Blue),
            Self::Spectator => None,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Spectator => "spectator",
        };
        write!(f, "{repr}")
    }
}

/// Parses a team name as sent by clients. An empty value means the player
/// did not pick a side yet and lands with the spectators.
impl FromStr for Team {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "blue" => Ok(Self::Blue),
            "" | "spectator" => Ok(Self::Spectator),
            other => Err(GameError::InvalidTeam(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Red,
    Blue,
    Neutral,
    Assassin,
}

impl CardType {
    /// Team that scores when this card is revealed, if any.
    pub fn owner(self) -> Option<Team> {
        match self {
            Self::Red => Some(Team::Red),
            Self::Blue => Some(Team::Blue),
            Self::Neutral | Self::Assassin => None,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Neutral => "neutral",
            Self::Assassin => "assassin",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: String,
    pub word: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub revealed: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub team: Team,
    pub is_spymaster: bool,
}

impl Player {
    pub fn new(id: &str, username: &str, team: Team) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            team,
            is_spymaster: false,
        }
    }
}

/// Full state of one session. Handed out as an immutable snapshot; the
/// store swaps in a fresh copy on every successful mutation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameState {
    pub id: SessionId,
    pub cards: Vec<Card>,
    pub players: Vec<Player>,
    pub current_turn: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_team: Option<Team>,
    pub red_cards_left: usize,
    pub blue_cards_left: usize,
    /// Bumped on every committed mutation; a higher version is always the
    /// newer state of the same session.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameState {
    pub fn is_over(&self) -> bool {
        self.winning_team.is_some()
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn spymaster_of(&self, team: Team) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.team == team && p.is_spymaster)
    }

    /// Unrevealed cards of a given color.
    pub fn cards_left(&self, card_type: CardType) -> usize {
        self.cards
            .iter()
            .filter(|c| c.card_type == card_type && !c.revealed)
            .count()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
