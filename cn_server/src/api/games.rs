//! Game session API handlers.
//!
//! Every successful call answers with the full session snapshot, the same
//! JSON document WebSocket viewers receive.
//!
//! # Examples
//!
//! Start a game:
//! ```bash
//! curl -X POST http://localhost:8080/api/game/start \
//!   -H "Content-Type: application/json" \
//!   -d '{"creator_id": "u1", "username": "Alice"}'
//! ```
//!
//! End the turn (query parameters or JSON body):
//! ```bash
//! curl -X POST "http://localhost:8080/api/game/end-turn?game_id=GAME&player_id=u2"
//! ```

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::JsonRejection},
};
use codenames::{GameState, Team};
use serde::Deserialize;
use std::sync::Arc;

use super::{AppState, errors::ApiError, request_id::RequestId};
use crate::metrics;

type SnapshotResult = Result<Json<Arc<GameState>>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct GameStateQuery {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub username: String,
    /// `red`, `blue` or `spectator`; empty joins as spectator
    #[serde(default)]
    pub team: String,
}

#[derive(Debug, Deserialize)]
pub struct RevealCardRequest {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub card_id: String,
    #[serde(default)]
    pub player_id: String,
}

/// Parameters of the player actions that accept either query parameters or
/// a JSON body. Query values take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct PlayerActionParams {
    pub game_id: Option<String>,
    pub player_id: Option<String>,
    pub team: Option<String>,
}

impl PlayerActionParams {
    fn from_request(query: Self, body: &Bytes) -> Result<Self, ApiError> {
        let body: Self = if body.iter().all(u8::is_ascii_whitespace) {
            Self::default()
        } else {
            serde_json::from_slice(body)
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?
        };

        Ok(Self {
            game_id: query.game_id.or(body.game_id),
            player_id: query.player_id.or(body.player_id),
            team: query.team.or(body.team),
        })
    }
}

/// Start a new game; the creator joins as a spectator.
///
/// `POST /api/game/start` with `{"creator_id", "username"}`
pub async fn create_game(
    State(state): State<AppState>,
    request_id: RequestId,
    request: Result<Json<CreateGameRequest>, JsonRejection>,
) -> SnapshotResult {
    let Json(request) = request?;
    let game = state
        .engine
        .create_game(&request.creator_id, &request.username)
        .await?;

    tracing::info!(
        request_id = %request_id.as_str(),
        game_id = %game.id,
        creator_id = %request.creator_id,
        "Game created"
    );
    metrics::games_created_total();
    metrics::active_games(state.engine.game_count().await);

    Ok(Json(game))
}

/// `GET /api/game/state?id=<game_id>`
pub async fn get_game_state(
    State(state): State<AppState>,
    Query(query): Query<GameStateQuery>,
) -> SnapshotResult {
    Ok(Json(state.engine.get_game(&query.id).await?))
}

/// `POST /api/game/join` with `{"game_id", "player_id", "username", "team"}`
pub async fn join_game(
    State(state): State<AppState>,
    request: Result<Json<JoinGameRequest>, JsonRejection>,
) -> SnapshotResult {
    let Json(request) = request?;
    let team: Team = request.team.parse()?;
    let game = state
        .engine
        .join_game(&request.game_id, &request.player_id, &request.username, team)
        .await?;
    Ok(Json(game))
}

/// `POST /api/game/reveal` with `{"game_id", "card_id", "player_id"}`
pub async fn reveal_card(
    State(state): State<AppState>,
    request: Result<Json<RevealCardRequest>, JsonRejection>,
) -> SnapshotResult {
    let Json(request) = request?;
    let game = state
        .engine
        .reveal_card(&request.game_id, &request.card_id, &request.player_id)
        .await?;
    metrics::cards_revealed_total();
    Ok(Json(game))
}

/// `POST /api/game/set-spymaster` with `game_id` and `player_id`
pub async fn set_spymaster(
    State(state): State<AppState>,
    Query(query): Query<PlayerActionParams>,
    body: Bytes,
) -> SnapshotResult {
    let params = PlayerActionParams::from_request(query, &body)?;
    let game = state
        .engine
        .set_spymaster(
            params.game_id.as_deref().unwrap_or_default(),
            params.player_id.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(game))
}

/// `POST /api/game/end-turn` with `game_id` and `player_id`
pub async fn end_turn(
    State(state): State<AppState>,
    Query(query): Query<PlayerActionParams>,
    body: Bytes,
) -> SnapshotResult {
    let params = PlayerActionParams::from_request(query, &body)?;
    let game = state
        .engine
        .end_turn(
            params.game_id.as_deref().unwrap_or_default(),
            params.player_id.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(game))
}

/// `POST /api/game/change-team` with `game_id`, `player_id` and `team`
pub async fn change_team(
    State(state): State<AppState>,
    Query(query): Query<PlayerActionParams>,
    body: Bytes,
) -> SnapshotResult {
    let params = PlayerActionParams::from_request(query, &body)?;
    let team = params
        .team
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("team is required"))?
        .parse::<Team>()?;

    let game = state
        .engine
        .change_team(
            params.game_id.as_deref().unwrap_or_default(),
            params.player_id.as_deref().unwrap_or_default(),
            team,
        )
        .await?;
    Ok(Json(game))
}
