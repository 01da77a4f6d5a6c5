//! HTTP/WebSocket API for the game server.
//!
//! # Modules
//!
//! - [`games`]: Session lifecycle and player actions
//! - [`words`]: Word pool administration
//! - [`websocket`]: Real-time snapshot stream per game
//! - [`errors`]: Error-to-status mapping shared by all handlers
//!
//! # Endpoints Overview
//!
//! ```text
//! POST   /api/game/start           - Start a game
//! GET    /api/game/state?id=       - Current snapshot
//! POST   /api/game/join            - Join or re-join a game
//! POST   /api/game/reveal          - Reveal a card
//! POST   /api/game/set-spymaster   - Become your team's spymaster
//! POST   /api/game/end-turn        - Pass the turn
//! POST   /api/game/change-team     - Switch team
//! GET    /api/words                - List active words
//! POST   /api/words                - Add words
//! DELETE /api/words                - Deactivate a word
//! GET    /ws/game/{game_id}        - WebSocket (client_id query parameter)
//! GET    /health, /api/health      - Health check
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; the browser client is served from a
//! different origin.

pub mod errors;
pub mod games;
pub mod request_id;
pub mod websocket;
pub mod words;

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use codenames::{
    GameEngine, GameState, HubPublisher, UpdatePublisher,
    db::Database,
    hub::{HubActor, HubConfig, HubHandle},
    words::{InMemoryWordRepository, WordRepository},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::metrics;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub hub: HubHandle,
    pub words: Arc<dyn WordRepository>,
    /// Present when the word pool lives in PostgreSQL
    pub database: Option<Database>,
}

impl AppState {
    /// Wires an engine whose updates are broadcast through `hub`.
    pub fn new(hub: HubHandle, words: Arc<dyn WordRepository>, database: Option<Database>) -> Self {
        let publisher = Arc::new(MeteredPublisher::new(HubPublisher::new(hub.clone())));
        let engine = Arc::new(GameEngine::new(words.clone(), publisher));
        Self {
            engine,
            hub,
            words,
            database,
        }
    }

    /// State backed by the default in-memory word pool and a freshly spawned
    /// hub. Must be called inside a Tokio runtime.
    pub fn in_memory(hub_config: HubConfig) -> Self {
        Self::new(
            HubActor::spawn(hub_config),
            Arc::new(InMemoryWordRepository::new()),
            None,
        )
    }
}

/// Hub publisher that also records broadcast metrics.
pub struct MeteredPublisher {
    inner: HubPublisher,
}

impl MeteredPublisher {
    pub fn new(inner: HubPublisher) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl UpdatePublisher for MeteredPublisher {
    async fn publish(&self, snapshot: &GameState) {
        if let Some(report) = self.inner.send(snapshot).await {
            metrics::broadcast(report);
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use cn_server::api::{create_router, AppState};
/// # use codenames::HubConfig;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = create_router(AppState::in_memory(HubConfig::default()));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let game_routes = Router::new()
        .route("/start", post(games::create_game))
        .route("/state", get(games::get_game_state))
        .route("/join", post(games::join_game))
        .route("/reveal", post(games::reveal_card))
        .route("/set-spymaster", post(games::set_spymaster))
        .route("/end-turn", post(games::end_turn))
        .route("/change-team", post(games::change_team));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .nest("/api/game", game_routes)
        .route(
            "/api/words",
            get(words::list_words)
                .post(words::add_words)
                .delete(words::deactivate_word),
        )
        .route("/ws/game/{game_id}", get(websocket::websocket_handler))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK`, or `503 Service Unavailable` when a configured word
/// database does not answer.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","games":3,"connections":5,"database":null,...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.database {
        Some(db) => Some(db.health_check().await.is_ok()),
        None => None,
    };
    let healthy = database.unwrap_or(true);

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "games": state.engine.game_count().await,
        "watched_games": state.hub.session_count().await,
        "connections": state.hub.total_clients().await,
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
