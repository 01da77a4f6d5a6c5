//! WebSocket endpoint streaming session snapshots.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/game/{game_id}?client_id=<id>`
//! 2. Server checks the client ID and that the game exists, then upgrades
//! 3. The connection is registered with the broadcast hub
//! 4. Every committed change to the game is pushed as the raw JSON snapshot
//! 5. Server pings periodically; a client that stops answering is dropped
//!
//! Clients are not expected to send application messages; anything other
//! than pongs and close frames is ignored.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/ws/game/GAME?client_id=u1');
//! ws.onmessage = (event) => render(JSON.parse(event.data));
//! ```

use axum::{
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use codenames::hub::{Inbound, Outbound, serve_connection};
use futures_util::{SinkExt, StreamExt, future};
use serde::Deserialize;
use std::time::Instant;

use super::{AppState, errors::ApiError};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    client_id: String,
}

fn to_message(frame: Outbound) -> Message {
    match frame {
        Outbound::Payload(payload) => match std::str::from_utf8(&payload) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(Bytes::copy_from_slice(&payload)),
        },
        Outbound::Ping => Message::Ping(Bytes::new()),
        Outbound::Close => Message::Close(None),
    }
}

fn to_inbound(message: Message) -> Inbound {
    match message {
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
        _ => Inbound::Other,
    }
}

/// Upgrade to a WebSocket receiving updates for `game_id`.
///
/// # Response
///
/// - `101 Switching Protocols` on success
/// - `400 Bad Request` without a `client_id`
/// - `404 Not Found` for an unknown game
pub async fn websocket_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Path(game_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    if query.client_id.trim().is_empty() {
        return ApiError::bad_request("client_id is required").into_response();
    }

    if let Err(e) = state.engine.get_game(&game_id).await {
        return ApiError::from(e).into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    tracing::info!(game_id = %game_id, client_id = %query.client_id, "WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, game_id, query.client_id, state))
}

async fn handle_socket(socket: WebSocket, game_id: String, client_id: String, state: AppState) {
    let started = Instant::now();
    metrics::websocket_connection_opened();

    let (client, queue) = state.hub.new_client(&client_id, &game_id);
    let (sink, stream) = socket.split();
    let sink = sink.with(|frame: Outbound| future::ready(Ok::<_, axum::Error>(to_message(frame))));
    let stream = stream.map(|message| message.map(to_inbound));

    serve_connection(state.hub.clone(), client, queue, sink, stream).await;

    metrics::websocket_connection_closed();
    logging::log_connection_closed(
        &game_id,
        &client_id,
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
}
