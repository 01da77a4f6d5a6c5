//! WebSocket integration tests for real-time game updates.
//!
//! Runs the router on an ephemeral port and connects real WebSocket clients.

use cn_server::api::{AppState, create_router};
use codenames::{GameState, HubConfig, Team};
use futures_util::StreamExt;
use std::{net::SocketAddr, time::Duration};
use tokio::{
    net::{TcpListener, TcpStream},
    time::{sleep, timeout},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(config: HubConfig) -> (SocketAddr, AppState) {
    let state = AppState::in_memory(config);
    let app = create_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, game_id: &str, client_id: &str) -> Ws {
    let url = format!("ws://{addr}/ws/game/{game_id}?client_id={client_id}");
    let (ws, _) = connect_async(url).await.expect("WebSocket handshake failed");
    ws
}

async fn wait_for_clients(state: &AppState, game_id: &str, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while state.hub.client_count(game_id).await != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("clients did not reach the expected count");
}

/// Next snapshot pushed to `ws`, skipping heartbeats.
async fn next_snapshot(ws: &mut Ws) -> GameState {
    timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<GameState>(text.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .expect("no snapshot received")
}

#[tokio::test]
async fn test_viewers_receive_updates() {
    let (addr, state) = spawn_server(HubConfig::default()).await;
    let game = state.engine.create_game("u1", "Alice").await.unwrap();

    let mut alice = connect(addr, &game.id, "u1").await;
    let mut bob = connect(addr, &game.id, "u2").await;
    wait_for_clients(&state, &game.id, 2).await;

    state
        .engine
        .join_game(&game.id, "u2", "Bob", Team::Red)
        .await
        .unwrap();

    for ws in [&mut alice, &mut bob] {
        let snapshot = next_snapshot(ws).await;
        assert_eq!(snapshot.id, game.id);
        assert_eq!(snapshot.players.len(), 2);
    }
}

#[tokio::test]
async fn test_updates_are_scoped_to_their_game() {
    let (addr, state) = spawn_server(HubConfig::default()).await;
    let first = state.engine.create_game("u1", "Alice").await.unwrap();
    let second = state.engine.create_game("u9", "Zed").await.unwrap();

    let mut watcher = connect(addr, &first.id, "w1").await;
    let mut other = connect(addr, &second.id, "w2").await;
    wait_for_clients(&state, &first.id, 1).await;
    wait_for_clients(&state, &second.id, 1).await;

    state
        .engine
        .join_game(&first.id, "u2", "Bob", Team::Blue)
        .await
        .unwrap();

    assert_eq!(next_snapshot(&mut watcher).await.id, first.id);
    let stray = timeout(Duration::from_millis(300), other.next()).await;
    assert!(stray.is_err(), "viewer of another game got {stray:?}");
}

#[tokio::test]
async fn test_disconnect_unregisters_client() {
    let (addr, state) = spawn_server(HubConfig::default()).await;
    let game = state.engine.create_game("u1", "Alice").await.unwrap();

    let mut ws = connect(addr, &game.id, "u1").await;
    wait_for_clients(&state, &game.id, 1).await;
    assert_eq!(state.hub.session_count().await, 1);

    ws.close(None).await.unwrap();
    wait_for_clients(&state, &game.id, 0).await;
    assert_eq!(state.hub.session_count().await, 0);
}

#[tokio::test]
async fn test_same_client_id_can_connect_twice() {
    let (addr, state) = spawn_server(HubConfig::default()).await;
    let game = state.engine.create_game("u1", "Alice").await.unwrap();

    let mut tab1 = connect(addr, &game.id, "u1").await;
    let mut tab2 = connect(addr, &game.id, "u1").await;
    wait_for_clients(&state, &game.id, 2).await;

    state
        .engine
        .change_team(&game.id, "u1", Team::Blue)
        .await
        .unwrap();

    assert_eq!(next_snapshot(&mut tab1).await.id, game.id);
    assert_eq!(next_snapshot(&mut tab2).await.id, game.id);
}

#[tokio::test]
async fn test_server_sends_heartbeats() {
    let config = HubConfig {
        pong_wait: Duration::from_secs(2),
        ping_period: HubConfig::ping_period_for(Duration::from_secs(2)),
        ..HubConfig::default()
    };
    let (addr, state) = spawn_server(config).await;
    let game = state.engine.create_game("u1", "Alice").await.unwrap();

    let mut ws = connect(addr, &game.id, "u1").await;
    let frame = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("no heartbeat within the ping period");
    assert!(matches!(frame, Some(Ok(Message::Ping(_)))));
}

#[tokio::test]
async fn test_upgrade_rejected_for_unknown_game() {
    let (addr, _state) = spawn_server(HubConfig::default()).await;
    let url = format!("ws://{addr}/ws/game/missing?client_id=c1");
    assert!(connect_async(url).await.is_err());
}
