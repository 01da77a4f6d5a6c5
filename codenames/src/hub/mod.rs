//! Session-scoped broadcast hub.
//!
//! Clients attach to a session through [`HubHandle::register`] and receive
//! every snapshot passed to [`HubHandle::broadcast`] for that session. The
//! registry's shape is only ever changed by the [`HubActor`] control loop;
//! broadcasts read a copy of the client set and never wait on a client.
//!
//! ## Example
//!
//! ```
//! use codenames::hub::{HubActor, HubConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let hub = HubActor::spawn(HubConfig::default());
//! let (client, mut queue) = hub.new_client("viewer-1", "game-1");
//! hub.register(client).await.unwrap();
//!
//! hub.broadcast("game-1", Arc::from(&b"{}"[..])).await;
//! assert_eq!(&*queue.recv().await.unwrap(), b"{}");
//! # }
//! ```

pub mod actor;
pub mod client;
pub mod config;
pub mod errors;
pub mod messages;
pub mod pump;

pub use actor::{BroadcastReport, HubActor, HubHandle};
pub use client::{Client, Connection, ConnectionId, Payload};
pub use config::HubConfig;
pub use errors::HubError;
pub use messages::HubMessage;
pub use pump::{Inbound, Outbound, PumpExit, read_pump, serve_connection, write_pump};
