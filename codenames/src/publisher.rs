//! Pushes committed session snapshots to real-time viewers.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    game::entities::{GameState, SessionId},
    hub::{BroadcastReport, HubHandle, Payload},
};

/// Receives every snapshot produced by a successful engine mutation.
///
/// Publishing is a side channel: it cannot fail the mutation that produced
/// the snapshot, so implementations log their own failures.
#[async_trait]
pub trait UpdatePublisher: Send + Sync {
    async fn publish(&self, snapshot: &GameState);
}

/// Serializes snapshots to JSON and fans them out through the hub.
///
/// Engine operations publish after releasing the store lock, so two
/// snapshots of one session can reach the publisher out of order. The
/// publisher remembers the newest version sent per session and drops
/// anything older, keeping viewers on the latest state.
#[derive(Clone)]
pub struct HubPublisher {
    hub: HubHandle,
    /// session ID -> last version handed to the hub
    published: Arc<Mutex<HashMap<SessionId, u64>>>,
}

impl HubPublisher {
    pub fn new(hub: HubHandle) -> Self {
        Self {
            hub,
            published: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Serializes and broadcasts `snapshot`, returning the delivery report.
    /// `None` means nothing was sent: the snapshot could not be serialized,
    /// or a newer version of the session was already broadcast.
    pub async fn send(&self, snapshot: &GameState) -> Option<BroadcastReport> {
        let payload: Payload = match serde_json::to_vec(snapshot) {
            Ok(bytes) => Arc::from(bytes),
            Err(e) => {
                log::error!("Failed to serialize game {}: {}", snapshot.id, e);
                return None;
            }
        };

        // Held across the fan-out so version check and enqueue are one step.
        // The broadcast never waits on a client, so this stays short.
        let mut published = self.published.lock().await;
        let last = published.entry(snapshot.id.clone()).or_default();
        if snapshot.version <= *last {
            log::debug!(
                "Skipping game {} version {}, version {} already sent",
                snapshot.id,
                snapshot.version,
                last
            );
            return None;
        }
        *last = snapshot.version;

        let report = self.hub.broadcast(&snapshot.id, payload).await;
        drop(published);

        if report.dropped > 0 {
            log::warn!(
                "Game {} update: {} delivered, {} slow clients dropped",
                snapshot.id,
                report.delivered,
                report.dropped
            );
        }
        Some(report)
    }
}

#[async_trait]
impl UpdatePublisher for HubPublisher {
    async fn publish(&self, snapshot: &GameState) {
        let _ = self.send(snapshot).await;
    }
}

/// Publisher for engine-only use (tests, tools).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl UpdatePublisher for NoopPublisher {
    async fn publish(&self, _snapshot: &GameState) {}
}
