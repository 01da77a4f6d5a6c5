//! Hub actor: the single control loop owning registry structure, and the
//! cloneable handle used by everything else.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc, oneshot};

use super::{
    client::{Client, ConnectionId, Payload},
    config::HubConfig,
    errors::HubError,
    messages::HubMessage,
};
use crate::game::entities::SessionId;

/// session ID -> connection ID -> client
type Registry = Arc<RwLock<HashMap<SessionId, HashMap<ConnectionId, Arc<Client>>>>>;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients whose queue accepted the payload
    pub delivered: usize,
    /// Clients dropped as slow or closed consumers
    pub dropped: usize,
}

/// Handle for talking to the hub
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubMessage>,
    registry: Registry,
    next_connection_id: Arc<AtomicU64>,
    config: HubConfig,
}

impl HubHandle {
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Creates a client for `session_id` with a queue sized from the hub
    /// configuration. The client is not registered yet.
    pub fn new_client(
        &self,
        client_id: &str,
        session_id: &str,
    ) -> (Arc<Client>, mpsc::Receiver<Payload>) {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        Client::new(
            client_id,
            connection_id,
            session_id,
            self.config.queue_capacity,
        )
    }

    /// Registers a client and waits until the control loop has made it
    /// visible to broadcasts.
    ///
    /// # Errors
    ///
    /// `HubStopped` if the control loop is gone.
    pub async fn register(&self, client: Arc<Client>) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::Register {
                client,
                response: tx,
            })
            .await
            .map_err(|_| HubError::HubStopped)?;
        rx.await.map_err(|_| HubError::HubStopped)
    }

    /// Asks the control loop to detach `client` and close its connection.
    /// Repeated calls for the same client are ignored.
    pub async fn unregister(&self, client: &Arc<Client>) {
        if !client.begin_unregister() {
            return;
        }

        if self
            .sender
            .send(HubMessage::Unregister {
                client: client.clone(),
            })
            .await
            .is_err()
        {
            // Control loop is gone; at least release the connection.
            client.connection().close();
        }
    }

    /// Queues an unregister without waiting for room in the control inbox.
    /// Ignored if a removal is already queued. If the inbox is full the
    /// client stays listed with a closed connection; its pumps or the next
    /// broadcast retry the removal.
    fn try_unregister(&self, client: &Arc<Client>) {
        if !client.begin_unregister() {
            return;
        }

        let message = HubMessage::Unregister {
            client: client.clone(),
        };
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                client.cancel_unregister();
                log::debug!(
                    "Control queue full, deferring removal of client {} (connection {})",
                    client.id(),
                    client.connection_id()
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Fans `payload` out to every client currently attached to
    /// `session_id`.
    ///
    /// The client set is copied under the read lock and delivery happens
    /// outside it. Delivery never waits on a client or on the control loop:
    /// a full queue gets the client disconnected instead.
    pub async fn broadcast(&self, session_id: &str, payload: Payload) -> BroadcastReport {
        let clients: Vec<Arc<Client>> = {
            let registry = self.registry.read().await;
            match registry.get(session_id) {
                Some(clients) => clients.values().cloned().collect(),
                None => return BroadcastReport::default(),
            }
        };

        log::debug!(
            "Broadcasting {} bytes to {} clients in game {}",
            payload.len(),
            clients.len(),
            session_id
        );

        let mut report = BroadcastReport::default();
        for client in clients {
            match client.connection().enqueue(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    log::warn!(
                        "Dropping client {} (connection {}) from game {}: {}",
                        client.id(),
                        client.connection_id(),
                        session_id,
                        e
                    );
                    client.connection().close();
                    self.try_unregister(&client);
                    report.dropped += 1;
                }
            }
        }

        report
    }

    /// Number of sessions with at least one attached client
    pub async fn session_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Number of clients attached to `session_id`
    pub async fn client_count(&self, session_id: &str) -> usize {
        self.registry
            .read()
            .await
            .get(session_id)
            .map_or(0, HashMap::len)
    }

    /// Number of clients across all sessions
    pub async fn total_clients(&self) -> usize {
        self.registry.read().await.values().map(HashMap::len).sum()
    }

    /// Stops the control loop after closing every connection.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(HubMessage::Shutdown).await;
    }
}

/// Control loop owning every structural change of the registry
pub struct HubActor {
    inbox: mpsc::Receiver<HubMessage>,
    registry: Registry,
}

impl HubActor {
    /// Create a new hub actor
    ///
    /// # Returns
    ///
    /// * `(HubActor, HubHandle)` - Actor to run and handle for sending messages
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (sender, inbox) = mpsc::channel(config.control_capacity);
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));

        let actor = Self {
            inbox,
            registry: registry.clone(),
        };
        let handle = HubHandle {
            sender,
            registry,
            next_connection_id: Arc::new(AtomicU64::new(1)),
            config,
        };

        (actor, handle)
    }

    /// Creates the actor, spawns its loop on the current runtime and
    /// returns the handle.
    pub fn spawn(config: HubConfig) -> HubHandle {
        let (actor, handle) = Self::new(config);
        tokio::spawn(actor.run());
        handle
    }

    /// Run the hub event loop
    pub async fn run(mut self) {
        log::info!("Broadcast hub starting");

        while let Some(message) = self.inbox.recv().await {
            match message {
                HubMessage::Register { client, response } => {
                    self.handle_register(client).await;
                    let _ = response.send(());
                }
                HubMessage::Unregister { client } => {
                    self.handle_unregister(&client).await;
                }
                HubMessage::Shutdown => {
                    self.close_all().await;
                    break;
                }
            }
        }

        log::info!("Broadcast hub stopped");
    }

    async fn handle_register(&mut self, client: Arc<Client>) {
        if client.connection().is_closed() {
            log::debug!(
                "Client {} closed before registration, skipping",
                client.id()
            );
            return;
        }

        let mut registry = self.registry.write().await;
        registry
            .entry(client.session_id().to_string())
            .or_default()
            .insert(client.connection_id(), client.clone());

        log::info!(
            "Client {} registered for game {}",
            client.id(),
            client.session_id()
        );
    }

    async fn handle_unregister(&mut self, client: &Arc<Client>) {
        let session_id = client.session_id();
        {
            let mut registry = self.registry.write().await;
            if let Some(clients) = registry.get_mut(session_id)
                && clients.remove(&client.connection_id()).is_some()
            {
                log::info!(
                    "Client {} unregistered from game {}",
                    client.id(),
                    session_id
                );

                if clients.is_empty() {
                    registry.remove(session_id);
                    log::info!("Game room {} removed (no clients left)", session_id);
                }
            }
        }

        client.connection().close();
    }

    async fn close_all(&mut self) {
        let mut registry = self.registry.write().await;
        let count: usize = registry.values().map(HashMap::len).sum();
        for client in registry.values().flat_map(HashMap::values) {
            client.connection().close();
        }
        registry.clear();
        log::info!("Closed {} client connections on shutdown", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(s: &str) -> Payload {
        Arc::from(s.as_bytes())
    }

    #[tokio::test]
    async fn test_register_makes_client_visible() {
        let hub = HubActor::spawn(HubConfig::default());
        let (client, _rx) = hub.new_client("c1", "g1");

        hub.register(client).await.unwrap();

        assert_eq!(hub.client_count("g1").await, 1);
        assert_eq!(hub.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_connection_ids_unique_per_client_id() {
        let hub = HubActor::spawn(HubConfig::default());
        let (a, _rx_a) = hub.new_client("same", "g1");
        let (b, _rx_b) = hub.new_client("same", "g1");
        assert_ne!(a.connection_id(), b.connection_id());

        hub.register(a).await.unwrap();
        hub.register(b).await.unwrap();
        assert_eq!(hub.client_count("g1").await, 2);
    }

    #[tokio::test]
    async fn test_unregister_last_client_removes_room() {
        let hub = HubActor::spawn(HubConfig::default());
        let (client, _rx) = hub.new_client("c1", "g1");
        hub.register(client.clone()).await.unwrap();

        hub.unregister(&client).await;
        // A registration round-trip guarantees the unregister was processed.
        let (probe, _probe_rx) = hub.new_client("probe", "other");
        hub.register(probe).await.unwrap();

        assert_eq!(hub.client_count("g1").await, 0);
        assert_eq!(hub.session_count().await, 1);
        assert!(client.connection().is_closed());
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_session() {
        let hub = HubActor::spawn(HubConfig::default());
        let (a, mut rx_a) = hub.new_client("a", "g1");
        let (b, mut rx_b) = hub.new_client("b", "g1");
        let (c, mut rx_c) = hub.new_client("c", "g2");
        for client in [a, b, c] {
            hub.register(client).await.unwrap();
        }

        let report = hub.broadcast("g1", payload("state")).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(&*rx_a.recv().await.unwrap(), b"state");
        assert_eq!(&*rx_b.recv().await.unwrap(), b"state");
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_session_is_noop() {
        let hub = HubActor::spawn(HubConfig::default());
        assert_eq!(
            hub.broadcast("nobody", payload("x")).await,
            BroadcastReport::default()
        );
    }

    #[tokio::test]
    async fn test_slow_consumer_is_disconnected() {
        let hub = HubActor::spawn(HubConfig {
            queue_capacity: 1,
            ..Default::default()
        });
        let (slow, _slow_rx) = hub.new_client("slow", "g1");
        let (fast, mut fast_rx) = hub.new_client("fast", "g1");
        hub.register(slow.clone()).await.unwrap();
        hub.register(fast).await.unwrap();

        hub.broadcast("g1", payload("1")).await;
        assert_eq!(&*fast_rx.recv().await.unwrap(), b"1");

        let report = hub.broadcast("g1", payload("2")).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert!(slow.connection().is_closed());
        assert_eq!(&*fast_rx.recv().await.unwrap(), b"2");

        let (probe, _probe_rx) = hub.new_client("probe", "g1");
        hub.register(probe).await.unwrap();
        // slow is gone, fast and probe remain
        assert_eq!(hub.client_count("g1").await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_does_not_wait_for_control_queue() {
        let (actor, hub) = HubActor::new(HubConfig {
            queue_capacity: 1,
            control_capacity: 1,
            ..Default::default()
        });
        let (slow, _slow_rx) = hub.new_client("slow", "g1");
        hub.registry
            .write()
            .await
            .entry("g1".to_string())
            .or_default()
            .insert(slow.connection_id(), slow.clone());

        // The loop is not running yet, so this fills the control inbox.
        let (filler, _filler_rx) = hub.new_client("filler", "g2");
        hub.sender
            .try_send(HubMessage::Unregister { client: filler })
            .unwrap();

        hub.broadcast("g1", payload("1")).await;
        let report = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            hub.broadcast("g1", payload("2")),
        )
        .await
        .expect("broadcast blocked on the control queue");
        assert_eq!(report.dropped, 1);
        assert!(slow.connection().is_closed());

        // Once the loop drains the inbox, the next broadcast finishes the job.
        tokio::spawn(actor.run());
        let (first, _first_rx) = hub.new_client("probe", "other");
        hub.register(first).await.unwrap();
        assert_eq!(hub.client_count("g1").await, 1);

        let report = hub.broadcast("g1", payload("3")).await;
        assert_eq!(report.dropped, 1);
        let (second, _second_rx) = hub.new_client("probe", "other");
        hub.register(second).await.unwrap();
        assert_eq!(hub.client_count("g1").await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_does_not_queue_a_second_unregister() {
        let (_actor, hub) = HubActor::new(HubConfig {
            control_capacity: 4,
            ..Default::default()
        });
        let (client, _rx) = hub.new_client("c1", "g1");
        hub.registry
            .write()
            .await
            .entry("g1".to_string())
            .or_default()
            .insert(client.connection_id(), client.clone());

        // The pumps have already asked for removal; the loop has not run.
        client.connection().close();
        hub.unregister(&client).await;
        assert_eq!(hub.sender.capacity(), 3);

        let report = hub.broadcast("g1", payload("x")).await;
        assert_eq!(report.dropped, 1);
        assert_eq!(hub.sender.capacity(), 3);
    }

    #[tokio::test]
    async fn test_closed_client_is_not_registered() {
        let hub = HubActor::spawn(HubConfig::default());
        let (client, _rx) = hub.new_client("c1", "g1");
        client.connection().close();

        hub.register(client).await.unwrap();
        assert_eq!(hub.client_count("g1").await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let hub = HubActor::spawn(HubConfig::default());
        let (client, _rx) = hub.new_client("c1", "g1");
        hub.register(client.clone()).await.unwrap();

        hub.shutdown().await;
        let (late, _late_rx) = hub.new_client("late", "g1");
        assert_eq!(hub.register(late).await, Err(HubError::HubStopped));
        assert!(client.connection().is_closed());
        assert_eq!(hub.total_clients().await, 0);
    }
}
