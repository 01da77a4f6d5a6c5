//! Hub-side view of one real-time connection.

use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};

use super::errors::HubError;
use crate::game::entities::SessionId;

/// Serialized session snapshot, shared between every recipient.
pub type Payload = Arc<[u8]>;

/// Unique serial of one connection; a client ID may reconnect several times.
pub type ConnectionId = u64;

/// Outbound queue plus close signal of a connection.
///
/// The queue sender lives behind a mutex; taking it out of the mutex is
/// what closes the connection, so it happens exactly once no matter how many
/// paths race to close.
pub struct Connection {
    queue: Mutex<Option<mpsc::Sender<Payload>>>,
    closed: watch::Sender<bool>,
}

impl Connection {
    /// Creates a connection with a bounded outbound queue and returns the
    /// receiving half for the write pump.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (closed, _) = watch::channel(false);
        let connection = Self {
            queue: Mutex::new(Some(tx)),
            closed,
        };
        (connection, rx)
    }

    /// Non-blocking enqueue.
    ///
    /// # Errors
    ///
    /// `QueueFull` when the consumer is lagging, `ConnectionClosed` after
    /// [`Connection::close`].
    pub fn enqueue(&self, payload: Payload) -> Result<(), HubError> {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = queue.as_ref() else {
            return Err(HubError::ConnectionClosed);
        };

        sender.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => HubError::QueueFull,
            TrySendError::Closed(_) => HubError::ConnectionClosed,
        })
    }

    /// Closes the outbound queue and signals both pumps to stop.
    ///
    /// Returns `true` only for the call that actually closed the connection.
    pub fn close(&self) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.take().is_none() {
            return false;
        }
        self.closed.send_replace(true);
        true
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Receiver that flips to `true` once the connection is closed.
    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

/// A connected viewer of one session.
pub struct Client {
    id: String,
    connection_id: ConnectionId,
    session_id: SessionId,
    connection: Connection,
    unregistering: AtomicBool,
}

impl Client {
    pub fn new(
        id: &str,
        connection_id: ConnectionId,
        session_id: &str,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Payload>) {
        let (connection, queue) = Connection::new(capacity);
        let client = Self {
            id: id.to_string(),
            connection_id,
            session_id: session_id.to_string(),
            connection,
            unregistering: AtomicBool::new(false),
        };
        (Arc::new(client), queue)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Marks the client as leaving. Only the first caller gets `true` and
    /// is responsible for notifying the control loop.
    pub(crate) fn begin_unregister(&self) -> bool {
        !self.unregistering.swap(true, Ordering::AcqRel)
    }

    /// Gives up a claim from [`Client::begin_unregister`] whose notification
    /// could not be queued, so a later attempt can retry.
    pub(crate) fn cancel_unregister(&self) {
        self.unregistering.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("connection_id", &self.connection_id)
            .field("session_id", &self.session_id)
            .field("closed", &self.connection.is_closed())
            .finish()
    }
}
