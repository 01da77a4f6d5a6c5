//! Hub control loop message types.

use std::sync::Arc;
use tokio::sync::oneshot;

use super::client::Client;

/// Messages handled by the hub's control loop. Only this loop changes the
/// shape of the registry.
#[derive(Debug)]
pub enum HubMessage {
    /// Attach a client to its session; acknowledged once visible to
    /// broadcasts
    Register {
        client: Arc<Client>,
        response: oneshot::Sender<()>,
    },

    /// Detach a client and close its connection
    Unregister { client: Arc<Client> },

    /// Close every connection and stop the loop
    Shutdown,
}
