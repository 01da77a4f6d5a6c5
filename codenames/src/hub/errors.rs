//! Hub error types.

use thiserror::Error;

/// Delivery and control errors. None of these ever reach the request that
/// triggered a broadcast; they only decide the fate of a single client.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// The client's outbound queue is full (slow consumer)
    #[error("Message buffer full")]
    QueueFull,

    /// The client's connection was already closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// The hub control loop is no longer running
    #[error("Hub is not running")]
    HubStopped,
}
