//! Per-connection read and write pumps.
//!
//! The pumps only see transport-neutral frames, so any duplex transport can
//! drive them once it maps its own message type onto [`Outbound`] and
//! [`Inbound`].

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant},
};

use super::{
    actor::HubHandle,
    client::{Client, Payload},
    config::HubConfig,
};

/// Frames written to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Payload(Payload),
    Ping,
    Close,
}

/// Frames read from the peer. Application messages are not part of the
/// protocol and arrive as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Pong,
    Close,
    Other,
}

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Outbound queue closed by the hub
    QueueClosed,
    /// Connection closed from another path
    ConnectionClosed,
    /// Peer sent a close frame or the stream ended
    PeerClosed,
    /// No heartbeat acknowledgement within the pong window
    PongTimeout,
    WriteTimeout,
    WriteFailed,
    ReadFailed,
}

impl fmt::Display for PumpExit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::QueueClosed => "queue closed",
            Self::ConnectionClosed => "connection closed",
            Self::PeerClosed => "peer closed",
            Self::PongTimeout => "pong timeout",
            Self::WriteTimeout => "write timeout",
            Self::WriteFailed => "write failed",
            Self::ReadFailed => "read failed",
        };
        write!(f, "{repr}")
    }
}

async fn write_frame<S, E>(sink: &mut S, frame: Outbound, write_wait: Duration) -> Result<(), PumpExit>
where
    S: Sink<Outbound, Error = E> + Unpin,
    E: fmt::Display,
{
    match time::timeout(write_wait, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::debug!("Write to peer failed: {e}");
            Err(PumpExit::WriteFailed)
        }
        Err(_) => Err(PumpExit::WriteTimeout),
    }
}

/// Drains `queue` to `sink` and sends a heartbeat every `ping_period`.
///
/// Payloads that pile up while a write is in flight are coalesced: only the
/// newest one is written. When the queue closes a close frame is sent on a
/// best-effort basis.
pub async fn write_pump<S, E>(
    mut sink: S,
    mut queue: mpsc::Receiver<Payload>,
    config: HubConfig,
) -> PumpExit
where
    S: Sink<Outbound, Error = E> + Unpin,
    E: fmt::Display,
{
    let mut heartbeat = time::interval_at(Instant::now() + config.ping_period, config.ping_period);

    loop {
        tokio::select! {
            next = queue.recv() => {
                let Some(mut payload) = next else {
                    let _ = write_frame(&mut sink, Outbound::Close, config.write_wait).await;
                    return PumpExit::QueueClosed;
                };

                while let Ok(newer) = queue.try_recv() {
                    payload = newer;
                }

                if let Err(exit) =
                    write_frame(&mut sink, Outbound::Payload(payload), config.write_wait).await
                {
                    return exit;
                }
            }
            _ = heartbeat.tick() => {
                if let Err(exit) = write_frame(&mut sink, Outbound::Ping, config.write_wait).await {
                    return exit;
                }
            }
        }
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            return;
        }
    }
}

/// Consumes inbound frames until the peer goes away, the heartbeat window
/// lapses, or the connection is closed elsewhere. Every `Pong` extends the
/// window by `pong_wait`.
pub async fn read_pump<St, E>(
    mut stream: St,
    mut closed: watch::Receiver<bool>,
    pong_wait: Duration,
) -> PumpExit
where
    St: Stream<Item = Result<Inbound, E>> + Unpin,
    E: fmt::Display,
{
    let mut deadline = Instant::now() + pong_wait;

    loop {
        tokio::select! {
            _ = wait_closed(&mut closed) => return PumpExit::ConnectionClosed,
            _ = time::sleep_until(deadline) => return PumpExit::PongTimeout,
            frame = stream.next() => match frame {
                Some(Ok(Inbound::Pong)) => deadline = Instant::now() + pong_wait,
                Some(Ok(Inbound::Other)) => {}
                Some(Ok(Inbound::Close)) | None => return PumpExit::PeerClosed,
                Some(Err(e)) => {
                    log::debug!("Read from peer failed: {e}");
                    return PumpExit::ReadFailed;
                }
            },
        }
    }
}

/// Registers `client`, runs both pumps until either side ends, then
/// unregisters the client.
///
/// The write pump runs on its own task; the read pump runs on the caller's.
/// Closing the connection from any path stops both, and a failed or timed
/// out write closes it.
pub async fn serve_connection<Tx, TxErr, Rx, RxErr>(
    hub: HubHandle,
    client: Arc<Client>,
    queue: mpsc::Receiver<Payload>,
    sink: Tx,
    stream: Rx,
) where
    Tx: Sink<Outbound, Error = TxErr> + Send + Unpin + 'static,
    TxErr: fmt::Display + Send + 'static,
    Rx: Stream<Item = Result<Inbound, RxErr>> + Unpin,
    RxErr: fmt::Display,
{
    if let Err(e) = hub.register(client.clone()).await {
        log::warn!("Could not register client {}: {}", client.id(), e);
        client.connection().close();
        return;
    }

    let config = hub.config().clone();
    let pong_wait = config.pong_wait;
    let writer_client = client.clone();
    let writer = tokio::spawn(async move {
        let exit = write_pump(sink, queue, config).await;
        // A dead writer takes the read side down with it.
        writer_client.connection().close();
        exit
    });

    let read_exit = read_pump(stream, client.connection().closed_signal(), pong_wait).await;
    log::debug!(
        "Read pump for client {} (connection {}) stopped: {}",
        client.id(),
        client.connection_id(),
        read_exit
    );

    hub.unregister(&client).await;
    // Covers the case where the hub is already gone and never closes it.
    client.connection().close();

    match writer.await {
        Ok(exit) => log::debug!(
            "Write pump for client {} (connection {}) stopped: {}",
            client.id(),
            client.connection_id(),
            exit
        ),
        Err(e) => log::warn!("Write pump for client {} panicked: {}", client.id(), e),
    }
}
