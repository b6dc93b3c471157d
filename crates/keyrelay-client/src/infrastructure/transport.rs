//! WebSocket transport: connect, reconnect, and frame pumping.
//!
//! The transport runs in its own Tokio task and owns the socket.  It talks to
//! the rest of the client through two channels:
//!
//! ```text
//!  Session ──TransportHandle (mpsc<OutboundMessage>)──► transport task ──► peer
//!  Session ◄────────── mpsc<LinkSignal> ─────────────── transport task ◄── peer
//! ```
//!
//! # Lifecycle signals
//!
//! | Situation                              | Signal                          |
//! |----------------------------------------|---------------------------------|
//! | handshake completed                    | `Connected { "websocket" }`     |
//! | peer closed / stream ended / I/O error | `Disconnected { reason }`       |
//! | very first connection attempt failed   | `Fault(ConnectError)`           |
//! | any later attempt failed               | `Fault(ReconnectError)`         |
//! | read or write error on an open socket  | `Fault(Error)`                  |
//!
//! Reconnection is entirely this task's job: after a failed attempt or a lost
//! connection it waits `reconnect_interval` and tries again, forever, until
//! the session drops its [`TransportHandle`].
//!
//! # Emission while disconnected
//!
//! Messages emitted while no socket is open, including while a connection
//! attempt is still pending, are discarded.  The session's ledger still holds
//! the corresponding entries, which time out as usual.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use keyrelay_core::{InboundMessage, LinkSignal, OutboundMessage, TransportFault};

use crate::application::{EmitError, EventSink};

/// Transport name reported in `Connected` signals.
pub const TRANSPORT_NAME: &str = "websocket";

/// Capacity of the outbound and signal queues.
pub const QUEUE_CAPACITY: usize = 128;

/// Upper bound on a single connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where and how often to connect.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub reconnect_interval: Duration,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// The session's end of the outbound queue.
///
/// Dropping every handle stops the transport task.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    tx: mpsc::Sender<OutboundMessage>,
}

impl TransportHandle {
    pub fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { tx }
    }
}

impl EventSink for TransportHandle {
    fn emit(&mut self, message: OutboundMessage) -> Result<(), EmitError> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => EmitError::Full,
            TrySendError::Closed(_) => EmitError::Closed,
        })
    }
}

/// Spawns the transport task.
///
/// Returns the handle the session emits through, the receiver of lifecycle
/// signals, and the task's join handle.
pub fn spawn_transport(
    config: TransportConfig,
) -> (TransportHandle, mpsc::Receiver<LinkSignal>, JoinHandle<()>) {
    let (out_tx, out_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (sig_tx, sig_rx) = mpsc::channel(QUEUE_CAPACITY);
    let task = tokio::spawn(run_transport(config, out_rx, sig_tx));
    (TransportHandle::new(out_tx), sig_rx, task)
}

// ── Connect / reconnect loop ──────────────────────────────────────────────────

/// How an open connection ended.
enum LinkEnd {
    /// The connection dropped; reconnect.
    Lost(String),
    /// The session went away; stop for good.
    Shutdown,
}

/// Connects, pumps frames until the link drops, waits, and repeats.
///
/// Returns when the outbound channel closes or nobody listens for signals.
pub async fn run_transport(
    config: TransportConfig,
    mut outbound: mpsc::Receiver<OutboundMessage>,
    signals: mpsc::Sender<LinkSignal>,
) {
    let mut attempted = false;

    loop {
        let Some(attempt) = connect_discarding(&config.url, &mut outbound).await else {
            debug!("outbound channel closed while connecting; transport stopping");
            return;
        };
        let kind = if attempted {
            TransportFault::ReconnectError
        } else {
            TransportFault::ConnectError
        };
        attempted = true;

        let fault = match attempt {
            Ok(ws) => {
                info!(url = %config.url, "WebSocket connected");
                let connected = LinkSignal::Connected {
                    transport: TRANSPORT_NAME.to_string(),
                };
                if signals.send(connected).await.is_err() {
                    return;
                }

                match pump(ws, &mut outbound, &signals).await {
                    LinkEnd::Shutdown => {
                        debug!("outbound channel closed; transport stopping");
                        return;
                    }
                    LinkEnd::Lost(reason) => {
                        info!(%reason, "WebSocket disconnected");
                        if signals
                            .send(LinkSignal::Disconnected { reason })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                }
                None
            }
            Err(message) => Some(message),
        };

        if let Some(message) = fault {
            debug!(url = %config.url, "{}: {message}", kind.signal_name());
            if signals
                .send(LinkSignal::Fault { kind, message })
                .await
                .is_err()
            {
                return;
            }
        }

        if !wait_discarding(config.reconnect_interval, &mut outbound).await {
            debug!("outbound channel closed while disconnected; transport stopping");
            return;
        }
    }
}

/// Makes one connection attempt, dropping anything emitted meanwhile.
///
/// Returns `None` if the outbound channel closed, otherwise the socket or a
/// description of why the attempt failed.
async fn connect_discarding(
    url: &str,
    outbound: &mut mpsc::Receiver<OutboundMessage>,
) -> Option<Result<WsStream, String>> {
    let attempt = timeout(CONNECT_TIMEOUT, connect_async(url));
    tokio::pin!(attempt);

    loop {
        tokio::select! {
            result = &mut attempt => {
                return Some(match result {
                    Ok(Ok((ws, _response))) => Ok(ws),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {}s", CONNECT_TIMEOUT.as_secs())),
                });
            }
            message = outbound.recv() => {
                if !discard(message) {
                    return None;
                }
            }
        }
    }
}

/// Sleeps for `interval`, dropping anything emitted meanwhile.
///
/// Returns `false` if the outbound channel closed.
async fn wait_discarding(
    interval: Duration,
    outbound: &mut mpsc::Receiver<OutboundMessage>,
) -> bool {
    let wake = sleep(interval);
    tokio::pin!(wake);

    loop {
        tokio::select! {
            _ = &mut wake => return true,
            message = outbound.recv() => {
                if !discard(message) {
                    return false;
                }
            }
        }
    }
}

/// Drops a message emitted with no socket open.  `false` once the channel
/// has closed.
fn discard(message: Option<OutboundMessage>) -> bool {
    match message {
        Some(message) => {
            debug!(event = message.event_name(), "not connected; message dropped");
            true
        }
        None => false,
    }
}

// ── Frame pump ────────────────────────────────────────────────────────────────

/// Moves frames in both directions until the connection ends.
async fn pump(
    ws: WsStream,
    outbound: &mut mpsc::Receiver<OutboundMessage>,
    signals: &mpsc::Sender<LinkSignal>,
) -> LinkEnd {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            frame = read.next() => {
                let frame = match frame {
                    Some(Ok(frame)) => frame,
                    Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                        return LinkEnd::Lost("connection closed".to_string());
                    }
                    Some(Err(e)) => {
                        let message = e.to_string();
                        let _ = signals
                            .send(LinkSignal::Fault { kind: TransportFault::Error, message: message.clone() })
                            .await;
                        return LinkEnd::Lost(message);
                    }
                    None => return LinkEnd::Lost("stream ended".to_string()),
                };

                match frame {
                    WsMessage::Text(text) => match InboundMessage::from_json(&text) {
                        Ok(message) => {
                            debug!(event = message.event_name(), "frame received");
                            if signals.send(LinkSignal::Message(message)).await.is_err() {
                                return LinkEnd::Shutdown;
                            }
                        }
                        Err(e) => warn!("ignoring unrecognised frame: {e}"),
                    },
                    WsMessage::Close(close) => {
                        let reason = close
                            .map(|frame| frame.reason.to_string())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "closed by peer".to_string());
                        return LinkEnd::Lost(reason);
                    }
                    WsMessage::Binary(data) => {
                        warn!("unexpected binary frame ({} bytes) ignored", data.len());
                    }
                    WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
                }
            }

            message = outbound.recv() => {
                let Some(message) = message else {
                    let _ = write.send(WsMessage::Close(None)).await;
                    return LinkEnd::Shutdown;
                };
                let json = match message.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!(event = message.event_name(), "serialization failed: {e}");
                        continue;
                    }
                };
                if let Err(e) = write.send(WsMessage::Text(json)).await {
                    let message = e.to_string();
                    let _ = signals
                        .send(LinkSignal::Fault { kind: TransportFault::Error, message: message.clone() })
                        .await;
                    return LinkEnd::Lost(message);
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use keyrelay_core::{ClientHello, Direction, KeyEventPayload, SequenceId};

    fn key_event(seq: u64) -> OutboundMessage {
        OutboundMessage::KeyEvent(KeyEventPayload {
            direction: Direction::Down,
            code: "KeyW".to_string(),
            repeat: false,
            seq: SequenceId(seq),
        })
    }

    #[test]
    fn test_handle_reports_full_queue() {
        // Arrange
        let (tx, _rx) = mpsc::channel(1);
        let mut handle = TransportHandle::new(tx);

        // Act
        let first = handle.emit(key_event(1));
        let second = handle.emit(key_event(2));

        // Assert
        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(EmitError::Full));
    }

    #[test]
    fn test_handle_reports_closed_transport() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let mut handle = TransportHandle::new(tx);

        let result = handle.emit(OutboundMessage::ClientHello(ClientHello {
            ts: 0,
            href: String::new(),
            ua: String::new(),
        }));

        assert_eq!(result, Err(EmitError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_discarding_drops_queued_messages() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(key_event(1)).await.unwrap();

        let still_open = wait_discarding(Duration::from_millis(100), &mut rx).await;

        assert!(still_open);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_discarding_stops_when_session_is_gone() {
        let (tx, mut rx) = mpsc::channel::<OutboundMessage>(4);
        drop(tx);

        assert!(!wait_discarding(Duration::from_secs(60), &mut rx).await);
    }

    #[tokio::test]
    async fn test_unreachable_peer_reports_connect_error_then_reconnect_error() {
        // Arrange: bind then drop a listener so the port refuses connections
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (handle, mut signals, task) = spawn_transport(TransportConfig {
            url: format!("ws://{addr}/ws"),
            reconnect_interval: Duration::from_millis(10),
        });

        // Act
        let first = signals.recv().await;
        let second = signals.recv().await;

        // Assert
        assert!(matches!(
            first,
            Some(LinkSignal::Fault { kind: TransportFault::ConnectError, .. })
        ));
        assert!(matches!(
            second,
            Some(LinkSignal::Fault { kind: TransportFault::ReconnectError, .. })
        ));

        drop(handle);
        let _ = task.await;
    }

    #[tokio::test]
    async fn test_messages_emitted_during_pending_connect_are_dropped() {
        // Arrange: a peer that accepts TCP but never answers the handshake
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let silent_peer = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            sleep(Duration::from_secs(30)).await;
            drop(stream);
        });
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(key_event(1)).await.unwrap();

        // Act
        let attempt =
            tokio::time::timeout(Duration::from_millis(200), connect_discarding(&url, &mut rx)).await;

        // Assert: still connecting, yet the queued event is gone
        assert!(attempt.is_err());
        assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty)));

        silent_peer.abort();
    }

    #[tokio::test]
    async fn test_pending_connect_stops_when_session_is_gone() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let (tx, mut rx) = mpsc::channel::<OutboundMessage>(4);
        drop(tx);

        let attempt = connect_discarding(&url, &mut rx).await;

        assert!(attempt.is_none());
        drop(listener);
    }
}
