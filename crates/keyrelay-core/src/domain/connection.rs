//! Connection lifecycle signals and the UI-facing connection state.
//!
//! The transport owns connecting and reconnecting.  It reports what happened
//! as [`LinkSignal`]s, and the [`ConnectionTracker`] folds those signals into
//! a single [`ConnectionState`] for display.  The tracker owns no delivery
//! logic and never retries anything.
//!
//! ```text
//!   Connecting ──connected──► Connected ──disconnected──► Disconnected
//!        │                        ▲                             │
//!        │                        └────────connected────────────┘
//!        │
//!        └── connect_error / error / reconnect_error: recorded as an
//!            annotation; shown as Erroring while not connected
//! ```

use std::fmt;

use crate::protocol::messages::InboundMessage;

/// What the status surface shows about the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection established yet.
    Connecting,
    /// The transport reports an open connection.
    Connected,
    /// The connection dropped; the transport is reconnecting.
    Disconnected,
    /// Not connected, and the transport's last attempt reported a fault.
    Erroring,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Erroring => write!(f, "Erroring"),
        }
    }
}

/// Transport-level faults.  All are informational: recovery is the
/// transport's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// The first connection attempt failed.
    ConnectError,
    /// The open connection reported a stream or protocol error.
    Error,
    /// A reconnection attempt failed.
    ReconnectError,
}

impl TransportFault {
    /// Signal name used in log lines, e.g. `connect_error: refused`.
    pub fn signal_name(self) -> &'static str {
        match self {
            TransportFault::ConnectError => "connect_error",
            TransportFault::Error => "error",
            TransportFault::ReconnectError => "reconnect_error",
        }
    }
}

/// Everything the transport reports to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSignal {
    /// A connection opened.  `transport` names the mechanism, e.g. `"websocket"`.
    Connected { transport: String },
    /// The open connection closed.
    Disconnected { reason: String },
    /// A transport fault occurred.
    Fault { kind: TransportFault, message: String },
    /// The peer sent a message.
    Message(InboundMessage),
}

/// Folds [`LinkSignal`]s into a [`ConnectionState`].
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    /// Connecting, Connected, or Disconnected.  Never Erroring.
    link: ConnectionState,
    /// Most recent fault since the last successful connect.
    fault: Option<(TransportFault, String)>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            link: ConnectionState::Connecting,
            fault: None,
        }
    }

    /// The state to display.
    pub fn state(&self) -> ConnectionState {
        match (self.link, &self.fault) {
            (ConnectionState::Connected, _) => ConnectionState::Connected,
            (_, Some(_)) => ConnectionState::Erroring,
            (link, None) => link,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link == ConnectionState::Connected
    }

    /// The most recent fault, if any occurred since the last connect.
    pub fn last_fault(&self) -> Option<(TransportFault, &str)> {
        self.fault
            .as_ref()
            .map(|(kind, message)| (*kind, message.as_str()))
    }

    /// The transport opened a connection.  Clears any fault annotation.
    pub fn on_connected(&mut self) {
        self.link = ConnectionState::Connected;
        self.fault = None;
    }

    /// The transport lost the connection.
    pub fn on_disconnected(&mut self) {
        self.link = ConnectionState::Disconnected;
    }

    /// The transport reported a fault.  The connected/disconnected axis is
    /// left alone.
    pub fn on_fault(&mut self, kind: TransportFault, message: impl Into<String>) {
        self.fault = Some((kind, message.into()));
    }

    /// The peer pushed `server_status`, which it only does over a live link.
    pub fn on_server_status(&mut self) {
        self.link = ConnectionState::Connected;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
