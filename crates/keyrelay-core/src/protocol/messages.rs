//! All keyrelay wire message types.
//!
//! The peer speaks a small named-event protocol.  Every WebSocket text frame
//! is a JSON object with an `"event"` field naming the message and a `"data"`
//! field carrying its payload:
//!
//! ```json
//! {"event":"key_event","data":{"type":"down","code":"KeyW","repeat":false,"seq":1}}
//! ```
//!
//! The payload shapes are shared with existing controller implementations and
//! must be preserved field-for-field.  Serde's adjacently tagged enum
//! representation (`tag = "event", content = "data"`) produces exactly this
//! layout.
//!
//! # Message flow
//!
//! ```text
//! Client → Peer:  client_hello, key_event      (OutboundMessage)
//! Peer → Client:  server_status, server_hello,  (InboundMessage)
//!                 ack
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Sequence id ───────────────────────────────────────────────────────────────

/// Client-assigned integer correlating a sent `key_event` with its `ack`.
///
/// Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(pub u64);

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// Whether an input went down (pressed) or up (released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    /// The wire spelling: `"down"` or `"up"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }

    /// Parses the wire spelling.  Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "down" => Some(Direction::Down),
            "up" => Some(Direction::Up),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Outbound payloads ─────────────────────────────────────────────────────────

/// Diagnostic handshake sent once per successful connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHello {
    /// Client wall-clock time in milliseconds since the Unix epoch.
    pub ts: i64,
    /// Address the client connected to.
    pub href: String,
    /// Client identification string.
    pub ua: String,
}

/// A single press or release of one input identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEventPayload {
    #[serde(rename = "type")]
    pub direction: Direction,
    pub code: String,
    pub repeat: bool,
    pub seq: SequenceId,
}

// ── Inbound payloads ──────────────────────────────────────────────────────────

/// Confirmation or rejection of one previously sent `key_event`.
///
/// Every field is optional on the wire.  A missing `ok` counts as a
/// rejection.  Peers commonly send `null` for enrichment fields they have
/// nothing to say about, and a peer that failed to read the event may not
/// even echo `seq` back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckPayload {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<SequenceId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Semantic action chosen by the peer, e.g. `"start"` or `"stop"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Semantic command chosen by the peer, e.g. `"forward"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Peer-supplied failure reason; only meaningful when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Informational status pushed by the peer right after it accepts a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The peer's reply to `client_hello`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHello {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

// ── Envelopes ─────────────────────────────────────────────────────────────────

/// Messages the client sends to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    ClientHello(ClientHello),
    KeyEvent(KeyEventPayload),
}

impl OutboundMessage {
    /// The `"event"` name this message travels under.
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::ClientHello(_) => "client_hello",
            OutboundMessage::KeyEvent(_) => "key_event",
        }
    }

    /// Serializes the message into a WebSocket text frame body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages the peer sends to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundMessage {
    ServerStatus(ServerStatus),
    ServerHello(ServerHello),
    Ack(AckPayload),
}

impl InboundMessage {
    /// Parses a WebSocket text frame body.
    ///
    /// Unknown event names and malformed payloads are returned as errors; the
    /// caller decides whether to skip the frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The `"event"` name this message travelled under.
    pub fn event_name(&self) -> &'static str {
        match self {
            InboundMessage::ServerStatus(_) => "server_status",
            InboundMessage::ServerHello(_) => "server_hello",
            InboundMessage::Ack(_) => "ack",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
