//! # keyrelay-core
//!
//! Shared library for keyrelay containing the named-event wire protocol and
//! the reliable event-delivery state machines.
//!
//! This crate has zero dependencies on sockets, async runtimes, or terminals.
//! Everything here is plain owned state that the client drives from a single
//! event-loop task.
//!
//! # Architecture overview
//!
//! keyrelay turns discrete key presses and on-screen control presses into
//! `key_event` messages for a remote controller (for example a robot).  The
//! controller replies to each event with an `ack`.  The interesting part is
//! making that exchange dependable over a connection that can drop at any
//! moment:
//!
//! - **`protocol`** – The JSON payloads exchanged with the peer and the
//!   `{"event": ..., "data": ...}` envelope that names them, plus the
//!   sequence-id allocator.
//!
//! - **`domain`** – Pure business logic: the pressed-key set that suppresses
//!   OS key-repeat, the pending-delivery ledger that correlates acks with
//!   sends by sequence id, delivery outcomes and their human-readable
//!   rendering, the connection state tracker, and the bounded activity log.
//!
//! ```text
//! input ──► PressedKeySet gate ──► PendingLedger::dispatch ──► key_event
//!                                         ▲                        │
//!                                         │                      peer
//!                                         │                        │
//! outcome ◄── render ◄── PendingLedger::resolve / expire ◄──── ack
//! ```

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `keyrelay_core::PendingLedger` instead of the full module path.
pub use domain::connection::{ConnectionState, ConnectionTracker, LinkSignal, TransportFault};
pub use domain::input::{ControlPad, Direction, InputCommand, InputId};
pub use domain::ledger::{PendingEntry, PendingLedger, Resolution};
pub use domain::locale::Locale;
pub use domain::outcome::{DeliveryOutcome, DeliveryStatus};
pub use domain::pressed::PressedKeySet;
pub use protocol::messages::{
    AckPayload, ClientHello, InboundMessage, KeyEventPayload, OutboundMessage, SequenceId,
};
