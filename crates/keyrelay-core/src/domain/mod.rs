//! Domain entities for keyrelay.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: no sockets, no timers, no terminal I/O.  Time enters only
//! as an explicit `Instant` argument, so every state machine here can be
//! driven step by step from a unit test.
//!
//! Code in outer layers (the client's application and infrastructure
//! modules) depends on the domain, but the domain never depends on them.

/// Connection lifecycle signals and the UI-facing connection state.
pub mod connection;

/// Input identifiers, directions, and on-screen control pads.
pub mod input;

/// Pending-delivery ledger: sequence-correlated sends awaiting an ack.
pub mod ledger;

/// Display labels in the supported languages.
pub mod locale;

/// Bounded, newest-first activity log.
pub mod log;

/// Delivery outcomes and their human-readable rendering.
pub mod outcome;

/// The set of inputs currently held down.
pub mod pressed;
