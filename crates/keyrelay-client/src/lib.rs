//! keyrelay-client library crate.
//!
//! Drives the reliable key-event exchange with a remote controller over a
//! WebSocket, reporting a delivery outcome for every press and release.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! stdin commands          WebSocket peer (JSON named events)
//!       │                          ↕
//! [keyrelay-client]
//!   ├── domain/           ClientConfig and pad control declarations
//!   ├── application/      Session: pressed set + ledger + status, EventSink seam
//!   └── infrastructure/
//!         ├── transport/   connect / reconnect loop (tokio-tungstenite)
//!         ├── input_source/ stdin line parser and reader task
//!         ├── config_file/ TOML config loading
//!         └── event_loop/  single task that owns the Session
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `keyrelay-core` only.  It never
//!   touches a socket; it emits through the [`application::EventSink`] trait.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tokio-tungstenite`.

/// Domain layer: client configuration types (no I/O).
pub mod domain;

/// Application layer: the delivery session.
pub mod application;

/// Infrastructure layer: transport, input, config file, event loop.
pub mod infrastructure;
