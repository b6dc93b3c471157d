//! Infrastructure layer for keyrelay-client.
//!
//! Everything that performs I/O or owns a task lives here:
//!
//! - [`transport`]: WebSocket connect/reconnect loop and frame pump
//! - [`input_source`]: line-oriented command parser and reader task
//! - [`config_file`]: TOML config loading
//! - [`event_loop`]: the task that owns the session
//!
//! Delivery rules (gating, sequence ids, outcomes) are not implemented here;
//! they belong to the application layer and `keyrelay-core`.

pub mod config_file;
pub mod event_loop;
pub mod input_source;
pub mod transport;

pub use event_loop::run_event_loop;
pub use transport::{spawn_transport, TransportConfig, TransportHandle};
