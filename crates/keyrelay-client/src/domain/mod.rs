//! Domain layer for keyrelay-client.

pub mod config;

pub use config::{ClientConfig, ControlSpec};
