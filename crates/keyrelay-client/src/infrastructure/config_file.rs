//! TOML configuration file.
//!
//! Every field is optional; anything left out keeps its built-in default.
//!
//! ```toml
//! server_url = "ws://robot.local:5000/ws"
//! ack_timeout_ms = 1500
//! reconnect_interval_ms = 1000
//! log_capacity = 50
//! locale = "pt-br"
//! fail_pending_on_disconnect = false
//! log_level = "info"
//!
//! [[controls]]
//! name = "forward"
//! code = "KeyW"
//!
//! [[controls]]
//! name = "forward-right"
//! combo = "KeyW, KeyD"
//! ```
//!
//! Declaring any `[[controls]]` replaces the stock pad entirely.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use keyrelay_core::domain::log::DEFAULT_LOG_CAPACITY;
use keyrelay_core::Locale;

use crate::domain::config::{
    ClientConfig, ControlSpec, DEFAULT_RECONNECT_INTERVAL, DEFAULT_SERVER_URL,
};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// On-disk shape of the client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub fail_pending_on_disconnect: bool,
    /// `tracing` level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub controls: Vec<ControlSpec>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
fn default_ack_timeout_ms() -> u64 {
    keyrelay_core::domain::ledger::DEFAULT_ACK_TIMEOUT.as_millis() as u64
}
fn default_reconnect_interval_ms() -> u64 {
    DEFAULT_RECONNECT_INTERVAL.as_millis() as u64
}
fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            ack_timeout_ms: default_ack_timeout_ms(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            log_capacity: default_log_capacity(),
            locale: Locale::default(),
            fail_pending_on_disconnect: false,
            log_level: default_log_level(),
            controls: Vec::new(),
        }
    }
}

impl From<FileConfig> for ClientConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            server_url: file.server_url,
            ack_timeout: Duration::from_millis(file.ack_timeout_ms),
            reconnect_interval: Duration::from_millis(file.reconnect_interval_ms),
            log_capacity: file.log_capacity,
            locale: file.locale,
            fail_pending_on_disconnect: file.fail_pending_on_disconnect,
            controls: file.controls,
            log_level: file.log_level,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(text: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Loads the config file at `path`.
///
/// The path was given explicitly, so a missing file is an error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
