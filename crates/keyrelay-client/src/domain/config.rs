//! Client configuration types.
//!
//! [`ClientConfig`] is the single source of truth for all runtime settings.
//! It starts from [`Default`], is overlaid by the optional TOML file, and
//! finally by CLI flags and environment variables (see `main.rs`).  Nothing
//! in here reads the environment or the file system.

use std::time::Duration;

use keyrelay_core::domain::input::ControlError;
use keyrelay_core::domain::ledger::DEFAULT_ACK_TIMEOUT;
use keyrelay_core::domain::log::DEFAULT_LOG_CAPACITY;
use keyrelay_core::{ControlPad, Locale};
use serde::{Deserialize, Serialize};

/// Default peer address.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5000/ws";

/// Default pause between reconnection attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(1000);

/// One on-screen control declaration.
///
/// `combo` (a comma-separated list) wins over `code` when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo: Option<String>,
}

/// All runtime configuration for the client.
///
/// | Field                       | Default                  |
/// |-----------------------------|--------------------------|
/// | server_url                  | `ws://127.0.0.1:5000/ws` |
/// | ack_timeout                 | 2000 ms                  |
/// | reconnect_interval          | 1000 ms                  |
/// | log_capacity                | 50                       |
/// | locale                      | `en`                     |
/// | fail_pending_on_disconnect  | `false`                  |
/// | controls                    | empty (stock pad)        |
/// | log_level                   | `info`                   |
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WebSocket URL of the peer.  Also sent as `href` in `client_hello`.
    pub server_url: String,
    /// How long a dispatched event waits for its ack.
    pub ack_timeout: Duration,
    /// Pause between reconnection attempts.
    pub reconnect_interval: Duration,
    /// Activity-log entries retained.
    pub log_capacity: usize,
    pub locale: Locale,
    /// Report pending entries as failed as soon as the link drops instead of
    /// letting them time out.
    pub fail_pending_on_disconnect: bool,
    /// Pad controls.  Empty means the stock driving layout.
    pub controls: Vec<ControlSpec>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            log_capacity: DEFAULT_LOG_CAPACITY,
            locale: Locale::default(),
            fail_pending_on_disconnect: false,
            controls: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Builds the control pad from the declared controls.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] when a control declares no codes or a name is
    /// used twice.
    pub fn control_pad(&self) -> Result<ControlPad, ControlError> {
        if self.controls.is_empty() {
            return Ok(ControlPad::with_defaults());
        }
        let mut pad = ControlPad::new();
        for spec in &self.controls {
            pad.define_from_attrs(&spec.name, spec.code.as_deref(), spec.combo.as_deref())?;
        }
        Ok(pad)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ack_timeout_is_two_seconds() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.ack_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_default_server_url() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.server_url, "ws://127.0.0.1:5000/ws");
        assert!(!cfg.fail_pending_on_disconnect);
    }

    #[test]
    fn test_no_controls_yields_stock_pad() {
        // Arrange
        let cfg = ClientConfig::default();

        // Act
        let pad = cfg.control_pad().unwrap();

        // Assert
        assert_eq!(pad.len(), 9);
        assert_eq!(pad.codes("forward-right").map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_declared_controls_replace_stock_pad() {
        let cfg = ClientConfig {
            controls: vec![
                ControlSpec {
                    name: "boost".to_string(),
                    code: Some("ShiftLeft".to_string()),
                    combo: None,
                },
                ControlSpec {
                    name: "spin".to_string(),
                    code: Some("KeyQ".to_string()),
                    combo: Some("KeyA, KeyD".to_string()),
                },
            ],
            ..ClientConfig::default()
        };

        let pad = cfg.control_pad().unwrap();

        assert_eq!(pad.len(), 2);
        let spin: Vec<&str> = pad.codes("spin").unwrap().iter().map(|id| id.as_str()).collect();
        assert_eq!(spin, vec!["KeyA", "KeyD"]);
    }

    #[test]
    fn test_control_without_codes_is_rejected() {
        let cfg = ClientConfig {
            controls: vec![ControlSpec {
                name: "ghost".to_string(),
                code: None,
                combo: Some(" , ".to_string()),
            }],
            ..ClientConfig::default()
        };

        assert_eq!(
            cfg.control_pad(),
            Err(ControlError::Empty("ghost".to_string()))
        );
    }
}
