//! keyrelay: reliable key-event client, entry point.
//!
//! Reads press/release commands from stdin, relays each accepted transition
//! to the controller as a `key_event`, and reports whether the controller
//! acknowledged it, rejected it, or never answered.
//!
//! # Usage
//!
//! ```text
//! keyrelay [OPTIONS]
//!
//! Options:
//!   --config <PATH>                  TOML config file
//!   --server-url <URL>               controller WebSocket URL [default: ws://127.0.0.1:5000/ws]
//!   --ack-timeout-ms <MS>            wait this long for an ack [default: 2000]
//!   --reconnect-interval-ms <MS>     pause between reconnect attempts [default: 1000]
//!   --log-capacity <N>               activity-log entries kept [default: 50]
//!   --locale <en|pt-br>              label language [default: en]
//!   --fail-pending-on-disconnect     report in-flight events as failed on disconnect
//! ```
//!
//! # Precedence
//!
//! Built-in defaults < `--config` file < environment variables < flags.
//!
//! | Variable                     | Flag                            |
//! |------------------------------|---------------------------------|
//! | `KEYRELAY_CONFIG`            | `--config`                      |
//! | `KEYRELAY_SERVER_URL`        | `--server-url`                  |
//! | `KEYRELAY_ACK_TIMEOUT_MS`    | `--ack-timeout-ms`              |
//! | `KEYRELAY_RECONNECT_MS`      | `--reconnect-interval-ms`       |
//! | `KEYRELAY_LOG_CAPACITY`      | `--log-capacity`                |
//! | `KEYRELAY_LOCALE`            | `--locale`                      |
//! | `KEYRELAY_FAIL_PENDING`      | `--fail-pending-on-disconnect`  |
//!
//! `RUST_LOG` overrides the config file's `log_level`.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keyrelay_client::application::{Session, SessionSettings};
use keyrelay_client::domain::ClientConfig;
use keyrelay_client::infrastructure::config_file::load_config;
use keyrelay_client::infrastructure::input_source::spawn_input_reader;
use keyrelay_client::infrastructure::{run_event_loop, spawn_transport, TransportConfig};
use keyrelay_core::Locale;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Reliable key-event client.
///
/// Every option is optional so that an unset flag leaves the config file's
/// value in place.
#[derive(Debug, Parser)]
#[command(
    name = "keyrelay",
    about = "Relays key presses to a controller and reports each delivery",
    version
)]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "KEYRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Controller WebSocket URL (`ws://` or `wss://`).
    #[arg(long, env = "KEYRELAY_SERVER_URL")]
    server_url: Option<String>,

    /// How long to wait for an ack before reporting a timeout.
    #[arg(long, env = "KEYRELAY_ACK_TIMEOUT_MS")]
    ack_timeout_ms: Option<u64>,

    /// Pause between reconnection attempts.
    #[arg(long, env = "KEYRELAY_RECONNECT_MS")]
    reconnect_interval_ms: Option<u64>,

    /// Number of activity-log entries kept.
    #[arg(long, env = "KEYRELAY_LOG_CAPACITY")]
    log_capacity: Option<usize>,

    /// Label language: `en` or `pt-br`.
    #[arg(long, env = "KEYRELAY_LOCALE")]
    locale: Option<Locale>,

    /// Report in-flight events as failed as soon as the link drops.
    #[arg(long, env = "KEYRELAY_FAIL_PENDING")]
    fail_pending_on_disconnect: bool,
}

impl Cli {
    /// Layers the config file and the flags over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded, the server URL
    /// is not a WebSocket URL, or the ack timeout is zero.
    fn into_config(self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
                .into(),
            None => ClientConfig::default(),
        };

        if let Some(url) = self.server_url {
            config.server_url = url;
        }
        if let Some(ms) = self.ack_timeout_ms {
            config.ack_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.reconnect_interval_ms {
            config.reconnect_interval = Duration::from_millis(ms);
        }
        if let Some(capacity) = self.log_capacity {
            config.log_capacity = capacity;
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if self.fail_pending_on_disconnect {
            config.fail_pending_on_disconnect = true;
        }

        if !(config.server_url.starts_with("ws://") || config.server_url.starts_with("wss://")) {
            bail!(
                "invalid server URL '{}': expected ws:// or wss://",
                config.server_url
            );
        }
        if config.ack_timeout.is_zero() {
            bail!("ack timeout must be greater than zero");
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let settings = SessionSettings::from_config(&config).context("invalid pad control")?;

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Wiring ────────────────────────────────────────────────────────────────
    let (handle, signals, transport_task) = spawn_transport(TransportConfig {
        url: config.server_url.clone(),
        reconnect_interval: config.reconnect_interval,
    });

    let (input_tx, input_rx) = mpsc::channel(64);
    // Detached: a pending stdin read must not hold up shutdown.
    spawn_input_reader(std::io::BufReader::new(std::io::stdin()), input_tx)
        .context("failed to spawn input thread")?;

    let session = Session::new(handle, settings);
    info!(
        session = %session.id(),
        url = %config.server_url,
        ack_timeout_ms = config.ack_timeout.as_millis() as u64,
        controls = session.settings().pad.len(),
        "keyrelay starting"
    );

    let session = run_event_loop(session, signals, input_rx, running).await;

    info!("final status: {}", session.status());
    // Dropping the session drops the transport handle, which stops the task.
    drop(session);
    let _ = transport_task.await;

    info!("keyrelay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_yields_defaults() {
        // Arrange
        let cli = Cli::parse_from(["keyrelay"]);

        // Act
        let config = cli.into_config().unwrap();

        // Assert
        assert_eq!(config.server_url, "ws://127.0.0.1:5000/ws");
        assert_eq!(config.ack_timeout, Duration::from_millis(2000));
        assert!(!config.fail_pending_on_disconnect);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "keyrelay",
            "--server-url",
            "wss://robot.local/ws",
            "--ack-timeout-ms",
            "750",
            "--locale",
            "pt-br",
            "--fail-pending-on-disconnect",
        ]);

        let config = cli.into_config().unwrap();

        assert_eq!(config.server_url, "wss://robot.local/ws");
        assert_eq!(config.ack_timeout, Duration::from_millis(750));
        assert_eq!(config.locale, Locale::PtBr);
        assert!(config.fail_pending_on_disconnect);
    }

    #[test]
    fn test_cli_rejects_unknown_locale() {
        let result = Cli::try_parse_from(["keyrelay", "--locale", "fr"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_websocket_url_is_rejected() {
        let cli = Cli::parse_from(["keyrelay", "--server-url", "http://robot.local"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_zero_ack_timeout_is_rejected() {
        let cli = Cli::parse_from(["keyrelay", "--ack-timeout-ms", "0"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("keyrelay-cli-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "ack_timeout_ms = 900\nlog_capacity = 10\n").unwrap();
        let cli = Cli::parse_from([
            "keyrelay",
            "--config",
            path.to_str().unwrap(),
            "--ack-timeout-ms",
            "300",
        ]);

        // Act
        let config = cli.into_config();
        let _ = std::fs::remove_file(&path);
        let config = config.unwrap();

        // Assert: the flag wins, the file fills the rest
        assert_eq!(config.ack_timeout, Duration::from_millis(300));
        assert_eq!(config.log_capacity, 10);
    }
}
