//! The single task that owns the [`Session`].
//!
//! Everything that mutates delivery state funnels through here: link signals
//! from the transport, commands from the input source, and the earliest
//! pending deadline.  Because one task owns the session, resolving an ack and
//! expiring its deadline can never interleave.
//!
//! Time is read from `tokio::time::Instant` so tests can run the loop on a
//! paused clock.

use std::future::pending;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until};
use tracing::{debug, info, warn};

use keyrelay_core::{InputCommand, LinkSignal};

use crate::application::{EventSink, Session};

/// How often the shutdown flag is checked while otherwise idle.
pub const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Runs until a `Quit` command arrives, the input source closes, or
/// `running` is cleared.  Hands the session back for a final status report.
pub async fn run_event_loop<S: EventSink>(
    mut session: Session<S>,
    mut signals: mpsc::Receiver<LinkSignal>,
    mut inputs: mpsc::Receiver<InputCommand>,
    running: Arc<AtomicBool>,
) -> Session<S> {
    let mut shutdown_poll = interval(SHUTDOWN_POLL);

    while running.load(Ordering::Relaxed) {
        let deadline = session.next_deadline();

        tokio::select! {
            Some(signal) = signals.recv() => {
                session.on_link_signal(signal);
            }

            command = inputs.recv() => {
                let Some(command) = command else {
                    debug!("input source closed");
                    break;
                };
                if !apply_command(&mut session, command, now()) {
                    break;
                }
            }

            _ = wait_for(deadline) => {
                let expired = session.on_timeouts(now());
                debug!(count = expired.len(), "deadlines expired");
            }

            _ = shutdown_poll.tick() => {}
        }
    }

    info!(session = %session.id(), "event loop stopped");
    session
}

/// Applies one input command.  Returns `false` on `Quit`.
fn apply_command<S: EventSink>(
    session: &mut Session<S>,
    command: InputCommand,
    now: Instant,
) -> bool {
    match command {
        InputCommand::Key {
            direction,
            input,
            repeat,
        } => {
            session.on_input(direction, &input, repeat, now);
        }
        InputCommand::Control { direction, name } => {
            if let Err(e) = session.on_control_named(direction, &name, now) {
                warn!("{e}");
            }
        }
        InputCommand::ShowStatus => {
            info!("{}", session.status());
            for entry in session.activity().iter().take(5) {
                info!("  {entry}");
            }
        }
        InputCommand::Quit => return false,
    }
    true
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Sleeps until `deadline`, or forever when nothing is pending.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
