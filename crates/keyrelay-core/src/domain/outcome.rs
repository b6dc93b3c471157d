//! Delivery outcomes and their human-readable rendering.
//!
//! Every dispatched event ends in exactly one outcome: the peer confirmed
//! it, the peer rejected it, nobody answered before the deadline, or (when
//! the client is configured to give up on disconnect) the link went away.
//! A timeout is reported the same way as a peer-signalled failure; only the
//! reason label differs.
//!
//! Rendering is a pure function of the outcome and a [`Locale`].  It never
//! touches the ledger or the pressed-key set.

use std::fmt;

use super::input::{Direction, InputId};
use super::ledger::PendingEntry;
use super::locale::Locale;
use super::log::LogTag;
use crate::protocol::messages::{AckPayload, SequenceId};

// ── Peer vocabulary ───────────────────────────────────────────────────────────

/// Movement commands a controller may report in an ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Command {
    /// Parses the peer's spelling.  Unrecognised commands yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(Command::Forward),
            "backward" => Some(Command::Backward),
            "left" => Some(Command::Left),
            "right" => Some(Command::Right),
            "stop" => Some(Command::Stop),
            _ => None,
        }
    }
}

/// Whether the controller started or stopped a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    /// Parses the peer's spelling.  Unrecognised actions yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Action::Start),
            "stop" => Some(Action::Stop),
            _ => None,
        }
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// How a dispatched event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The peer acknowledged with `ok: true`.
    Received,
    /// The peer acknowledged with `ok: false`.
    Rejected { reason: Option<String> },
    /// No ack arrived before the deadline.
    TimedOut,
    /// The link dropped while the event was pending and the client was told
    /// not to wait for it.
    Abandoned,
}

/// The terminal result for one sequence id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub seq: SequenceId,
    pub direction: Direction,
    pub input: InputId,
    pub action: Option<Action>,
    pub command: Option<Command>,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    /// Builds the outcome for an entry the peer answered.
    ///
    /// Direction and input come from the ledger entry (what was actually
    /// sent); enrichment comes from the ack.
    pub fn from_ack(entry: &PendingEntry, ack: &AckPayload) -> Self {
        let status = if ack.ok {
            DeliveryStatus::Received
        } else {
            DeliveryStatus::Rejected {
                reason: ack.error.clone().filter(|reason| !reason.is_empty()),
            }
        };
        Self {
            seq: entry.seq,
            direction: entry.direction,
            input: entry.input.clone(),
            action: ack.action.as_deref().and_then(Action::parse),
            command: ack.command.as_deref().and_then(Command::parse),
            status,
        }
    }

    /// Builds the outcome for an entry whose deadline passed.
    pub fn timed_out(entry: &PendingEntry) -> Self {
        Self::without_ack(entry, DeliveryStatus::TimedOut)
    }

    /// Builds the outcome for an entry dropped on disconnect.
    pub fn abandoned(entry: &PendingEntry) -> Self {
        Self::without_ack(entry, DeliveryStatus::Abandoned)
    }

    fn without_ack(entry: &PendingEntry, status: DeliveryStatus) -> Self {
        Self {
            seq: entry.seq,
            direction: entry.direction,
            input: entry.input.clone(),
            action: None,
            command: None,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Received
    }

    /// Activity-log tag for this outcome.
    pub fn tag(&self) -> LogTag {
        match self.status {
            DeliveryStatus::Received => LogTag::Ok,
            DeliveryStatus::Rejected { .. } | DeliveryStatus::Abandoned => LogTag::Fail,
            DeliveryStatus::TimedOut => LogTag::Timeout,
        }
    }

    /// Renders e.g. `Received: press KeyW` or
    /// `Not received: Start forward (KeyW) (busy)`.
    pub fn render(&self, locale: Locale) -> String {
        let subject = describe_input(
            self.direction,
            &self.input,
            self.action,
            self.command,
            locale,
        );
        let reason = match &self.status {
            DeliveryStatus::Received => return format!("{}: {subject}", locale.received()),
            DeliveryStatus::Rejected { reason: Some(reason) } => reason.as_str(),
            DeliveryStatus::Rejected { reason: None } => locale.generic_error(),
            DeliveryStatus::TimedOut => locale.timeout(),
            DeliveryStatus::Abandoned => locale.disconnected(),
        };
        format!("{}: {subject} ({reason})", locale.not_received())
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Locale::default()))
    }
}

/// Describes one input transition for a human.
///
/// With both a recognised `action` and `command` the richer
/// `"<Action> <command> (<input>)"` form is used; otherwise the generic
/// `"<direction> <input>"` form.
pub fn describe_input(
    direction: Direction,
    input: &InputId,
    action: Option<Action>,
    command: Option<Command>,
    locale: Locale,
) -> String {
    match (action, command) {
        (Some(action), Some(command)) => format!(
            "{} {} ({input})",
            locale.action(action),
            locale.command(command)
        ),
        _ => format!("{} {input}", locale.direction(direction)),
    }
}
