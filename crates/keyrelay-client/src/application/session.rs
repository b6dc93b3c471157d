//! The delivery session: one owned value per client run.
//!
//! A [`Session`] bundles every piece of mutable state the reliable-delivery
//! layer needs (the pressed-key set, the pending-delivery ledger, the
//! connection tracker and the status surface) and exposes the entry points
//! the event loop calls:
//!
//! | Event                     | Method                          |
//! |---------------------------|---------------------------------|
//! | key down / up             | [`Session::on_input`]           |
//! | pad control press/release | [`Session::on_control_named`]   |
//! | transport signal          | [`Session::on_link_signal`]     |
//! | `ack` from the peer       | [`Session::on_ack`]             |
//! | earliest deadline reached | [`Session::on_timeouts`]        |
//!
//! The session lives across reconnects, so sequence ids keep increasing for
//! the whole run and a late ack from a previous connection can never match a
//! newer send.  It is driven from a single task and needs no locking:
//! resolving an ack and expiring a deadline both take `&mut self`, so only one
//! of them can ever act on a given entry.

use std::fmt;
use std::time::{Duration, Instant};

use keyrelay_core::domain::input::ControlError;
use keyrelay_core::domain::log::{ActivityLog, LogTag};
use keyrelay_core::protocol::messages::{ServerHello, ServerStatus};
use keyrelay_core::{
    AckPayload, ClientHello, ConnectionState, ConnectionTracker, ControlPad, DeliveryOutcome,
    Direction, InboundMessage, InputId, LinkSignal, Locale, OutboundMessage, PendingLedger,
    PressedKeySet, Resolution, SequenceId, TransportFault,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sink::EventSink;
use crate::domain::ClientConfig;

// ── Settings ──────────────────────────────────────────────────────────────────

/// Identification sent in `client_hello`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Address the client connects to.
    pub href: String,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            user_agent: default_user_agent(),
        }
    }
}

/// `keyrelay/<version> (<os>)`.
pub fn default_user_agent() -> String {
    format!(
        "keyrelay/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Everything a [`Session`] needs to know up front.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ack_timeout: Duration,
    pub locale: Locale,
    pub fail_pending_on_disconnect: bool,
    pub log_capacity: usize,
    pub client: ClientInfo,
    pub pad: ControlPad,
}

impl SessionSettings {
    /// Derives session settings from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if a declared pad control is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ControlError> {
        Ok(Self {
            ack_timeout: config.ack_timeout,
            locale: config.locale,
            fail_pending_on_disconnect: config.fail_pending_on_disconnect,
            log_capacity: config.log_capacity,
            client: ClientInfo::new(config.server_url.clone()),
            pad: config.control_pad()?,
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        // The stock pad always builds.
        let config = ClientConfig::default();
        Self {
            ack_timeout: config.ack_timeout,
            locale: config.locale,
            fail_pending_on_disconnect: config.fail_pending_on_disconnect,
            log_capacity: config.log_capacity,
            client: ClientInfo::new(config.server_url),
            pad: ControlPad::with_defaults(),
        }
    }
}

/// Errors surfaced to the input source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown control '{0}'")]
    UnknownControl(String),
}

// ── Status ────────────────────────────────────────────────────────────────────

/// Point-in-time view of the status surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: ConnectionState,
    /// Localised connection label.
    pub connection: String,
    /// Most recent delivery outcome (or "disconnected").
    pub delivery: Option<String>,
    /// Comma-joined pressed inputs, or the "nothing pressed" placeholder.
    pub pressed: String,
    pub pending: usize,
    pub last_sequence: Option<SequenceId>,
    pub last_fault: Option<String>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "link={} pressed=[{}] pending={} last={}",
            self.connection,
            self.pressed,
            self.pending,
            self.delivery.as_deref().unwrap_or("-")
        )?;
        if let Some(fault) = &self.last_fault {
            write!(f, " fault={fault}")?;
        }
        Ok(())
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Owned state of the reliable-delivery layer for one client run.
pub struct Session<S> {
    id: Uuid,
    sink: S,
    settings: SessionSettings,
    pressed: PressedKeySet,
    pressed_view: String,
    ledger: PendingLedger,
    connection: ConnectionTracker,
    delivery: Option<String>,
    log: ActivityLog,
}

impl<S: EventSink> Session<S> {
    pub fn new(sink: S, settings: SessionSettings) -> Self {
        let log = ActivityLog::with_capacity(settings.log_capacity);
        let pressed_view = settings.locale.nothing_pressed().to_string();
        Self {
            id: Uuid::new_v4(),
            sink,
            settings,
            pressed: PressedKeySet::new(),
            pressed_view,
            ledger: PendingLedger::new(),
            connection: ConnectionTracker::new(),
            delivery: None,
            log,
        }
    }

    // ── Event dispatcher ─────────────────────────────────────────────────────

    /// Handles one keyboard transition.
    ///
    /// Returns the sequence id of the emitted `key_event`, or `None` when the
    /// transition was suppressed (a repeated down or an unmatched up).
    pub fn on_input(
        &mut self,
        direction: Direction,
        input: &InputId,
        repeat: bool,
        now: Instant,
    ) -> Option<SequenceId> {
        let seq = self.gate_and_dispatch(direction, input, repeat, now)?;
        self.refresh_pressed_view();
        Some(seq)
    }

    /// Handles a press or release of a control driving several inputs.
    ///
    /// Each input is gated and dispatched on its own; the pressed view is
    /// refreshed once if any of them was accepted.
    pub fn on_control(
        &mut self,
        direction: Direction,
        inputs: &[InputId],
        now: Instant,
    ) -> Vec<SequenceId> {
        let sent: Vec<SequenceId> = inputs
            .iter()
            .filter_map(|input| self.gate_and_dispatch(direction, input, false, now))
            .collect();
        if !sent.is_empty() {
            self.refresh_pressed_view();
        }
        sent
    }

    /// Handles a press or release of the pad control called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownControl`] if the pad has no such control.
    pub fn on_control_named(
        &mut self,
        direction: Direction,
        name: &str,
        now: Instant,
    ) -> Result<Vec<SequenceId>, SessionError> {
        let inputs = self
            .settings
            .pad
            .codes(name)
            .ok_or_else(|| SessionError::UnknownControl(name.to_string()))?
            .to_vec();
        Ok(self.on_control(direction, &inputs, now))
    }

    fn gate_and_dispatch(
        &mut self,
        direction: Direction,
        input: &InputId,
        repeat: bool,
        now: Instant,
    ) -> Option<SequenceId> {
        let accepted = match direction {
            Direction::Down => self.pressed.activate(input),
            Direction::Up => self.pressed.deactivate(input),
        };
        if !accepted {
            debug!(session = %self.id, %direction, %input, repeat, "transition suppressed");
            return None;
        }

        let timeout = self.settings.ack_timeout;
        let session = self.id;
        let sink = &mut self.sink;
        let seq = self
            .ledger
            .dispatch(direction, input.clone(), repeat, timeout, now, |payload| {
                if let Err(e) = sink.emit(OutboundMessage::KeyEvent(payload.clone())) {
                    warn!(%session, seq = %payload.seq, "key_event not handed to transport: {e}");
                }
            });
        debug!(session = %self.id, %seq, %direction, %input, "key_event dispatched");
        Some(seq)
    }

    fn refresh_pressed_view(&mut self) {
        self.pressed_view = if self.pressed.is_empty() {
            self.settings.locale.nothing_pressed().to_string()
        } else {
            self.pressed.to_string()
        };
    }

    // ── Acknowledgment resolver ──────────────────────────────────────────────

    /// Resolves an `ack` against the ledger.
    ///
    /// A stale, duplicate or unknown ack returns `None` and changes nothing.
    pub fn on_ack(&mut self, ack: AckPayload) -> Option<DeliveryOutcome> {
        match self.ledger.resolve(ack) {
            Resolution::Resolved { entry, ack } => {
                let outcome = DeliveryOutcome::from_ack(&entry, &ack);
                self.report(&outcome);
                Some(outcome)
            }
            Resolution::NotFound { ack } => {
                debug!(session = %self.id, seq = ?ack.seq, ok = ack.ok, "stale ack ignored");
                None
            }
        }
    }

    /// Reports every entry whose deadline is at or before `now` as timed out.
    pub fn on_timeouts(&mut self, now: Instant) -> Vec<DeliveryOutcome> {
        let outcomes: Vec<DeliveryOutcome> = self
            .ledger
            .expire(now)
            .iter()
            .map(DeliveryOutcome::timed_out)
            .collect();
        for outcome in &outcomes {
            self.report(outcome);
        }
        outcomes
    }

    /// The earliest pending deadline; the event loop sleeps until then.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.ledger.next_deadline()
    }

    fn report(&mut self, outcome: &DeliveryOutcome) {
        let text = outcome.render(self.settings.locale);
        if outcome.is_success() {
            info!(session = %self.id, seq = %outcome.seq, "{text}");
        } else {
            warn!(session = %self.id, seq = %outcome.seq, "{text}");
        }
        self.log.push(outcome.tag(), text.clone());
        self.delivery = Some(text);
    }

    // ── Connection lifecycle ─────────────────────────────────────────────────

    /// Folds one transport signal into the session.
    ///
    /// Returns the delivery outcomes the signal produced: the resolved ack
    /// for an inbound `ack`, or the abandoned entries when the link drops and
    /// `fail_pending_on_disconnect` is set.
    pub fn on_link_signal(&mut self, signal: LinkSignal) -> Vec<DeliveryOutcome> {
        match signal {
            LinkSignal::Connected { transport } => {
                self.on_connected(&transport);
                Vec::new()
            }
            LinkSignal::Disconnected { reason } => self.on_disconnected(&reason),
            LinkSignal::Fault { kind, message } => {
                self.on_fault(kind, message);
                Vec::new()
            }
            LinkSignal::Message(message) => self.on_message(message).into_iter().collect(),
        }
    }

    fn on_connected(&mut self, transport: &str) {
        self.connection.on_connected();
        info!(session = %self.id, transport, "connected");
        self.log
            .push(LogTag::Socket, format!("connected transport={transport}"));
        self.send_hello();
    }

    /// Best effort: a failed hello is logged and otherwise ignored.
    fn send_hello(&mut self) {
        let hello = ClientHello {
            ts: chrono::Utc::now().timestamp_millis(),
            href: self.settings.client.href.clone(),
            ua: self.settings.client.user_agent.clone(),
        };
        if let Err(e) = self.sink.emit(OutboundMessage::ClientHello(hello)) {
            warn!(session = %self.id, "client_hello not sent: {e}");
        }
    }

    fn on_disconnected(&mut self, reason: &str) -> Vec<DeliveryOutcome> {
        self.connection.on_disconnected();
        self.pressed.reset();
        self.refresh_pressed_view();
        warn!(session = %self.id, reason, "disconnected");
        self.log.push(LogTag::Socket, format!("disconnected: {reason}"));

        let abandoned: Vec<DeliveryOutcome> = if self.settings.fail_pending_on_disconnect {
            self.ledger
                .drain()
                .iter()
                .map(DeliveryOutcome::abandoned)
                .collect()
        } else {
            Vec::new()
        };
        for outcome in &abandoned {
            self.report(outcome);
        }

        self.delivery = Some(self.settings.locale.disconnected().to_string());
        abandoned
    }

    fn on_fault(&mut self, kind: TransportFault, message: String) {
        let line = format!("{}: {message}", kind.signal_name());
        warn!(session = %self.id, "{line}");
        self.log.push(LogTag::Socket, line);
        self.connection.on_fault(kind, message);
    }

    fn on_message(&mut self, message: InboundMessage) -> Option<DeliveryOutcome> {
        match message {
            InboundMessage::ServerStatus(ServerStatus { message }) => {
                self.connection.on_server_status();
                let text = message.unwrap_or_else(|| "ok".to_string());
                info!(session = %self.id, "server_status: {text}");
                self.log.push(LogTag::Server, text);
                None
            }
            InboundMessage::ServerHello(ServerHello { sid, msg }) => {
                let sid = sid.unwrap_or_else(|| "-".to_string());
                debug!(session = %self.id, %sid, msg = ?msg, "server_hello");
                self.log.push(LogTag::Server, format!("hello sid={sid} ok"));
                None
            }
            InboundMessage::Ack(ack) => self.on_ack(ack),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        let state = self.connection.state();
        StatusSnapshot {
            state,
            connection: self.settings.locale.connection_state(state).to_string(),
            delivery: self.delivery.clone(),
            pressed: self.pressed_view.clone(),
            pending: self.ledger.len(),
            last_sequence: self.ledger.last_sequence(),
            last_fault: self
                .connection
                .last_fault()
                .map(|(kind, message)| format!("{}: {message}", kind.signal_name())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn pressed(&self) -> &PressedKeySet {
        &self.pressed
    }

    pub fn ledger(&self) -> &PendingLedger {
        &self.ledger
    }

    pub fn connection(&self) -> &ConnectionTracker {
        &self.connection
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.log
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
