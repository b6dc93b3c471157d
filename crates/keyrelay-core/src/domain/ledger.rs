//! Pending-delivery ledger: every sent `key_event` awaiting its `ack`.
//!
//! # Lifecycle of one entry
//!
//! ```text
//!             dispatch()
//!                 │
//!                 ▼
//!            Dispatched ──── resolve(ack) ────► Acknowledged   (terminal)
//!                 │
//!                 └────────── expire(now) ────► TimedOut       (terminal)
//! ```
//!
//! Both transitions *remove* the entry, and removal is the only way an id
//! leaves the ledger.  Whichever transition runs first wins; the other finds
//! nothing and does nothing.  A late ack for an entry that already timed out
//! therefore resolves to [`Resolution::NotFound`] and can be ignored.
//!
//! # Timers
//!
//! Instead of arming one timer per entry, each entry stores its deadline and
//! the owner of the ledger sleeps until [`PendingLedger::next_deadline`].
//! When it wakes it calls [`PendingLedger::expire`].  "Cancelling" a timer is
//! just removing the entry, which is a no-op if it is already gone.
//!
//! The ledger takes `now` as an argument everywhere, so tests drive time
//! explicitly and no runtime is needed.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::trace;

use super::input::{Direction, InputId};
use crate::protocol::messages::{AckPayload, KeyEventPayload, SequenceId};
use crate::protocol::sequence::SequenceAllocator;

/// Default time to wait for an ack before reporting a timeout.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(2000);

/// Record of one in-flight `key_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub seq: SequenceId,
    pub direction: Direction,
    pub input: InputId,
    pub repeat: bool,
    /// The entry times out once `now >= deadline`.
    pub deadline: Instant,
}

/// Result of matching an ack against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The ack matched a pending entry, which has been removed.
    Resolved { entry: PendingEntry, ack: AckPayload },
    /// No pending entry carries the ack's sequence id.  The ack is stale
    /// (its entry already timed out), a duplicate, or unknown.
    NotFound { ack: AckPayload },
}

/// Map from sequence id to in-flight entry, plus the id allocator.
#[derive(Debug, Default)]
pub struct PendingLedger {
    sequence: SequenceAllocator,
    entries: BTreeMap<SequenceId, PendingEntry>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new event and hands it to `send`.
    ///
    /// Allocates the next sequence id, stores the entry with a deadline of
    /// `now + timeout`, then calls `send` exactly once with the wire payload.
    /// Returns the id immediately; nothing here waits for the ack.
    ///
    /// The entry is recorded before `send` runs, so an ack can never arrive
    /// for an id the ledger has not seen yet.
    pub fn dispatch<F>(
        &mut self,
        direction: Direction,
        input: InputId,
        repeat: bool,
        timeout: Duration,
        now: Instant,
        send: F,
    ) -> SequenceId
    where
        F: FnOnce(&KeyEventPayload),
    {
        let seq = self.sequence.next();
        let payload = KeyEventPayload {
            direction,
            code: input.as_str().to_string(),
            repeat,
            seq,
        };

        self.entries.insert(
            seq,
            PendingEntry {
                seq,
                direction,
                input,
                repeat,
                deadline: now + timeout,
            },
        );
        trace!(%seq, %direction, code = %payload.code, "pending entry recorded");

        send(&payload);
        seq
    }

    /// Matches `ack` against the pending entries by sequence id only.
    pub fn resolve(&mut self, ack: AckPayload) -> Resolution {
        match ack.seq.and_then(|seq| self.entries.remove(&seq)) {
            Some(entry) => Resolution::Resolved { entry, ack },
            None => Resolution::NotFound { ack },
        }
    }

    /// Removes and returns every entry whose deadline is at or before `now`,
    /// in ascending sequence order.
    pub fn expire(&mut self, now: Instant) -> Vec<PendingEntry> {
        let due: Vec<SequenceId> = self
            .entries
            .values()
            .filter(|entry| entry.deadline <= now)
            .map(|entry| entry.seq)
            .collect();

        due.into_iter()
            .filter_map(|seq| self.entries.remove(&seq))
            .collect()
    }

    /// Removes and returns every pending entry in ascending sequence order.
    ///
    /// Sequence allocation is unaffected: ids handed out later still continue
    /// from where they left off.
    pub fn drain(&mut self) -> Vec<PendingEntry> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    /// The earliest deadline among pending entries.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|entry| entry.deadline).min()
    }

    pub fn get(&self, seq: SequenceId) -> Option<&PendingEntry> {
        self.entries.get(&seq)
    }

    pub fn contains(&self, seq: SequenceId) -> bool {
        self.entries.contains_key(&seq)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently allocated sequence id.
    pub fn last_sequence(&self) -> Option<SequenceId> {
        self.sequence.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = DEFAULT_ACK_TIMEOUT;

    fn ack_ok(seq: u64) -> AckPayload {
        AckPayload {
            ok: true,
            seq: Some(SequenceId(seq)),
            ..AckPayload::default()
        }
    }

    /// Dispatches without caring about the payload.
    fn dispatch(ledger: &mut PendingLedger, direction: Direction, code: &str, now: Instant) -> SequenceId {
        ledger.dispatch(direction, InputId::from(code), false, TIMEOUT, now, |_| {})
    }

    #[test]
    fn test_dispatch_sends_payload_once_with_first_id() {
        // Arrange
        let mut ledger = PendingLedger::new();
        let mut sent = Vec::new();

        // Act
        let seq = ledger.dispatch(
            Direction::Down,
            InputId::from("KeyW"),
            false,
            TIMEOUT,
            Instant::now(),
            |payload| sent.push(payload.clone()),
        );

        // Assert
        assert_eq!(seq, SequenceId(1));
        assert_eq!(
            sent,
            vec![KeyEventPayload {
                direction: Direction::Down,
                code: "KeyW".to_string(),
                repeat: false,
                seq: SequenceId(1),
            }]
        );
        assert!(ledger.contains(seq));
    }

    #[test]
    fn test_dispatch_passes_repeat_flag_through() {
        let mut ledger = PendingLedger::new();
        let mut sent_repeat = false;

        let seq = ledger.dispatch(
            Direction::Up,
            InputId::from("KeyA"),
            true,
            TIMEOUT,
            Instant::now(),
            |payload| sent_repeat = payload.repeat,
        );

        assert!(sent_repeat);
        assert_eq!(ledger.get(seq).map(|e| e.repeat), Some(true));
    }

    #[test]
    fn test_resolve_removes_entry_and_pairs_it_with_ack() {
        // Arrange
        let mut ledger = PendingLedger::new();
        let now = Instant::now();
        let seq = dispatch(&mut ledger, Direction::Down, "KeyW", now);

        // Act
        let resolution = ledger.resolve(ack_ok(seq.0));

        // Assert
        match resolution {
            Resolution::Resolved { entry, ack } => {
                assert_eq!(entry.seq, seq);
                assert_eq!(entry.input, InputId::from("KeyW"));
                assert!(ack.ok);
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_duplicate_ack_is_not_found() {
        let mut ledger = PendingLedger::new();
        let seq = dispatch(&mut ledger, Direction::Down, "KeyW", Instant::now());
        ledger.resolve(ack_ok(seq.0));

        let second = ledger.resolve(ack_ok(seq.0));

        assert!(matches!(second, Resolution::NotFound { .. }));
    }

    #[test]
    fn test_ack_for_unknown_id_is_not_found_and_changes_nothing() {
        let mut ledger = PendingLedger::new();
        dispatch(&mut ledger, Direction::Down, "KeyW", Instant::now());

        let resolution = ledger.resolve(ack_ok(99));

        assert!(matches!(resolution, Resolution::NotFound { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_ack_without_seq_is_not_found() {
        let mut ledger = PendingLedger::new();
        dispatch(&mut ledger, Direction::Down, "KeyW", Instant::now());

        let resolution = ledger.resolve(AckPayload {
            ok: false,
            error: Some("bad payload".to_string()),
            ..AckPayload::default()
        });

        assert!(matches!(resolution, Resolution::NotFound { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_expire_before_deadline_returns_nothing() {
        let mut ledger = PendingLedger::new();
        let now = Instant::now();
        dispatch(&mut ledger, Direction::Down, "KeyW", now);

        let expired = ledger.expire(now + TIMEOUT - Duration::from_millis(1));

        assert!(expired.is_empty());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_late_ack_after_timeout_is_not_found() {
        // Arrange: seq 2 is dispatched and never acknowledged in time
        let mut ledger = PendingLedger::new();
        let now = Instant::now();
        dispatch(&mut ledger, Direction::Down, "KeyW", now);
        let seq = dispatch(&mut ledger, Direction::Up, "KeyW", now);
        ledger.resolve(ack_ok(1));

        // Act: the deadline passes, then the ack straggles in
        let expired = ledger.expire(now + TIMEOUT);
        let late = ledger.resolve(ack_ok(seq.0));

        // Assert
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].seq, SequenceId(2));
        assert!(matches!(late, Resolution::NotFound { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_expire_after_resolve_is_a_no_op() {
        let mut ledger = PendingLedger::new();
        let now = Instant::now();
        let seq = dispatch(&mut ledger, Direction::Down, "KeyW", now);
        ledger.resolve(ack_ok(seq.0));

        assert!(ledger.expire(now + TIMEOUT * 2).is_empty());
    }

    #[test]
    fn test_expire_returns_due_entries_in_sequence_order() {
        // Arrange: three entries with staggered deadlines
        let mut ledger = PendingLedger::new();
        let t0 = Instant::now();
        dispatch(&mut ledger, Direction::Down, "KeyW", t0);
        dispatch(&mut ledger, Direction::Down, "KeyD", t0 + Duration::from_millis(100));
        dispatch(&mut ledger, Direction::Up, "KeyW", t0 + Duration::from_millis(5000));

        // Act
        let expired = ledger.expire(t0 + TIMEOUT + Duration::from_millis(100));

        // Assert
        let seqs: Vec<u64> = expired.iter().map(|e| e.seq.0).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert!(ledger.contains(SequenceId(3)));
    }

    #[test]
    fn test_next_deadline_tracks_earliest_entry() {
        let mut ledger = PendingLedger::new();
        let t0 = Instant::now();
        assert_eq!(ledger.next_deadline(), None);

        dispatch(&mut ledger, Direction::Down, "KeyW", t0 + Duration::from_millis(50));
        dispatch(&mut ledger, Direction::Down, "KeyD", t0);
        assert_eq!(ledger.next_deadline(), Some(t0 + TIMEOUT));

        ledger.resolve(ack_ok(2));
        assert_eq!(
            ledger.next_deadline(),
            Some(t0 + Duration::from_millis(50) + TIMEOUT)
        );
    }

    #[test]
    fn test_acks_resolve_in_arrival_order_not_send_order() {
        let mut ledger = PendingLedger::new();
        let now = Instant::now();
        dispatch(&mut ledger, Direction::Down, "KeyW", now);
        dispatch(&mut ledger, Direction::Down, "KeyD", now);

        let second = ledger.resolve(ack_ok(2));
        let first = ledger.resolve(ack_ok(1));

        assert!(matches!(second, Resolution::Resolved { ref entry, .. } if entry.input.as_str() == "KeyD"));
        assert!(matches!(first, Resolution::Resolved { ref entry, .. } if entry.input.as_str() == "KeyW"));
    }

    #[test]
    fn test_ids_are_not_reused_after_drain() {
        // Arrange
        let mut ledger = PendingLedger::new();
        let now = Instant::now();
        dispatch(&mut ledger, Direction::Down, "KeyW", now);
        dispatch(&mut ledger, Direction::Down, "KeyD", now);

        // Act
        let drained = ledger.drain();
        let next = dispatch(&mut ledger, Direction::Down, "KeyW", now);

        // Assert
        assert_eq!(drained.len(), 2);
        assert_eq!(next, SequenceId(3));
        assert_eq!(ledger.last_sequence(), Some(SequenceId(3)));
    }

    #[test]
    fn test_same_input_pressed_twice_gets_distinct_entries() {
        let mut ledger = PendingLedger::new();
        let now = Instant::now();

        let a = dispatch(&mut ledger, Direction::Down, "KeyW", now);
        let b = dispatch(&mut ledger, Direction::Up, "KeyW", now);
        let c = dispatch(&mut ledger, Direction::Down, "KeyW", now);

        assert_ne!(a, c);
        assert_eq!(ledger.len(), 3);
        assert!(matches!(ledger.resolve(ack_ok(b.0)), Resolution::Resolved { ref entry, .. } if entry.direction == Direction::Up));
    }
}
