//! Sequence-id allocation for outbound `key_event` messages.
//!
//! # Why sequence ids?
//!
//! The peer answers every `key_event` with an `ack`.  The user can press and
//! release the same key several times before the first ack arrives, so the
//! pair `(direction, code)` cannot tell two sends apart.  Each send therefore
//! carries a fresh integer and the ack echoes it back.
//!
//! Ids are never reused for the lifetime of a session.  If an entry times out
//! and the ack for it shows up later, that late ack cannot be mistaken for
//! the ack of a newer send.
//!
//! # Ownership
//!
//! The allocator lives inside the pending-delivery ledger, which is owned by
//! a single event-loop task.  A plain `u64` behind `&mut self` is enough; no
//! atomics are needed.

use super::messages::SequenceId;

/// A monotonically increasing allocator for [`SequenceId`]s.
///
/// The first id handed out is `1`, then `2`, and so on.
///
/// # Examples
///
/// ```rust
/// use keyrelay_core::protocol::{SequenceAllocator, SequenceId};
///
/// let mut seq = SequenceAllocator::new();
/// assert_eq!(seq.next(), SequenceId(1));
/// assert_eq!(seq.next(), SequenceId(2));
/// ```
#[derive(Debug)]
pub struct SequenceAllocator {
    /// The id the next call to [`next`](Self::next) returns.
    upcoming: u64,
}

impl SequenceAllocator {
    /// Creates an allocator whose first id is `1`.
    pub fn new() -> Self {
        Self { upcoming: 1 }
    }

    /// Returns a fresh id and advances the allocator.
    ///
    /// Saturates at `u64::MAX`; at one id per key press that bound is not
    /// reachable by a human-driven session.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> SequenceId {
        let id = SequenceId(self.upcoming);
        self.upcoming = self.upcoming.saturating_add(1);
        id
    }

    /// Returns the most recently allocated id, or `None` before the first call
    /// to [`next`](Self::next).
    pub fn last(&self) -> Option<SequenceId> {
        (self.upcoming > 1).then(|| SequenceId(self.upcoming - 1))
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}
