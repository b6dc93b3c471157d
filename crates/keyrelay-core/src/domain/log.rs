//! Bounded, newest-first activity log.
//!
//! The status surface keeps a running audit of connection events and
//! delivery outcomes.  Only the most recent entries are retained; when the
//! log is full the oldest entry is evicted.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};

/// Number of entries retained when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Category of an activity-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    /// Transport lifecycle (connect, disconnect, errors).
    Socket,
    /// Informational messages from the peer.
    Server,
    /// A delivery the peer confirmed.
    Ok,
    /// A delivery the peer rejected, or one abandoned on disconnect.
    Fail,
    /// A delivery nobody answered in time.
    Timeout,
}

impl LogTag {
    pub fn as_str(self) -> &'static str {
        match self {
            LogTag::Socket => "socket",
            LogTag::Server => "server",
            LogTag::Ok => "ok",
            LogTag::Fail => "fail",
            LogTag::Timeout => "timeout",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub tag: LogTag,
    pub message: String,
}

/// Renders `[14:03:27] ok: Received: press KeyW`.
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.at.format("%H:%M:%S"),
            self.tag,
            self.message
        )
    }
}

/// Ring of the most recent [`LogEntry`]s, newest first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    /// Creates a log retaining at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a line stamped with the current local time.
    pub fn push(&mut self, tag: LogTag, message: impl Into<String>) {
        self.push_at(Local::now(), tag, message);
    }

    /// Appends a line with an explicit timestamp, evicting the oldest line
    /// when full.
    pub fn push_at(&mut self, at: DateTime<Local>, tag: LogTag, message: impl Into<String>) {
        self.entries.push_front(LogEntry {
            at,
            tag,
            message: message.into(),
        });
        self.entries.truncate(self.capacity);
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_log_keeps_newest_first() {
        // Arrange
        let mut log = ActivityLog::default();

        // Act
        log.push(LogTag::Socket, "connected");
        log.push(LogTag::Ok, "Received: press KeyW");

        // Assert
        let messages: Vec<&str> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Received: press KeyW", "connected"]);
        assert_eq!(log.latest().map(|e| e.tag), Some(LogTag::Ok));
    }

    #[test]
    fn test_log_evicts_oldest_beyond_capacity() {
        let mut log = ActivityLog::default();

        for i in 0..(DEFAULT_LOG_CAPACITY + 10) {
            log.push(LogTag::Ok, format!("entry {i}"));
        }

        assert_eq!(log.len(), DEFAULT_LOG_CAPACITY);
        assert_eq!(log.latest().map(|e| e.message.as_str()), Some("entry 59"));
        assert_eq!(log.iter().last().map(|e| e.message.as_str()), Some("entry 10"));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut log = ActivityLog::with_capacity(0);
        log.push(LogTag::Socket, "a");
        log.push(LogTag::Socket, "b");

        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_entry_display_format() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 27).unwrap();
        let mut log = ActivityLog::default();

        log.push_at(at, LogTag::Timeout, "Not received: press KeyW (timeout)");

        assert_eq!(
            log.latest().unwrap().to_string(),
            "[14:03:27] timeout: Not received: press KeyW (timeout)"
        );
    }
}
