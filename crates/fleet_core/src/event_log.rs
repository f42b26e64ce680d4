//! Rolling player-facing event log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Entries kept before the oldest is dropped.
pub const EVENT_LOG_CAPACITY: usize = 50;

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    /// Simulation time the entry was written.
    pub time_ms: u64,
    /// Message text.
    pub message: String,
}

/// Capped log, newest entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, dropping the oldest past capacity.
    pub fn push(&mut self, time_ms: u64, message: impl Into<String>) {
        self.entries.push_front(LogEntry {
            time_ms,
            message: message.into(),
        });
        self.entries.truncate(EVENT_LOG_CAPACITY);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = EventLog::new();
        log.push(0, "first");
        log.push(16, "second");
        assert_eq!(log.latest().unwrap().message, "second");
        assert_eq!(log.iter().last().unwrap().message, "first");
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = EventLog::new();
        for i in 0..60 {
            log.push(i, format!("entry {i}"));
        }
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
        assert_eq!(log.latest().unwrap().message, "entry 59");
        assert!(!log.contains("entry 9"));
        assert!(log.contains("entry 10"));
    }
}
