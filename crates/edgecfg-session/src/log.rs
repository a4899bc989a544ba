//! Operator-facing activity log.
//!
//! A bounded record of what the session did and what went wrong, kept
//! alongside the `tracing` output so a front end can show it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One timestamped log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "unix_millis")]
    pub at: SystemTime,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let since_epoch = self.at.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        let secs = since_epoch.as_secs() % 86_400;
        write!(
            f,
            "[{:02}:{:02}:{:02}.{:03}] {}{}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            since_epoch.subsec_millis(),
            match self.level {
                LogLevel::Info => "",
                LogLevel::Error => "ERROR: ",
            },
            self.message
        )
    }
}

fn unix_millis<S: Serializer>(at: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis();
    serializer.serialize_u64(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// Bounded in-memory log. The oldest entries are evicted first.
#[derive(Debug)]
pub struct ActivityLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "edgecfg::activity", "{message}");
        self.push(LogLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "edgecfg::activity", "{message}");
        self.push(LogLevel::Error, message);
    }

    fn push(&self, level: LogLevel, message: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            at: SystemTime::now(),
            level,
            message,
        });
    }

    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let log = ActivityLog::new(2);
        log.info("one");
        log.error("two");
        log.info("three");

        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "two");
        assert_eq!(entries[0].level, LogLevel::Error);
        assert_eq!(entries[1].message, "three");
    }

    #[test]
    fn display_marks_errors() {
        let entry = LogEntry {
            at: UNIX_EPOCH + Duration::from_millis(3_723_045),
            level: LogLevel::Error,
            message: "request timed out".to_string(),
        };
        assert_eq!(entry.to_string(), "[01:02:03.045] ERROR: request timed out");
    }

    #[test]
    fn serializes_timestamp_as_millis() {
        let entry = LogEntry {
            at: UNIX_EPOCH + Duration::from_millis(1500),
            level: LogLevel::Info,
            message: "ok".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["at"], 1500);
        assert_eq!(json["level"], "info");
    }

    #[test]
    fn clear_empties() {
        let log = ActivityLog::new(4);
        log.info("x");
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }
}
