//! Event and summary types shared by the log classifiers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Longest message kept on a [`LogEvent`], in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

/// Fixed event buckets a server log line can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DiskFull,
    DiskIoError,
    Inconsistency,
    InnodbMemory,
    InnodbOom,
    InnodbCorruption,
    Crash,
    OomKiller,
    ReplicationError,
    BinlogError,
    GtidError,
    SlaveStopped,
    MaxConnections,
    ConnectionRefused,
    ConnectionAbort,
    HostBlocked,
    SslError,
    Deadlock,
    LockWait,
    LongSemaphore,
    Sst,
    Ist,
    FlowControl,
    StateChange,
    Startup,
    UnexpectedShutdown,
    RecoveryAfterCrash,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiskFull => "disk_full",
            Self::DiskIoError => "disk_io_error",
            Self::Inconsistency => "inconsistency",
            Self::InnodbMemory => "innodb_memory",
            Self::InnodbOom => "innodb_oom",
            Self::InnodbCorruption => "innodb_corruption",
            Self::Crash => "crash",
            Self::OomKiller => "oom_killer",
            Self::ReplicationError => "replication_error",
            Self::BinlogError => "binlog_error",
            Self::GtidError => "gtid_error",
            Self::SlaveStopped => "slave_stopped",
            Self::MaxConnections => "max_connections",
            Self::ConnectionRefused => "connection_refused",
            Self::ConnectionAbort => "connection_abort",
            Self::HostBlocked => "host_blocked",
            Self::SslError => "ssl_error",
            Self::Deadlock => "deadlock",
            Self::LockWait => "lock_wait",
            Self::LongSemaphore => "long_semaphore",
            Self::Sst => "sst",
            Self::Ist => "ist",
            Self::FlowControl => "flow_control",
            Self::StateChange => "state_change",
            Self::Startup => "startup",
            Self::UnexpectedShutdown => "unexpected_shutdown",
            Self::RecoveryAfterCrash => "recovery_after_crash",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: Option<String>,
    pub message: String,
    /// Set on critical timeline entries.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<EventKind>,
}

impl LogEvent {
    pub fn new(timestamp: Option<&str>, line: &str) -> Self {
        Self {
            timestamp: timestamp.map(str::to_string),
            message: truncate_message(line),
            kind: None,
        }
    }

    pub fn tagged(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.timestamp {
            Some(ts) => write!(f, "[{}] {}", ts, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Keep at most [`MAX_MESSAGE_CHARS`] characters, never splitting a code point.
pub fn truncate_message(line: &str) -> String {
    line.chars().take(MAX_MESSAGE_CHARS).collect()
}

/// Parse `YYYY-MM-DD HH:MM:SS` or compact `YYMMDD HH:MM:SS` (read as 20YY).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(ts) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(&format!("20{normalized}"), "%Y%m%d %H:%M:%S").ok()
}

/// Render the first few events for a finding's details.
pub(crate) fn sample_events(events: &[LogEvent]) -> String {
    events
        .iter()
        .take(3)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Server log summary
// ============================================================================

/// Running counters and event buckets for one server log stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub total_lines: usize,
    pub error_count: usize,
    pub warning_count: usize,
    /// Events of every critical kind, in line order.
    pub critical_events: Vec<LogEvent>,
    pub events: BTreeMap<EventKind, Vec<LogEvent>>,
}

impl LogSummary {
    pub fn record(&mut self, kind: EventKind, event: LogEvent) {
        self.events.entry(kind).or_default().push(event);
    }

    pub fn events(&self, kind: EventKind) -> &[LogEvent] {
        self.events.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events(kind).len()
    }

    /// Disk-full and disk I/O events together.
    pub fn disk_issues(&self) -> Vec<LogEvent> {
        self.merged(&[EventKind::DiskFull, EventKind::DiskIoError])
    }

    /// Crashes plus recoveries that imply an earlier crash.
    pub fn crash_events(&self) -> Vec<LogEvent> {
        self.merged(&[EventKind::Crash, EventKind::RecoveryAfterCrash])
    }

    fn merged(&self, kinds: &[EventKind]) -> Vec<LogEvent> {
        kinds
            .iter()
            .flat_map(|k| self.events(*k).iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_both_timestamp_formats() {
        let iso = parse_timestamp("2025-12-08 18:08:38").unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2025, 12, 8));
        let compact = parse_timestamp("251208  12:45:08").unwrap();
        assert_eq!(compact.year(), 2025);
        assert_eq!(compact.hour(), 12);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_truncate_is_char_based() {
        let long = "é".repeat(250);
        assert_eq!(truncate_message(&long).chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(truncate_message("short"), "short");
    }

    #[test]
    fn test_event_kind_serializes_snake_case() {
        let event = LogEvent::new(None, "x").tagged(EventKind::DiskFull);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "disk_full");
        assert_eq!(EventKind::RecoveryAfterCrash.to_string(), "recovery_after_crash");
    }
}
