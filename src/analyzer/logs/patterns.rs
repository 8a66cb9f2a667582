//! Regular expressions used by the log classifiers.
//!
//! Patterns are case-insensitive and never mutually exclusive: a line is
//! tested against every entry of a table.

use std::sync::LazyLock;

use regex::Regex;

use super::types::EventKind;

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("valid regex")
}

/// A classification rule for server error lines.
pub struct ErrorPattern {
    pub kind: EventKind,
    pub regex: Regex,
    /// Matching lines also go on the critical timeline.
    pub critical: bool,
}

fn error_pattern(kind: EventKind, pattern: &str, critical: bool) -> ErrorPattern {
    ErrorPattern {
        kind,
        regex: compile(pattern),
        critical,
    }
}

// ============================================================================
// Server (MariaDB / Galera) log
// ============================================================================

pub static TIMESTAMPS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})"),
        compile(r"(\d{6}\s+\d{2}:\d{2}:\d{2})"),
    ]
});

pub static ERROR: LazyLock<Regex> = LazyLock::new(|| compile(r"\[ERROR\]|ERROR:"));
pub static WARNING: LazyLock<Regex> = LazyLock::new(|| compile(r"\[Warning\]|Warning:"));

/// Applied in order to lines that match [`ERROR`].
pub static ERROR_CATEGORIES: LazyLock<Vec<ErrorPattern>> = LazyLock::new(|| {
    use EventKind::*;
    vec![
        error_pattern(
            DiskFull,
            r"table.*is full|disk full|no space|HA_ERR_RECORD_FILE_FULL|errno.*28",
            true,
        ),
        error_pattern(
            DiskIoError,
            r"disk.*I/O.*error|read.*error|write.*error|pread.*failed|pwrite.*failed",
            true,
        ),
        error_pattern(Inconsistency, r"inconsisten", true),
        error_pattern(
            ConnectionAbort,
            r"Aborted.connection|Got.an.error.reading|communication.packets",
            false,
        ),
        error_pattern(
            InnodbMemory,
            r"buffer.pool.*warning|cannot allocate|memory.*exhausted|oom|out.of.memory|InnoDB.*Cannot allocate|InnoDB.*out of memory|mmap.*failed",
            true,
        ),
        error_pattern(
            InnodbOom,
            r"InnoDB.*Cannot allocate|InnoDB.*out of memory|mmap.*failed",
            true,
        ),
        error_pattern(
            InnodbCorruption,
            r"corrupt|checksum.*mismatch|page.*invalid",
            true,
        ),
        error_pattern(
            Crash,
            r"crash|segfault|SIGSEGV|SIGABRT|SIGKILL|assertion.*fail|mysqld.*got.*signal",
            true,
        ),
        error_pattern(
            OomKiller,
            r"oom.killer|Out.of.memory.*Killed|invoked.oom-killer|memory.cgroup",
            true,
        ),
        error_pattern(
            ReplicationError,
            r"Slave.*error|replication.*error|Last_Error|Slave_IO_Running.*No|Slave_SQL_Running.*No",
            true,
        ),
        error_pattern(
            BinlogError,
            r"binlog.*error|binary.log.*error|relay.log.*error|could not.*binlog",
            true,
        ),
        error_pattern(
            GtidError,
            r"GTID.*error|gtid.*mismatch|gtid.*gap|gtid.*skip",
            false,
        ),
        error_pattern(
            SlaveStopped,
            r"Slave.*stopped|slave.*thread.*exiting|stopping.*slave",
            false,
        ),
        error_pattern(
            MaxConnections,
            r"max_connections|too.many.connections|Connection.*refused|ERROR.*1040",
            true,
        ),
        error_pattern(
            ConnectionRefused,
            r"connection.*refused|Access.denied|ERROR.*1045|Host.*blocked",
            false,
        ),
        error_pattern(
            HostBlocked,
            r"Host.*blocked|blocked.because.of.many.connection.errors",
            true,
        ),
        error_pattern(
            SslError,
            r"SSL.*error|TLS.*error|certificate.*error|handshake.*fail",
            false,
        ),
        error_pattern(Deadlock, r"deadlock", false),
        error_pattern(LockWait, r"lock.wait.timeout|waiting.for.*lock", false),
        error_pattern(
            LongSemaphore,
            r"long.semaphore.wait|Semaphore.wait|waited.*seconds",
            true,
        ),
    ]
});

pub static FLOW_CONTROL: LazyLock<Regex> = LazyLock::new(|| compile(r"flow.control"));

pub static STARTUP: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"starting.*mysqld|MariaDB.*starting|ready for connections|Server.*socket.*created")
});

pub static UNEXPECTED_SHUTDOWN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"unexpected|abnormal|unclean|not.*graceful|killed|SIGTERM|SIGKILL")
});

pub static INNODB_RECOVERY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"InnoDB.*recovery|crash.recovery|Starting.crash.recovery")
});

// ============================================================================
// Proxy log
// ============================================================================

pub static PROXY_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})"));

pub static PROXY_ERROR: LazyLock<Regex> = LazyLock::new(|| compile(r"error\s*:"));
pub static PROXY_WARNING: LazyLock<Regex> = LazyLock::new(|| compile(r"warning\s*:"));
pub static PROXY_SERVER_DOWN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"server_down|slave_down|master_down"));
pub static PROXY_SERVER_UP: LazyLock<Regex> =
    LazyLock::new(|| compile(r"server_up|slave_up|master_up|new_master|new_slave"));
pub static PROXY_CONNECTION_ERROR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"Can't connect|connection refused|unable to connect"));
pub static PROXY_MASTER_CHANGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"lost_master|new_master"));
pub static PROXY_NO_CLUSTER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"no cluster members"));
pub static PROXY_PROTOCOL_ERROR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"protocol|unexpected sequence|invalid.*Request"));

// ============================================================================
// Slow query log
// ============================================================================

pub static QUERY_TIME: LazyLock<Regex> = LazyLock::new(|| compile(r"Query_time:\s*([\d.]+)"));
pub static LOCK_TIME: LazyLock<Regex> = LazyLock::new(|| compile(r"Lock_time:\s*([\d.]+)"));
pub static ROWS_EXAMINED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"Rows_examined:\s*(\d+)"));

/// First timestamp found by the ordered server-log formats.
pub fn server_timestamp(line: &str) -> Option<&str> {
    TIMESTAMPS
        .iter()
        .find_map(|re| re.captures(line).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

pub fn proxy_timestamp(line: &str) -> Option<&str> {
    PROXY_TIMESTAMP
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
