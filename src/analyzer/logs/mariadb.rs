//! Server error log classifier (MariaDB and Galera).

use serde::{Deserialize, Serialize};

use super::patterns;
use super::types::{EventKind, LogEvent, LogSummary, sample_events};
use crate::analyzer::types::{Category, Effort, Finding, Recommendation, ReviewFindings, Severity};

/// Classification of one server log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MariaDbLogReport {
    pub log_name: String,
    pub summary: LogSummary,
    #[serde(flatten)]
    pub output: ReviewFindings,
}

impl MariaDbLogReport {
    pub fn critical_issues(&self) -> usize {
        self.summary.critical_events.len()
    }

    pub fn sst_count(&self) -> usize {
        self.summary.count(EventKind::Sst)
    }

    pub fn ist_count(&self) -> usize {
        self.summary.count(EventKind::Ist)
    }

    pub fn disk_issue_count(&self) -> usize {
        self.summary.count(EventKind::DiskFull) + self.summary.count(EventKind::DiskIoError)
    }

    pub fn inconsistency_count(&self) -> usize {
        self.summary.count(EventKind::Inconsistency)
    }

    pub fn crash_count(&self) -> usize {
        self.summary.count(EventKind::Crash) + self.summary.count(EventKind::RecoveryAfterCrash)
    }

    pub fn restart_count(&self) -> usize {
        self.summary.count(EventKind::Startup)
    }
}

/// Scan `content` line by line and derive findings.
pub fn analyze_mariadb_log(content: &str, log_name: &str) -> MariaDbLogReport {
    let summary = classify(content);
    log::debug!(
        "{}: {} lines, {} errors, {} critical events",
        log_name,
        summary.total_lines,
        summary.error_count,
        summary.critical_events.len()
    );
    let output = findings(&summary, log_name);
    MariaDbLogReport {
        log_name: log_name.to_string(),
        summary,
        output,
    }
}

fn classify(content: &str) -> LogSummary {
    let mut summary = LogSummary {
        total_lines: content.split('\n').count(),
        ..LogSummary::default()
    };

    for line in content.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let timestamp = patterns::server_timestamp(line);
        let event = LogEvent::new(timestamp, line);
        let is_error = patterns::ERROR.is_match(line);

        if is_error {
            summary.error_count += 1;
            for pattern in patterns::ERROR_CATEGORIES.iter() {
                if pattern.regex.is_match(line) {
                    summary.record(pattern.kind, event.clone());
                    if pattern.critical {
                        summary
                            .critical_events
                            .push(event.clone().tagged(pattern.kind));
                    }
                }
            }
        }
        if patterns::WARNING.is_match(line) {
            summary.warning_count += 1;
        }

        let upper = line.to_uppercase();
        if upper.contains("SST") {
            summary.record(EventKind::Sst, event.clone());
        }
        if upper.contains("IST") {
            summary.record(EventKind::Ist, event.clone());
        }
        if patterns::FLOW_CONTROL.is_match(line) {
            summary.record(EventKind::FlowControl, event.clone());
        }
        if line.to_lowercase().contains("state change") || line.contains("Shifting") {
            summary.record(EventKind::StateChange, event.clone());
        }
        if patterns::STARTUP.is_match(line) {
            summary.record(EventKind::Startup, event.clone());
        }
        if is_error && patterns::UNEXPECTED_SHUTDOWN.is_match(line) {
            summary.record(EventKind::UnexpectedShutdown, event.clone());
        }
        if patterns::INNODB_RECOVERY.is_match(line) {
            summary.record(
                EventKind::RecoveryAfterCrash,
                event.tagged(EventKind::RecoveryAfterCrash),
            );
        }
    }
    summary
}

fn finding(
    severity: Severity,
    category: Category,
    title: String,
    description: String,
    details: impl Into<String>,
) -> Finding {
    Finding::new(severity, category, title, description).with_details(details)
}

fn findings(summary: &LogSummary, log_name: &str) -> ReviewFindings {
    use EventKind::*;
    let mut output = ReviewFindings::new();

    let disk = summary.disk_issues();
    if !disk.is_empty() {
        output.finding(finding(
            Severity::Critical,
            Category::Storage,
            format!("Disk space issues detected in {log_name}"),
            format!("Found {} disk/table full errors", disk.len()),
            sample_events(&disk),
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Storage,
                "Address disk space issues immediately",
                "Tables or disk becoming full caused node failures",
            )
            .with_action(
                "1. Check disk space with df -h\n2. Identify large tables\n3. Clean up old data or expand storage",
            )
            .with_impact("Critical - prevents node failures")
            .with_effort(Effort::Medium),
        );
    }

    let memory = summary.events(InnodbMemory);
    if !memory.is_empty() {
        output.finding(finding(
            Severity::Critical,
            Category::Resource,
            format!("InnoDB buffer pool issues in {log_name}"),
            format!("Found {} InnoDB buffer/memory warnings", memory.len()),
            sample_events(memory),
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Resource,
                "Review InnoDB buffer pool configuration",
                "Buffer pool memory issues can cause severe performance degradation",
            )
            .with_action(
                "1. Check innodb_buffer_pool_size vs available RAM\n2. Monitor memory usage\n3. Consider reducing buffer pool or adding RAM",
            )
            .with_impact("Critical - prevents OOM and crashes")
            .with_effort(Effort::Medium),
        );
    }

    if summary.count(InnodbOom) > 0 {
        output.finding(finding(
            Severity::Critical,
            Category::Resource,
            format!("InnoDB out-of-memory events in {log_name}"),
            format!("Found {} InnoDB OOM events", summary.count(InnodbOom)),
            "InnoDB could not allocate memory - may cause crashes",
        ));
    }

    if summary.count(InnodbCorruption) > 0 {
        output.finding(finding(
            Severity::Critical,
            Category::Storage,
            format!("InnoDB corruption detected in {log_name}"),
            format!(
                "Found {} corruption/checksum errors",
                summary.count(InnodbCorruption)
            ),
            "Data corruption detected - immediate investigation required",
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Storage,
                "Investigate InnoDB corruption immediately",
                "Data corruption can lead to data loss",
            )
            .with_action(
                "1. Run CHECK TABLE on affected tables\n2. Check disk health (SMART status)\n3. Consider restoring from backup if severe",
            )
            .with_impact("Critical - data integrity at risk")
            .with_effort(Effort::High),
        );
    }

    let crashes = summary.crash_events();
    if !crashes.is_empty() {
        output.finding(finding(
            Severity::Critical,
            Category::Availability,
            format!("Crash/recovery events detected in {log_name}"),
            format!("Found {} crash or recovery events", crashes.len()),
            sample_events(&crashes),
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Availability,
                "Investigate MariaDB crashes",
                "Crashes indicate severe issues requiring investigation",
            )
            .with_action(
                "1. Check for segfaults in system logs\n2. Review memory usage patterns\n3. Check for known bugs in MariaDB version",
            )
            .with_impact("Critical - service availability")
            .with_effort(Effort::High),
        );
    }

    if summary.count(OomKiller) > 0 {
        output.finding(finding(
            Severity::Critical,
            Category::Resource,
            format!("OOM killer events detected in {log_name}"),
            format!("Found {} OOM killer invocations", summary.count(OomKiller)),
            "Linux OOM killer terminated MariaDB due to memory exhaustion",
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Resource,
                "Address memory exhaustion",
                "OOM killer is terminating MariaDB",
            )
            .with_action(
                "1. Reduce innodb_buffer_pool_size\n2. Add swap space\n3. Increase server RAM\n4. Check for memory leaks",
            )
            .with_impact("Critical - prevents unplanned restarts")
            .with_effort(Effort::Medium),
        );
    }

    if summary.count(Startup) > 5 {
        output.finding(finding(
            Severity::Warning,
            Category::Availability,
            format!("Frequent restarts detected in {log_name}"),
            format!("Found {} server startup events", summary.count(Startup)),
            "Multiple restarts may indicate instability",
        ));
    }

    let replication = summary.events(ReplicationError);
    if !replication.is_empty() {
        output.finding(finding(
            Severity::Critical,
            Category::Replication,
            format!("Replication errors in {log_name}"),
            format!("Found {} replication errors", replication.len()),
            sample_events(replication),
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Replication,
                "Fix replication errors",
                "Replication is broken or experiencing errors",
            )
            .with_action(
                "1. Check SHOW SLAVE STATUS\\G\n2. Identify and fix the error\n3. Consider pt-table-sync for data drift",
            )
            .with_impact("Critical - data consistency at risk")
            .with_effort(Effort::Medium),
        );
    }

    let simple = [
        (
            BinlogError,
            Severity::Critical,
            Category::Replication,
            "Binary log errors",
            "binlog/relay log errors",
            "Binary log errors can break replication",
        ),
        (
            GtidError,
            Severity::Warning,
            Category::Replication,
            "GTID errors",
            "GTID-related errors",
            "GTID gaps or mismatches can cause replication issues",
        ),
        (
            SlaveStopped,
            Severity::Warning,
            Category::Replication,
            "Slave stopped events",
            "slave stopped events",
            "Replication slave has stopped - may need manual intervention",
        ),
    ];
    for (kind, severity, category, title, noun, details) in simple {
        if summary.count(kind) > 0 {
            output.finding(finding(
                severity,
                category,
                format!("{title} in {log_name}"),
                format!("Found {} {noun}", summary.count(kind)),
                details,
            ));
        }
    }

    if summary.count(MaxConnections) > 0 {
        output.finding(finding(
            Severity::Critical,
            Category::Capacity,
            format!("Max connections exceeded in {log_name}"),
            format!(
                "Found {} max_connections errors",
                summary.count(MaxConnections)
            ),
            "Clients are being refused due to connection limit",
        ));
        output.recommend(
            Recommendation::new(
                1,
                Category::Capacity,
                "Increase max_connections or implement pooling",
                "Connection limit is being hit",
            )
            .with_action(
                "1. Increase max_connections\n2. Implement connection pooling\n3. Review application connection handling",
            )
            .with_impact("Critical - clients cannot connect")
            .with_effort(Effort::Low),
        );
    }

    if summary.count(HostBlocked) > 0 {
        output.finding(finding(
            Severity::Critical,
            Category::Security,
            format!("Hosts blocked in {log_name}"),
            format!("Found {} host blocked events", summary.count(HostBlocked)),
            "Hosts are being blocked due to too many connection errors",
        ));
        output.recommend(
            Recommendation::new(
                2,
                Category::Security,
                "Investigate blocked hosts",
                "Hosts are being blocked - may be attack or misconfiguration",
            )
            .with_action(
                "1. Run FLUSH HOSTS to unblock\n2. Increase max_connect_errors\n3. Investigate source of failed connections",
            )
            .with_impact("Clients from blocked hosts cannot connect")
            .with_effort(Effort::Low),
        );
    }

    if summary.count(SslError) > 0 {
        output.finding(finding(
            Severity::Warning,
            Category::Security,
            format!("SSL/TLS errors in {log_name}"),
            format!("Found {} SSL/TLS errors", summary.count(SslError)),
            "SSL handshake or certificate issues",
        ));
    }

    if summary.count(ConnectionAbort) > 100 {
        output.finding(finding(
            Severity::Warning,
            Category::Network,
            format!("High connection abort rate in {log_name}"),
            format!(
                "Found {} aborted connections",
                summary.count(ConnectionAbort)
            ),
            "High abort rate may indicate network issues or client problems",
        ));
    }

    if summary.count(Deadlock) > 0 {
        output.finding(finding(
            Severity::Warning,
            Category::Performance,
            format!("Deadlocks detected in {log_name}"),
            format!("Found {} deadlock events", summary.count(Deadlock)),
            "Deadlocks cause transaction rollbacks",
        ));
        output.recommend(
            Recommendation::new(
                3,
                Category::Performance,
                "Investigate deadlocks",
                "Deadlocks are occurring",
            )
            .with_action(
                "1. Enable innodb_print_all_deadlocks\n2. Review transaction isolation levels\n3. Optimize transaction ordering",
            )
            .with_impact("Reduces failed transactions")
            .with_effort(Effort::Medium),
        );
    }

    if summary.count(LockWait) > 0 {
        output.finding(finding(
            Severity::Warning,
            Category::Performance,
            format!("Lock wait timeouts in {log_name}"),
            format!(
                "Found {} lock wait timeout events",
                summary.count(LockWait)
            ),
            "Transactions are timing out waiting for locks",
        ));
    }

    if summary.count(LongSemaphore) > 0 {
        output.finding(finding(
            Severity::Warning,
            Category::Performance,
            format!("Long semaphore waits in {log_name}"),
            format!(
                "Found {} long semaphore wait events",
                summary.count(LongSemaphore)
            ),
            "InnoDB is experiencing internal contention",
        ));
    }

    let inconsistencies = summary.events(Inconsistency);
    if !inconsistencies.is_empty() {
        output.finding(finding(
            Severity::Critical,
            Category::Galera,
            format!("Galera inconsistency detected in {log_name}"),
            format!(
                "Found {} inconsistency events - nodes were voted out",
                inconsistencies.len()
            ),
            sample_events(inconsistencies),
        ));
    }

    let sst = summary.count(Sst);
    if sst > 3 {
        output.finding(finding(
            Severity::Warning,
            Category::Galera,
            format!("Frequent SST events in {log_name}"),
            format!("Found {sst} SST (full state transfer) events"),
            "Frequent SST indicates nodes frequently need full resync",
        ));
        output.recommend(
            Recommendation::new(
                2,
                Category::Galera,
                "Enable gcache to allow IST instead of SST",
                format!("{sst} SST events detected - IST would be faster"),
            )
            .with_action("Set gcache.size to 1G or higher based on write volume")
            .with_impact("Faster node recovery")
            .with_effort(Effort::Low),
        );
    }

    if summary.count(FlowControl) > 10 {
        output.finding(finding(
            Severity::Warning,
            Category::Performance,
            format!("Flow control activity in {log_name}"),
            format!(
                "Found {} flow control related events",
                summary.count(FlowControl)
            ),
            "Flow control pauses replication when nodes can't keep up",
        ));
    }

    output.finding(finding(
        Severity::Info,
        Category::General,
        format!("Log summary for {log_name}"),
        format!(
            "Total lines: {}, Errors: {}, Warnings: {}",
            summary.total_lines, summary.error_count, summary.warning_count
        ),
        format!(
            "Crashes: {}, Restarts: {}, SST: {}, Replication errors: {}",
            crashes.len(),
            summary.count(Startup),
            sst,
            replication.len()
        ),
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
2025-12-08 18:08:38 0 [ERROR] InnoDB: Write to file ./ibdata1 failed: disk full
2025-12-08 18:08:40 0 [Warning] Aborted connection 42 to db: 'app'
251208 18:09:01 [Note] WSREP: Shifting SYNCED -> DONOR/DESYNCED

2025-12-08 18:10:00 0 [Note] /usr/sbin/mysqld: ready for connections.
";

    #[test]
    fn test_error_line_feeds_counter_and_timeline() {
        let report = analyze_mariadb_log(LOG, "mariadb.log (db1)");
        let summary = &report.summary;
        assert_eq!(summary.total_lines, 6);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(report.disk_issue_count(), 1);
        assert!(
            summary
                .critical_events
                .iter()
                .any(|e| e.kind == Some(EventKind::DiskFull))
        );
        assert_eq!(summary.count(EventKind::StateChange), 1);
        assert_eq!(report.restart_count(), 1);
        assert_eq!(
            summary.events(EventKind::StateChange)[0].timestamp.as_deref(),
            Some("251208 18:09:01")
        );
    }

    #[test]
    fn test_disk_full_produces_critical_finding_and_procedure() {
        let report = analyze_mariadb_log(LOG, "mariadb.log (db1)");
        let disk = report
            .output
            .findings
            .iter()
            .find(|f| f.title == "Disk space issues detected in mariadb.log (db1)")
            .unwrap();
        assert_eq!(disk.severity, Severity::Critical);
        let rec = &report.output.recommendations[0];
        assert_eq!(rec.priority, 1);
        assert!(rec.action.starts_with("1. Check disk space with df -h"));
    }

    #[test]
    fn test_summary_finding_always_last() {
        let report = analyze_mariadb_log("", "mariadb.log (empty)");
        assert_eq!(report.output.findings.len(), 1);
        let summary = report.output.findings.last().unwrap();
        assert_eq!(summary.severity, Severity::Info);
        assert_eq!(summary.title, "Log summary for mariadb.log (empty)");
        assert_eq!(summary.description, "Total lines: 1, Errors: 0, Warnings: 0");
    }

    #[test]
    fn test_frequent_sst_and_restarts() {
        let mut log = String::new();
        for _ in 0..4 {
            log.push_str("[Note] WSREP: Running: 'wsrep_sst_mariabackup --role donor'\n");
        }
        for _ in 0..6 {
            log.push_str("[Note] mysqld: ready for connections.\n");
        }
        let report = analyze_mariadb_log(&log, "n");
        assert_eq!(report.sst_count(), 4);
        let titles: Vec<&str> = report.output.findings.iter().map(|f| f.title.as_str()).collect();
        assert!(titles.contains(&"Frequent SST events in n"));
        assert!(titles.contains(&"Frequent restarts detected in n"));
        assert!(
            report
                .output
                .recommendations
                .iter()
                .any(|r| r.title == "Enable gcache to allow IST instead of SST")
        );
    }

    #[test]
    fn test_garbage_only_counts_lines() {
        let report = analyze_mariadb_log("\u{0}\u{1}\u{fffd}zz\n###", "n");
        assert_eq!(report.summary.total_lines, 2);
        assert_eq!(report.summary.error_count, 0);
        assert!(report.summary.events.is_empty());
    }

    #[test]
    fn test_recovery_counts_as_crash() {
        let report = analyze_mariadb_log(
            "2025-01-01 00:00:00 0 [Note] InnoDB: Starting crash recovery from checkpoint",
            "n",
        );
        assert_eq!(report.crash_count(), 1);
        assert!(report.summary.critical_events.is_empty());
    }
}
