//! Proxy (MaxScale) log classifier.

use serde::{Deserialize, Serialize};

use super::patterns;
use super::types::LogEvent;
use crate::analyzer::types::{Category, Finding, ReviewFindings, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyLogSummary {
    pub total_lines: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub server_down_events: Vec<LogEvent>,
    pub server_up_events: Vec<LogEvent>,
    pub master_changes: Vec<LogEvent>,
    pub connection_errors: Vec<LogEvent>,
    pub cluster_issues: Vec<LogEvent>,
    pub protocol_errors: Vec<LogEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyLogReport {
    pub log_name: String,
    pub summary: ProxyLogSummary,
    #[serde(flatten)]
    pub output: ReviewFindings,
}

impl ProxyLogReport {
    pub fn server_down_count(&self) -> usize {
        self.summary.server_down_events.len()
    }

    pub fn master_change_count(&self) -> usize {
        self.summary.master_changes.len()
    }

    pub fn connection_error_count(&self) -> usize {
        self.summary.connection_errors.len()
    }
}

pub fn analyze_proxy_log(content: &str, log_name: &str) -> ProxyLogReport {
    let mut summary = ProxyLogSummary {
        total_lines: content.split('\n').count(),
        ..ProxyLogSummary::default()
    };

    for line in content.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let event = LogEvent::new(patterns::proxy_timestamp(line), line);

        if patterns::PROXY_ERROR.is_match(line) {
            summary.error_count += 1;
            // First matching error class wins.
            if patterns::PROXY_CONNECTION_ERROR.is_match(line) {
                summary.connection_errors.push(event.clone());
            } else if patterns::PROXY_PROTOCOL_ERROR.is_match(line) {
                summary.protocol_errors.push(event.clone());
            } else if patterns::PROXY_NO_CLUSTER.is_match(line) {
                summary.cluster_issues.push(event.clone());
            }
        }
        if patterns::PROXY_WARNING.is_match(line) {
            summary.warning_count += 1;
        }
        if patterns::PROXY_SERVER_DOWN.is_match(line) {
            summary.server_down_events.push(event.clone());
        }
        if patterns::PROXY_SERVER_UP.is_match(line) {
            summary.server_up_events.push(event.clone());
        }
        if patterns::PROXY_MASTER_CHANGE.is_match(line) {
            summary.master_changes.push(event);
        }
    }

    log::debug!(
        "{}: {} lines, {} server down, {} master changes",
        log_name,
        summary.total_lines,
        summary.server_down_events.len(),
        summary.master_changes.len()
    );
    let output = findings(&summary, log_name);
    ProxyLogReport {
        log_name: log_name.to_string(),
        summary,
        output,
    }
}

fn findings(summary: &ProxyLogSummary, log_name: &str) -> ReviewFindings {
    let mut output = ReviewFindings::new();

    if summary.server_down_events.len() > 5 {
        output.finding(
            Finding::new(
                Severity::Warning,
                Category::Availability,
                format!("Frequent server down events in {log_name}"),
                format!(
                    "Found {} server down events",
                    summary.server_down_events.len()
                ),
            )
            .with_details("Investigate network connectivity or server stability issues"),
        );
    }

    if summary.master_changes.len() > 3 {
        output.finding(
            Finding::new(
                Severity::Warning,
                Category::Availability,
                format!("Frequent master changes in {log_name}"),
                format!("Found {} master role changes", summary.master_changes.len()),
            )
            .with_details(
                "Frequent master changes may indicate Galera node instability or network issues",
            ),
        );
    }

    if !summary.cluster_issues.is_empty() {
        output.finding(
            Finding::new(
                Severity::Critical,
                Category::Galera,
                format!("Cluster membership issues in {log_name}"),
                format!(
                    "Found {} 'no cluster members' events",
                    summary.cluster_issues.len()
                ),
            )
            .with_details("MaxScale lost visibility to cluster - all nodes were unavailable"),
        );
    }

    if summary.connection_errors.len() > 10 {
        output.finding(
            Finding::new(
                Severity::Warning,
                Category::Network,
                format!("Connection errors in {log_name}"),
                format!("Found {} connection errors", summary.connection_errors.len()),
            )
            .with_details("Check network connectivity between MaxScale and backend servers"),
        );
    }

    output.finding(
        Finding::new(
            Severity::Info,
            Category::General,
            format!("MaxScale log summary for {log_name}"),
            format!(
                "Total lines: {}, Errors: {}, Warnings: {}",
                summary.total_lines, summary.error_count, summary.warning_count
            ),
        )
        .with_details(format!(
            "Server down: {}, Server up: {}, Master changes: {}",
            summary.server_down_events.len(),
            summary.server_up_events.len(),
            summary.master_changes.len()
        )),
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes_first_match_wins() {
        let log = "\
2025-12-08 10:00:00   error  : [mariadbmon] Can't connect to server db2: protocol failure
2025-12-08 10:00:01   error  : (Galera-Monitor) There are no cluster members
2025-12-08 10:00:02   warning: slow backend
2025-12-08 10:00:03   notice : Server changed state: db1: master_down
2025-12-08 10:00:04   notice : Server changed state: db3: new_master
";
        let report = analyze_proxy_log(log, "proxy.log (mx1)");
        let summary = &report.summary;
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.connection_errors.len(), 1);
        assert!(summary.protocol_errors.is_empty());
        assert_eq!(summary.cluster_issues.len(), 1);
        assert_eq!(report.server_down_count(), 1);
        assert_eq!(summary.server_up_events.len(), 1);
        assert_eq!(report.master_change_count(), 1);

        let critical = report
            .output
            .findings
            .iter()
            .find(|f| f.severity == Severity::Critical)
            .unwrap();
        assert_eq!(critical.title, "Cluster membership issues in proxy.log (mx1)");
        assert_eq!(
            report.output.findings.last().unwrap().title,
            "MaxScale log summary for proxy.log (mx1)"
        );
    }

    #[test]
    fn test_frequent_master_changes() {
        let log = "notice : lost_master on db1\n".repeat(4);
        let report = analyze_proxy_log(&log, "p");
        assert!(
            report
                .output
                .findings
                .iter()
                .any(|f| f.title == "Frequent master changes in p")
        );
    }
}
