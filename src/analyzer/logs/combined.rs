//! Multi-node, multi-source log analysis.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::mariadb::{MariaDbLogReport, analyze_mariadb_log};
use super::proxy::{ProxyLogReport, analyze_proxy_log};
use super::slow_query::{SlowQueryReport, analyze_slow_query_log};
use super::types::{EventKind, LogEvent};
use crate::analyzer::input::ClusterReviewRequest;
use crate::analyzer::types::{Finding, Recommendation, Severity};

/// Raw log text keyed by node name, per log source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogAnalysisInput {
    #[serde(default)]
    pub mariadb_logs: BTreeMap<String, String>,
    #[serde(default, alias = "maxscale_logs")]
    pub proxy_logs: BTreeMap<String, String>,
    #[serde(default)]
    pub slow_query_logs: BTreeMap<String, String>,
}

impl LogAnalysisInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the logs embedded in a review request.
    pub fn from_request(request: &ClusterReviewRequest) -> Self {
        let mut input = Self::new();
        for node in &request.nodes {
            if let Some(text) = &node.error_log {
                input.mariadb_logs.insert(node.hostname.clone(), text.clone());
            }
            if let Some(text) = &node.slow_log {
                input.slow_query_logs.insert(node.hostname.clone(), text.clone());
            }
        }
        if let Some(logs) = request.active_proxy().and_then(|p| p.logs.as_ref()) {
            input.proxy_logs.extend(logs.clone());
        }
        input
    }

    pub fn is_empty(&self) -> bool {
        self.mariadb_logs.is_empty() && self.proxy_logs.is_empty() && self.slow_query_logs.is_empty()
    }
}

/// Cluster-wide flags derived from every log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedLogSummary {
    pub total_critical_issues: usize,
    pub total_warnings: usize,
    pub disk_issues_detected: bool,
    pub inconsistency_detected: bool,
    pub frequent_sst: bool,
    pub cluster_instability: bool,
}

/// A critical server-log event placed on the cross-node timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub node: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedLogResult {
    pub mariadb_logs: BTreeMap<String, MariaDbLogReport>,
    pub proxy_logs: BTreeMap<String, ProxyLogReport>,
    pub slow_query_logs: BTreeMap<String, SlowQueryReport>,
    pub combined_findings: Vec<Finding>,
    pub combined_recommendations: Vec<Recommendation>,
    pub summary: CombinedLogSummary,
    pub timeline: Vec<TimelineEntry>,
}

fn classify_all<R, F>(logs: &BTreeMap<String, String>, source: &str, analyze: F) -> Vec<(String, R)>
where
    R: Send,
    F: Fn(&str, &str) -> R + Sync,
{
    logs.par_iter()
        .map(|(node, text)| {
            let name = format!("{source} ({node})");
            (node.clone(), analyze(text.as_str(), &name))
        })
        .collect()
}

/// Classify every log in `input` and merge the results.
pub fn analyze_logs(input: &LogAnalysisInput) -> CombinedLogResult {
    log::info!(
        "Analyzing logs: {} server, {} proxy, {} slow query",
        input.mariadb_logs.len(),
        input.proxy_logs.len(),
        input.slow_query_logs.len()
    );

    let mut result = CombinedLogResult::default();
    let mut timeline: Vec<(TimelineEntry, usize)> = Vec::new();

    for (node, report) in classify_all(&input.mariadb_logs, "mariadb.log", analyze_mariadb_log) {
        let summary = &mut result.summary;
        summary.disk_issues_detected |= report.disk_issue_count() > 0;
        summary.inconsistency_detected |= report.inconsistency_count() > 0;
        summary.frequent_sst |= report.sst_count() > 3;

        for event in &report.summary.critical_events {
            if let Some(kind) = event.kind {
                let index = timeline.len();
                timeline.push((timeline_entry(&node, kind, event), index));
            }
        }
        result.combined_findings.extend(report.output.findings.iter().cloned());
        result
            .combined_recommendations
            .extend(report.output.recommendations.iter().cloned());
        result.mariadb_logs.insert(node, report);
    }

    for (node, report) in classify_all(&input.proxy_logs, "proxy.log", analyze_proxy_log) {
        result.summary.cluster_instability |= report.master_change_count() > 3;
        result.combined_findings.extend(report.output.findings.iter().cloned());
        result
            .combined_recommendations
            .extend(report.output.recommendations.iter().cloned());
        result.proxy_logs.insert(node, report);
    }

    for (node, report) in classify_all(&input.slow_query_logs, "slow_query.log", analyze_slow_query_log) {
        result.combined_findings.extend(report.output.findings.iter().cloned());
        result
            .combined_recommendations
            .extend(report.output.recommendations.iter().cloned());
        result.slow_query_logs.insert(node, report);
    }

    result.summary.total_critical_issues = result
        .combined_findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    result.summary.total_warnings = result
        .combined_findings
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .count();

    // Untimestamped events sort last; ties keep input order.
    timeline.sort_by_cached_key(|(entry, index)| {
        let parsed = entry.timestamp.as_deref().and_then(super::types::parse_timestamp);
        (parsed.is_none(), parsed, *index)
    });
    result.timeline = timeline.into_iter().map(|(entry, _)| entry).collect();

    log::info!(
        "Log analysis finished: {} critical, {} warnings",
        result.summary.total_critical_issues,
        result.summary.total_warnings
    );
    result
}

fn timeline_entry(node: &str, kind: EventKind, event: &LogEvent) -> TimelineEntry {
    TimelineEntry {
        node: node.to_string(),
        kind,
        timestamp: event.timestamp.clone(),
        message: event.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::{NodeRole, NodeSnapshot, ProxyConfig, TopologyType};

    fn input() -> LogAnalysisInput {
        let mut input = LogAnalysisInput::new();
        input.mariadb_logs.insert(
            "db2".to_string(),
            "251208 12:00:00 [ERROR] mysqld got signal 11\n[ERROR] Table 't' is full".to_string(),
        );
        input.mariadb_logs.insert(
            "db1".to_string(),
            "2025-12-08 11:00:00 0 [ERROR] WSREP: Inconsistent data, voted out".to_string(),
        );
        input
            .proxy_logs
            .insert("mx1".to_string(), "notice : lost_master\n".repeat(4));
        input.slow_query_logs.insert(
            "db1".to_string(),
            "# Query_time: 61.0  Lock_time: 0.0 Rows_sent: 1  Rows_examined: 1".to_string(),
        );
        input
    }

    #[test]
    fn test_flags_and_counts() {
        let result = analyze_logs(&input());
        assert!(result.summary.disk_issues_detected);
        assert!(result.summary.inconsistency_detected);
        assert!(!result.summary.frequent_sst);
        assert!(result.summary.cluster_instability);
        assert_eq!(
            result.mariadb_logs.keys().collect::<Vec<_>>(),
            vec!["db1", "db2"]
        );
        assert_eq!(result.mariadb_logs["db1"].log_name, "mariadb.log (db1)");
        assert_eq!(result.proxy_logs["mx1"].log_name, "proxy.log (mx1)");
        let critical = result
            .combined_findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();
        assert_eq!(result.summary.total_critical_issues, critical);
        assert!(result.summary.total_warnings >= 2);
    }

    #[test]
    fn test_timeline_ordered_by_time_untimed_last() {
        let result = analyze_logs(&input());
        let kinds: Vec<(&str, EventKind)> = result
            .timeline
            .iter()
            .map(|e| (e.node.as_str(), e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("db1", EventKind::Inconsistency),
                ("db2", EventKind::Crash),
                ("db2", EventKind::DiskFull),
            ]
        );
        assert!(result.timeline[2].timestamp.is_none());
    }

    #[test]
    fn test_from_request_collects_embedded_logs() {
        let mut node = NodeSnapshot::new("db1", NodeRole::Standalone);
        node.error_log = Some("[ERROR] x".to_string());
        node.slow_log = Some("# Query_time: 1.0".to_string());
        let mut logs = BTreeMap::new();
        logs.insert("mx1".to_string(), "notice : ok".to_string());
        let proxy = ProxyConfig {
            logs: Some(logs),
            ..ProxyConfig::default()
        };
        let request = ClusterReviewRequest::new("c", TopologyType::Standalone, vec![node])
            .with_proxy(proxy);
        let input = LogAnalysisInput::from_request(&request);
        assert_eq!(input.mariadb_logs["db1"], "[ERROR] x");
        assert_eq!(input.slow_query_logs["db1"], "# Query_time: 1.0");
        assert_eq!(input.proxy_logs["mx1"], "notice : ok");
        assert!(!input.is_empty());
    }

    #[test]
    fn test_maxscale_alias_accepted() {
        let input: LogAnalysisInput =
            serde_json::from_str(r#"{"maxscale_logs": {"mx1": "error: x"}}"#).unwrap();
        assert_eq!(input.proxy_logs.len(), 1);
        assert!(input.mariadb_logs.is_empty());
    }
}
