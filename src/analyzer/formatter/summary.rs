//! Plain-text digests.

use crate::analyzer::comparison::ComparisonReport;
use crate::analyzer::logs::CombinedLogResult;
use crate::analyzer::orchestrator::TopologyDetection;
use crate::analyzer::sizing::SizingReport;
use crate::analyzer::types::{ClusterReviewResponse, Severity};

pub(super) fn review(response: &ClusterReviewResponse) -> String {
    let mut output = format!(
        "Cluster {} ({}): {}\n{}\n",
        response.cluster_name,
        response.topology_type,
        response.overall_status.as_str().to_uppercase(),
        response.overall_summary
    );
    output.push_str(&format!(
        "Findings: {} ({} critical, {} warning), recommendations: {}\n",
        response.findings.len(),
        response.critical_count(),
        response.warning_count(),
        response.recommendations.len()
    ));
    for finding in response.findings.iter().filter(|f| f.severity != Severity::Info) {
        output.push_str(&format!(
            "- [{}] {}\n",
            finding.severity.as_str().to_uppercase(),
            finding.title
        ));
    }
    for rec in response.recommendations.iter().take(5) {
        output.push_str(&format!("* P{} {}\n", rec.priority, rec.title));
    }
    output
}

pub(super) fn logs(result: &CombinedLogResult) -> String {
    let s = &result.summary;
    let mut output = format!(
        "Logs analyzed: {} server, {} proxy, {} slow query\n",
        result.mariadb_logs.len(),
        result.proxy_logs.len(),
        result.slow_query_logs.len()
    );
    output.push_str(&format!(
        "Critical: {}, warnings: {}\n",
        s.total_critical_issues, s.total_warnings
    ));
    let flags: Vec<&str> = [
        (s.disk_issues_detected, "disk issues"),
        (s.inconsistency_detected, "inconsistency"),
        (s.frequent_sst, "frequent SST"),
        (s.cluster_instability, "cluster instability"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();
    if !flags.is_empty() {
        output.push_str(&format!("Detected: {}\n", flags.join(", ")));
    }
    if let Some(first) = result.timeline.first() {
        output.push_str(&format!(
            "First critical event: {} {} on {}\n",
            first.timestamp.as_deref().unwrap_or("(no timestamp)"),
            first.kind,
            first.node
        ));
    }
    output
}

pub(super) fn comparison(report: &ComparisonReport) -> String {
    let mut output = format!("Current topology: {}\n", report.current_topology);
    for option in &report.topology_comparison {
        output.push_str(&format!(
            "- {}: {} ({})\n",
            option.topology,
            option.score,
            if option.suitable { "suitable" } else { "not suitable" }
        ));
    }
    if let Some(recommendation) = &report.recommendation {
        output.push_str(recommendation);
        output.push('\n');
    }
    output
}

pub(super) fn sizing(report: &SizingReport) -> String {
    let c = &report.current_sizing;
    let mut output = format!(
        "{} nodes, {} vCPU, {:.1} GB RAM total\n",
        c.node_count, c.total_vcpus, c.total_ram_gb
    );
    output.push_str(&format!(
        "Resources consistent: {}\n",
        if report.resource_consistency.is_consistent { "yes" } else { "no" }
    ));
    for option in &report.rightsizing_options {
        output.push_str(&format!(
            "- {}: {} nodes, cost x{:.2}, risk {}\n",
            option.option, option.node_count, option.cost_factor, option.risk_level
        ));
    }
    output.push_str(&report.cost_impact);
    output.push('\n');
    output
}

pub(super) fn detection(detection: &TopologyDetection) -> String {
    format!(
        "{} ({} confidence, {} indicators)\n",
        detection.topology,
        detection.confidence,
        detection.indicators.len()
    )
}
