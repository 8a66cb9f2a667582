//! Colored terminal rendering.

use colored::*;

use crate::analyzer::comparison::ComparisonReport;
use crate::analyzer::logs::CombinedLogResult;
use crate::analyzer::orchestrator::TopologyDetection;
use crate::analyzer::sizing::{RiskLevel, SizingAction, SizingReport};
use crate::analyzer::types::{
    ClusterReviewResponse, Finding, Recommendation, Severity, format_ratio,
};

const WIDTH: usize = 78;

fn section(output: &mut String, title: &str) {
    let fill = WIDTH.saturating_sub(title.chars().count() + 5);
    output.push_str(&format!(
        "\n┌─ {} {}┐\n",
        title.bright_cyan().bold(),
        "─".repeat(fill)
    ));
}

fn row(output: &mut String, label: &str, value: impl std::fmt::Display) {
    output.push_str(&format!("{} {:<28} {}\n", "│".dimmed(), label, value));
}

fn wrapped(output: &mut String, text: &str, indent: &str) {
    let options = textwrap::Options::new(WIDTH)
        .initial_indent(indent)
        .subsequent_indent(indent);
    output.push_str(&textwrap::fill(text, options));
    output.push('\n');
}

fn severity_badge(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "✖ CRITICAL".red().bold(),
        Severity::Warning => "⚠ WARNING".yellow().bold(),
        Severity::Info => "ℹ INFO".blue(),
    }
}

fn yes_no(value: bool) -> ColoredString {
    if value { "yes".green() } else { "no".red() }
}

fn detected(value: bool) -> ColoredString {
    if value { "detected".red().bold() } else { "none".green() }
}

fn findings(output: &mut String, findings: &[Finding]) {
    for finding in findings {
        let node = finding
            .affected_node
            .as_deref()
            .map(|n| format!(" [{n}]"))
            .unwrap_or_default();
        output.push_str(&format!(
            "  {}  {}{} {}\n",
            severity_badge(finding.severity),
            finding.title.bold(),
            node.dimmed(),
            format!("({})", finding.category).dimmed()
        ));
        wrapped(output, &finding.description, "      ");
        if let Some(details) = &finding.details {
            wrapped(output, details, "      ");
        }
    }
}

fn recommendations(output: &mut String, recommendations: &[Recommendation]) {
    for rec in recommendations {
        let priority = format!("P{}", rec.priority);
        let priority = match rec.priority {
            1 => priority.red().bold(),
            2 => priority.yellow().bold(),
            _ => priority.normal(),
        };
        output.push_str(&format!(
            "  {}  {} {}\n",
            priority,
            rec.title.bold(),
            format!("({}, effort {})", rec.category, rec.effort).dimmed()
        ));
        wrapped(output, &rec.description, "      ");
        for line in rec.action.lines().filter(|l| !l.trim().is_empty()) {
            wrapped(output, line, "      → ");
        }
    }
}

pub(super) fn review(response: &ClusterReviewResponse) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {} {}\n",
        "▶".bright_blue(),
        "CLUSTER REVIEW".bright_white().bold(),
        response.cluster_name.bright_white()
    ));
    output.push_str(&format!("{}\n", "─".repeat(WIDTH).dimmed()));
    row(&mut output, "Topology", response.topology_type);
    row(&mut output, "Status", severity_badge(response.overall_status));
    row(&mut output, "Reviewed at", response.review_timestamp.to_rfc3339());
    wrapped(&mut output, &response.overall_summary, "  ");

    let arch = &response.architecture;
    section(&mut output, "ARCHITECTURE");
    row(&mut output, "Status", severity_badge(arch.status));
    row(&mut output, "Topology valid", yes_no(arch.topology_valid));
    row(&mut output, "Nodes", arch.node_count);
    row(&mut output, "HA capable", yes_no(arch.ha_capable));
    row(&mut output, "Quorum capable", yes_no(arch.quorum_capable));
    if let Some(healthy) = arch.proxy_healthy {
        row(&mut output, "Proxy healthy", yes_no(healthy));
    }
    wrapped(&mut output, &arch.summary, "  ");
    for note in &arch.architecture_recommendations {
        wrapped(&mut output, note, "  • ");
    }

    let capacity = &response.capacity;
    section(&mut output, "CAPACITY");
    row(&mut output, "Status", severity_badge(capacity.status));
    for (label, value) in [
        ("CPU", &capacity.cpu_assessment),
        ("Memory", &capacity.memory_assessment),
        ("Disk", &capacity.disk_assessment),
        ("Connections", &capacity.connection_assessment),
    ] {
        if let Some(value) = value {
            row(&mut output, label, value);
        }
    }
    wrapped(&mut output, &capacity.summary, "  ");

    let load = &response.load;
    section(&mut output, "LOAD");
    row(&mut output, "Queries/s", format!("{:.1}", load.total_queries_per_second));
    row(&mut output, "Reads/s", format!("{:.1}", load.total_reads_per_second));
    row(&mut output, "Writes/s", format!("{:.1}", load.total_writes_per_second));
    row(&mut output, "Read:write ratio", format_ratio(load.read_write_ratio));
    row(
        &mut output,
        "Connections (cur/peak/max)",
        format!(
            "{}/{}/{}",
            load.total_current_connections, load.peak_connections_used, load.total_max_connections
        ),
    );
    row(&mut output, "Slow queries/h", format!("{:.1}", load.slow_queries_per_hour));

    section(&mut output, "NODES");
    for node in &response.nodes {
        output.push_str(&format!(
            "  {}  {} {}\n",
            severity_badge(node.status),
            node.hostname.bold(),
            format!("({})", node.role).dimmed()
        ));
        for metric in node.metrics.iter().filter(|m| m.status != Severity::Info) {
            output.push_str(&format!(
                "      {} = {:.2}{} {}\n",
                metric.name, metric.value, metric.unit, metric.status
            ));
        }
    }

    if !response.findings.is_empty() {
        section(
            &mut output,
            &format!(
                "FINDINGS ({} critical, {} warning)",
                response.critical_count(),
                response.warning_count()
            ),
        );
        findings(&mut output, &response.findings);
    }
    if !response.recommendations.is_empty() {
        section(&mut output, "RECOMMENDATIONS");
        recommendations(&mut output, &response.recommendations);
    }
    output
}

pub(super) fn logs(result: &CombinedLogResult) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {}\n",
        "▶".bright_blue(),
        "LOG ANALYSIS".bright_white().bold()
    ));
    output.push_str(&format!("{}\n", "─".repeat(WIDTH).dimmed()));
    let s = &result.summary;
    row(&mut output, "Critical findings", s.total_critical_issues);
    row(&mut output, "Warnings", s.total_warnings);
    row(&mut output, "Disk issues", detected(s.disk_issues_detected));
    row(&mut output, "Inconsistency", detected(s.inconsistency_detected));
    row(&mut output, "Frequent SST", detected(s.frequent_sst));
    row(&mut output, "Cluster instability", detected(s.cluster_instability));

    for (node, report) in &result.mariadb_logs {
        section(&mut output, &format!("SERVER LOG {node}"));
        row(&mut output, "Lines", report.summary.total_lines);
        row(&mut output, "Errors / warnings", format!(
            "{} / {}",
            report.summary.error_count, report.summary.warning_count
        ));
        row(&mut output, "Critical events", report.critical_issues());
        row(&mut output, "SST / IST", format!("{} / {}", report.sst_count(), report.ist_count()));
    }
    for (node, report) in &result.proxy_logs {
        section(&mut output, &format!("PROXY LOG {node}"));
        row(&mut output, "Lines", report.summary.total_lines);
        row(&mut output, "Server down events", report.server_down_count());
        row(&mut output, "Master changes", report.master_change_count());
    }
    for (node, report) in &result.slow_query_logs {
        section(&mut output, &format!("SLOW QUERY LOG {node}"));
        row(&mut output, "Queries", report.summary.total_queries);
        row(&mut output, "Max query time", format!("{:.2}s", report.summary.max_query_time));
        row(&mut output, "Avg query time", format!("{:.2}s", report.summary.avg_query_time));
    }

    if !result.timeline.is_empty() {
        section(&mut output, "CRITICAL TIMELINE");
        for entry in &result.timeline {
            output.push_str(&format!(
                "  {:<19}  {:<10} {:<18} {}\n",
                entry.timestamp.as_deref().unwrap_or("-"),
                entry.node,
                entry.kind.to_string().red(),
                entry.message.chars().take(60).collect::<String>()
            ));
        }
    }
    if !result.combined_findings.is_empty() {
        section(&mut output, "FINDINGS");
        findings(&mut output, &result.combined_findings);
    }
    if !result.combined_recommendations.is_empty() {
        section(&mut output, "RECOMMENDATIONS");
        recommendations(&mut output, &result.combined_recommendations);
    }
    output
}

pub(super) fn comparison(report: &ComparisonReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {} {}\n",
        "▶".bright_blue(),
        "TOPOLOGY COMPARISON".bright_white().bold(),
        format!("(current: {})", report.current_topology).dimmed()
    ));
    let w = &report.workload_characteristics;
    section(&mut output, "WORKLOAD");
    row(&mut output, "Queries/s", format!("{:.1}", w.total_qps));
    row(&mut output, "Writes/s", format!("{:.1}", w.writes_per_second));
    row(&mut output, "Read:write ratio", format_ratio(w.read_write_ratio));
    row(&mut output, "Certification failures", w.certification_failures);
    row(&mut output, "Flow control issues", w.flow_control_issues);

    section(&mut output, "CANDIDATES");
    for option in &report.topology_comparison {
        let score = format!("{:>3}", option.score);
        let score = if option.suitable { score.green() } else { score.red() };
        output.push_str(&format!(
            "  {}  {} {}\n",
            score,
            option.topology.bold(),
            if option.suitable { "suitable".green() } else { "not suitable".red() }
        ));
        for note in &option.notes {
            wrapped(&mut output, note, "      • ");
        }
    }

    section(&mut output, "LATENCY");
    for profile in &report.latency_comparison {
        output.push_str(&format!(
            "  {:<18} {:<16} {:<18} {}\n",
            profile.topology,
            profile.same_dc_write_latency,
            profile.cross_dc_write_latency,
            profile.note.dimmed()
        ));
    }

    let dc = &report.multi_dc_considerations;
    section(&mut output, "MULTI-DATACENTER");
    wrapped(&mut output, &dc.galera_quorum_rule, "  ");
    for layout in &dc.layouts {
        output.push_str(&format!(
            "  {:<28} DC1 loss: {:<24} DC2 loss: {}\n",
            layout.nodes, layout.dc1_loss, layout.dc2_loss
        ));
    }
    wrapped(&mut output, &dc.warning, "  ⚠ ");

    if let Some(recommendation) = &report.recommendation {
        section(&mut output, "RECOMMENDATION");
        wrapped(&mut output, recommendation, "  ");
    }
    output
}

pub(super) fn sizing(report: &SizingReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {}\n",
        "▶".bright_blue(),
        "SIZING".bright_white().bold()
    ));
    let c = &report.current_sizing;
    section(&mut output, "CURRENT");
    row(&mut output, "Nodes", c.node_count);
    row(&mut output, "vCPUs (total / per node)", format!("{} / {:.1}", c.total_vcpus, c.vcpus_per_node));
    row(&mut output, "RAM GB (total / per node)", format!("{:.1} / {:.1}", c.total_ram_gb, c.ram_per_node_gb));
    row(&mut output, "Disk GB (total)", format!("{:.1}", c.total_disk_gb));

    let u = &report.utilization;
    section(&mut output, "UTILIZATION");
    row(&mut output, "Connection utilization", format!("{:.1}%", u.avg_connection_utilization_pct));
    row(
        &mut output,
        "CPU utilization",
        u.avg_cpu_utilization_pct
            .map(|v| format!("{v:.1}%"))
            .unwrap_or_else(|| "n/a".to_string()),
    );
    row(&mut output, "Peak connections", u.peak_connections_cluster);
    row(&mut output, "Cluster QPS", format!("{:.1}", u.total_qps_cluster));

    if !report.per_node_sizing_recommendations.is_empty() {
        section(&mut output, "PER NODE");
        for rec in &report.per_node_sizing_recommendations {
            let action = match rec.action {
                SizingAction::Keep => rec.action.to_string().green(),
                SizingAction::ScaleDown => rec.action.to_string().yellow(),
                SizingAction::ScaleUp => rec.action.to_string().red(),
            };
            output.push_str(&format!(
                "  {:<16} {:>3} vCPU {:>6.1} GB  →  {:>3} vCPU {:>6.1} GB  {}\n",
                rec.hostname,
                rec.current_vcpus,
                rec.current_ram_gb,
                rec.recommended_vcpus,
                rec.recommended_ram_gb,
                action
            ));
            for reason in &rec.rationale {
                wrapped(&mut output, reason, "      • ");
            }
        }
    }

    let consistency = &report.resource_consistency;
    section(&mut output, "RESOURCE CONSISTENCY");
    row(&mut output, "Consistent", yes_no(consistency.is_consistent));
    for issue in &consistency.inconsistencies {
        output.push_str(&format!("  {}  {}\n", severity_badge(issue.severity), issue.message));
    }
    wrapped(&mut output, &consistency.recommendation, "  ");

    section(&mut output, "OPTIONS");
    for option in &report.rightsizing_options {
        let risk = match option.risk_level {
            RiskLevel::Low => option.risk_level.to_string().green(),
            RiskLevel::Medium => option.risk_level.to_string().yellow(),
            RiskLevel::High | RiskLevel::Critical => option.risk_level.to_string().red().bold(),
        };
        output.push_str(&format!(
            "  {:<28} nodes {:<3} cost x{:<5.2} risk {}\n",
            option.option.bold(),
            option.node_count,
            option.cost_factor,
            risk
        ));
        wrapped(&mut output, &option.notes, "      ");
        if let Some(behavior) = &option.dc_failure_behavior {
            wrapped(&mut output, behavior, "      ");
        }
    }
    wrapped(&mut output, &report.cost_impact, "  ");
    output
}

pub(super) fn detection(detection: &TopologyDetection) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {} {} {}\n",
        "▶".bright_blue(),
        "DETECTED TOPOLOGY".bright_white().bold(),
        detection.topology.to_string().green().bold(),
        format!("({} confidence)", detection.confidence).dimmed()
    ));
    for indicator in &detection.indicators {
        output.push_str(&format!("  {} {}\n", "•".dimmed(), indicator));
    }
    if detection.indicators.is_empty() {
        output.push_str(&format!("  {}\n", "no topology indicators found".dimmed()));
    }
    output
}
