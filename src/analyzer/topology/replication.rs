//! Asynchronous master-replica replication.
//!
//! The node and architecture checks here are reused by the semi-sync
//! analyzer, which layers its own checks on top.

use super::{TopologyReview, analyze_nodes};
use crate::analyzer::base::BaseAnalyzer;
use crate::analyzer::input::{ClusterReviewRequest, NodeRole, NodeSnapshot, TopologyType};
use crate::analyzer::metrics;
use crate::analyzer::types::{
    ArchitectureAssessment, Category, Effort, Finding, NodeAnalysis, Recommendation,
    ReviewFindings, Severity,
};

pub(super) fn analyze(base: &BaseAnalyzer<'_>, request: &ClusterReviewRequest) -> TopologyReview {
    let mut output = ReviewFindings::new();
    let nodes = analyze_nodes(request, &mut output, |node| analyze_node(base, node));
    let architecture = analyze_architecture(request, &mut output);
    let capacity = base.analyze_capacity(request);
    let load = base.analyze_load(request);

    recommend(&architecture, &mut output);

    let mut insights = base.key_insights(request, &architecture, &capacity, &load);
    insights.insert("galera_required", false);
    insights.insert("replication_lag_seconds", architecture.replication_lag_seconds);
    insights.insert("replication_healthy", architecture.replication_healthy);
    if architecture.replication_lag_seconds.is_some_and(|lag| lag > 10.0) {
        insights.insert("consider_semi_sync", true);
    }

    TopologyReview {
        nodes,
        architecture,
        capacity,
        load,
        output,
        insights,
    }
}

/// Base performance plus replica thread and lag checks.
pub(super) fn analyze_node(base: &BaseAnalyzer<'_>, node: &NodeSnapshot) -> NodeAnalysis {
    let mut analysis = base.analyze_node_performance(node);
    if node.role != NodeRole::Replica || node.slave_status.is_none() {
        return analysis;
    }

    let (io_running, sql_running) = metrics::replication_threads_running(node);
    let lag = metrics::replication_lag(node);
    analysis.slave_io_running = Some(io_running);
    analysis.slave_sql_running = Some(sql_running);
    analysis.seconds_behind_master = lag;

    if !io_running || !sql_running {
        let mut stopped = Vec::new();
        if !io_running {
            stopped.push("IO thread stopped");
        }
        if !sql_running {
            stopped.push("SQL thread stopped");
        }
        analysis.flag(
            Finding::new(
                Severity::Critical,
                Category::Replication,
                "Replication stopped",
                format!("Replication issues: {}", stopped.join(", ")),
            )
            .with_node(&node.hostname),
        );
    } else if let Some(lag) = lag {
        let tier = &base.thresholds().replication.seconds_behind_master;
        let level = tier.evaluate_high(lag);
        if level != Severity::Info {
            let threshold = match level {
                Severity::Critical => tier.critical_or(300.0),
                _ => tier.warning_or(30.0),
            };
            analysis.flag(
                Finding::new(
                    level,
                    Category::Replication,
                    format!("Replication lag {level}"),
                    format!("Replica is {lag} seconds behind master"),
                )
                .with_metric("Seconds_Behind_Master", lag)
                .with_threshold(threshold)
                .with_node(&node.hostname),
            );
        }
    }
    analysis
}

/// Validate master/replica roles and replica health.
pub(super) fn analyze_architecture(
    request: &ClusterReviewRequest,
    output: &mut ReviewFindings,
) -> ArchitectureAssessment {
    let masters: Vec<&NodeSnapshot> = request
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::Master)
        .collect();
    let replicas: Vec<&NodeSnapshot> = request
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::Replica)
        .collect();

    let mut arch = ArchitectureAssessment::new(TopologyType::MasterReplica, request.nodes.len());
    arch.proxy_present = request.active_proxy().is_some();
    arch.summary = format!(
        "Master-replica with {} master(s) and {} replica(s)",
        masters.len(),
        replicas.len()
    );

    if masters.len() != 1 {
        arch.topology_valid = false;
        arch.status.escalate(Severity::Critical);
        let message = format!("Expected 1 master, found {}", masters.len());
        output.finding(Finding::new(
            Severity::Critical,
            Category::Replication,
            "Invalid master count",
            message.clone(),
        ));
        arch.architecture_recommendations.push(message);
    }

    if replicas.is_empty() {
        arch.status.escalate(Severity::Warning);
        let message = "No replicas found - no read scaling or failover capability";
        output.finding(Finding::new(
            Severity::Warning,
            Category::Availability,
            "No replicas",
            message,
        ));
        arch.architecture_recommendations.push(message.to_string());
    }

    let mut healthy = true;
    let mut max_lag: f64 = 0.0;
    for replica in replicas.iter().filter(|r| r.slave_status.is_some()) {
        let (io, sql) = metrics::replication_threads_running(replica);
        healthy &= io && sql;
        if let Some(lag) = metrics::replication_lag(replica) {
            max_lag = max_lag.max(lag);
        }
    }

    if !healthy {
        arch.status.escalate(Severity::Critical);
        arch.architecture_recommendations
            .push("One or more replicas have stopped replication".to_string());
    }

    arch.replication_healthy = Some(healthy);
    arch.replication_lag_seconds = (max_lag > 0.0).then_some(max_lag);
    arch.ha_capable = !replicas.is_empty();

    if max_lag > 30.0 {
        arch.consider_alternatives
            .push("semi_sync - For guaranteed replication with minimal lag".to_string());
    }
    if replicas.len() >= 2 {
        arch.consider_alternatives
            .push("galera - For automatic failover without manual promotion".to_string());
    }
    arch
}

/// Recommendations shared with semi-sync.
pub(super) fn recommend(architecture: &ArchitectureAssessment, output: &mut ReviewFindings) {
    if let Some(lag) = architecture.replication_lag_seconds.filter(|l| *l > 30.0) {
        output.recommend(
            Recommendation::new(
                1,
                Category::Replication,
                "Address replication lag",
                format!("Replicas are {lag}s behind master"),
            )
            .with_action(
                "Investigate slow queries on replicas, network issues, or consider semi-sync",
            )
            .with_impact("Reduced data loss risk and better read consistency")
            .with_effort(Effort::Medium),
        );
    }

    if architecture.replication_healthy == Some(false) {
        output.recommend(
            Recommendation::new(
                1,
                Category::Replication,
                "Fix stopped replication",
                "One or more replicas have stopped replicating",
            )
            .with_action("Check SHOW SLAVE STATUS for errors and restart replication")
            .with_impact("Restore HA capability and data consistency")
            .with_effort(Effort::Low)
            .with_related("Replication stopped"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::VarMap;
    use crate::analyzer::thresholds::Thresholds;
    use crate::analyzer::topology::TopologyAnalyzer;
    use crate::analyzer::topology::test_support::healthy_node;

    fn replica(host: &str, io: &str, sql: &str, lag: &str) -> NodeSnapshot {
        let mut node = healthy_node(host, NodeRole::Replica);
        node.slave_status = Some(
            VarMap::new()
                .with("Slave_IO_Running", io)
                .with("Slave_SQL_Running", sql)
                .with("Seconds_Behind_Master", lag),
        );
        node
    }

    fn request(nodes: Vec<NodeSnapshot>) -> ClusterReviewRequest {
        ClusterReviewRequest::new("repl", TopologyType::MasterReplica, nodes)
    }

    #[test]
    fn test_io_thread_stopped_is_critical() {
        let req = request(vec![
            healthy_node("m1", NodeRole::Master),
            replica("r1", "No", "Yes", "0"),
        ]);
        let response = TopologyAnalyzer::Replication.analyze(&req, &Thresholds::default());
        let r1 = response.nodes.iter().find(|n| n.hostname == "r1").unwrap();
        assert_eq!(r1.status, Severity::Critical);
        assert_eq!(r1.slave_io_running, Some(false));
        assert!(response.findings.iter().any(|f| {
            f.severity == Severity::Critical
                && f.category == Category::Replication
                && f.affected_node.as_deref() == Some("r1")
        }));
        assert_eq!(response.architecture.replication_healthy, Some(false));
        assert_eq!(response.overall_status, Severity::Critical);
        assert!(
            response
                .recommendations
                .iter()
                .any(|r| r.title == "Fix stopped replication")
        );
    }

    #[test]
    fn test_lag_levels() {
        let thresholds = Thresholds::default();
        let base = BaseAnalyzer::new(&thresholds);
        let warn = analyze_node(&base, &replica("r1", "Yes", "Yes", "45"));
        assert_eq!(warn.status, Severity::Warning);
        assert_eq!(warn.findings[0].title, "Replication lag warning");

        let crit = analyze_node(&base, &replica("r2", "Yes", "Yes", "300"));
        assert_eq!(crit.status, Severity::Critical);
        assert_eq!(crit.findings[0].title, "Replication lag critical");

        let unknown = analyze_node(&base, &replica("r3", "Yes", "Yes", "NULL"));
        assert_eq!(unknown.status, Severity::Info);
        assert_eq!(unknown.seconds_behind_master, None);
    }

    #[test]
    fn test_two_masters_invalid() {
        let req = request(vec![
            healthy_node("m1", NodeRole::Master),
            healthy_node("m2", NodeRole::Master),
            replica("r1", "Yes", "Yes", "0"),
        ]);
        let mut output = ReviewFindings::new();
        let arch = analyze_architecture(&req, &mut output);
        assert!(!arch.topology_valid);
        assert_eq!(arch.status, Severity::Critical);
        assert_eq!(output.count(Severity::Critical), 1);
    }

    #[test]
    fn test_no_replicas_keeps_critical_status() {
        let req = request(vec![
            healthy_node("m1", NodeRole::Master),
            healthy_node("m2", NodeRole::Master),
        ]);
        let mut output = ReviewFindings::new();
        let arch = analyze_architecture(&req, &mut output);
        assert_eq!(arch.status, Severity::Critical);
        assert!(!arch.ha_capable);
    }

    #[test]
    fn test_lag_recommendation_and_insight() {
        let req = request(vec![
            healthy_node("m1", NodeRole::Master),
            replica("r1", "Yes", "Yes", "120"),
            replica("r2", "Yes", "Yes", "5"),
        ]);
        let response = TopologyAnalyzer::Replication.analyze(&req, &Thresholds::default());
        assert_eq!(response.architecture.replication_lag_seconds, Some(120.0));
        assert_eq!(response.key_insights.get_bool("consider_semi_sync"), Some(true));
        assert!(
            response
                .recommendations
                .iter()
                .any(|r| r.title == "Address replication lag")
        );
        assert_eq!(response.architecture.consider_alternatives.len(), 2);
    }
}
