//! Semi-synchronous replication.
//!
//! Runs the replication checks first, then verifies that semi-sync is
//! enabled, active and acknowledged by every replica.

use super::{TopologyReview, analyze_nodes, replication};
use crate::analyzer::base::BaseAnalyzer;
use crate::analyzer::input::{ClusterReviewRequest, NodeRole, TopologyType};
use crate::analyzer::metrics;
use crate::analyzer::types::{
    ArchitectureAssessment, Category, Effort, Finding, Recommendation, ReviewFindings, Severity,
};

pub(super) fn analyze(base: &BaseAnalyzer<'_>, request: &ClusterReviewRequest) -> TopologyReview {
    let mut output = ReviewFindings::new();
    let nodes = analyze_nodes(request, &mut output, |node| {
        replication::analyze_node(base, node)
    });
    let architecture = analyze_architecture(request, &mut output);
    let capacity = base.analyze_capacity(request);
    let load = base.analyze_load(request);

    replication::recommend(&architecture, &mut output);

    if !architecture.topology_valid {
        output.recommend(
            Recommendation::new(
                1,
                Category::Replication,
                "Enable semi-synchronous replication",
                "Semi-sync configuration appears incomplete",
            )
            .with_action(
                "Enable rpl_semi_sync_master_enabled on master and rpl_semi_sync_slave_enabled on replicas",
            )
            .with_impact("Guaranteed replication before commit acknowledgment")
            .with_effort(Effort::Low),
        );
    }

    if let Some(master) = request.nodes.iter().find(|n| n.role == NodeRole::Master) {
        let write_rate = metrics::writes_per_second(master);
        if write_rate > 1000.0 {
            output.recommend(
                Recommendation::new(
                    3,
                    Category::Availability,
                    "Consider Galera for high write workloads",
                    format!(
                        "High write rate ({write_rate:.1}/sec) may benefit from Galera's parallel apply"
                    ),
                )
                .with_action("Evaluate Galera cluster for multi-master capability")
                .with_impact("Better write distribution and automatic failover")
                .with_effort(Effort::High),
            );
        }
    }

    let mut insights = base.key_insights(request, &architecture, &capacity, &load);
    insights.insert("semi_sync_enabled", architecture.topology_valid);
    insights.insert("galera_required", false);
    insights.insert("replication_lag_seconds", architecture.replication_lag_seconds);
    insights.insert("replication_healthy", architecture.replication_healthy);
    insights.insert("consider_galera", load.total_writes_per_second > 500.0);

    TopologyReview {
        nodes,
        architecture,
        capacity,
        load,
        output,
        insights,
    }
}

fn analyze_architecture(
    request: &ClusterReviewRequest,
    output: &mut ReviewFindings,
) -> ArchitectureAssessment {
    let mut arch = replication::analyze_architecture(request, output);
    arch.topology_type = TopologyType::SemiSync;

    let replica_count = request
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::Replica)
        .count();
    let mut enabled = false;
    let mut semi_sync_healthy = true;

    for master in request.nodes.iter().filter(|n| n.role == NodeRole::Master) {
        if !master.variable_enabled("rpl_semi_sync_master_enabled") {
            continue;
        }
        enabled = true;

        let active = master
            .status_str("Rpl_semi_sync_master_status")
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("ON"));
        if !active {
            semi_sync_healthy = false;
            arch.architecture_recommendations.push(
                "Semi-sync master status is OFF - may have fallen back to async".to_string(),
            );
            output.finding(
                Finding::new(
                    Severity::Warning,
                    Category::Replication,
                    "Semi-sync inactive",
                    "Semi-sync is enabled but the master reports it as OFF",
                )
                .with_node(&master.hostname),
            );
        }

        let timeout = master.variable_int("rpl_semi_sync_master_timeout", 10_000);
        if timeout < 1000 {
            arch.architecture_recommendations.push(format!(
                "Semi-sync timeout is low ({timeout}ms) - may cause frequent async fallback"
            ));
        }

        let clients = master.status_int("Rpl_semi_sync_master_clients", 0);
        if clients < replica_count as i64 {
            arch.architecture_recommendations.push(format!(
                "Only {clients} of {replica_count} replicas connected with semi-sync"
            ));
        }
    }

    if !enabled {
        arch.status.escalate(Severity::Warning);
        arch.architecture_recommendations
            .push("Semi-sync does not appear to be enabled on master".to_string());
        output.finding(Finding::new(
            Severity::Warning,
            Category::Replication,
            "Semi-sync not enabled",
            "rpl_semi_sync_master_enabled is not ON on the master",
        ));
    }

    for replica in request
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::Replica)
    {
        if !replica.variable_enabled("rpl_semi_sync_slave_enabled") {
            arch.architecture_recommendations.push(format!(
                "Replica {} does not have semi-sync enabled",
                replica.hostname
            ));
        }
    }

    let masters = request
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::Master)
        .count();
    arch.summary = format!(
        "Semi-sync replication with {masters} master(s) and {replica_count} replica(s)"
    );
    arch.topology_valid = arch.topology_valid && enabled;
    arch.ha_capable = replica_count >= 1 && semi_sync_healthy;
    arch.replication_healthy = Some(arch.replication_healthy.unwrap_or(true) && semi_sync_healthy);
    arch.consider_alternatives = if replica_count >= 2 {
        vec!["galera - For fully synchronous replication and automatic failover".to_string()]
    } else {
        Vec::new()
    };
    arch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::{NodeSnapshot, VarMap};
    use crate::analyzer::thresholds::Thresholds;
    use crate::analyzer::topology::TopologyAnalyzer;
    use crate::analyzer::topology::test_support::healthy_node;

    fn master(enabled: &str, status: &str, clients: i64) -> NodeSnapshot {
        let mut node = healthy_node("m1", NodeRole::Master);
        node.global_variables.insert("rpl_semi_sync_master_enabled", enabled);
        node.global_status.insert("Rpl_semi_sync_master_status", status);
        node.global_status.insert("Rpl_semi_sync_master_clients", clients);
        node
    }

    fn replica(host: &str, semi: &str) -> NodeSnapshot {
        let mut node = healthy_node(host, NodeRole::Replica);
        node.global_variables.insert("rpl_semi_sync_slave_enabled", semi);
        node.slave_status = Some(
            VarMap::new()
                .with("Slave_IO_Running", "Yes")
                .with("Slave_SQL_Running", "Yes")
                .with("Seconds_Behind_Master", "0"),
        );
        node
    }

    #[test]
    fn test_healthy_semi_sync() {
        let request = ClusterReviewRequest::new(
            "semi",
            TopologyType::SemiSync,
            vec![master("ON", "ON", 2), replica("r1", "ON"), replica("r2", "1")],
        );
        let response = TopologyAnalyzer::SemiSync.analyze(&request, &Thresholds::default());
        assert_eq!(response.topology_type, TopologyType::SemiSync);
        assert!(response.architecture.topology_valid);
        assert!(response.architecture.ha_capable);
        assert_eq!(response.architecture.replication_healthy, Some(true));
        assert_eq!(response.key_insights.get_bool("semi_sync_enabled"), Some(true));
        assert_eq!(response.overall_status, Severity::Info);
    }

    #[test]
    fn test_disabled_semi_sync_invalid() {
        let request = ClusterReviewRequest::new(
            "semi",
            TopologyType::SemiSync,
            vec![master("OFF", "OFF", 0), replica("r1", "OFF")],
        );
        let response = TopologyAnalyzer::SemiSync.analyze(&request, &Thresholds::default());
        assert!(!response.architecture.topology_valid);
        assert_eq!(response.architecture.status, Severity::Warning);
        assert!(
            response
                .recommendations
                .iter()
                .any(|r| r.title == "Enable semi-synchronous replication")
        );
    }

    #[test]
    fn test_fallen_back_to_async() {
        let request = ClusterReviewRequest::new(
            "semi",
            TopologyType::SemiSync,
            vec![master("ON", "OFF", 0), replica("r1", "ON")],
        );
        let mut output = ReviewFindings::new();
        let arch = analyze_architecture(&request, &mut output);
        assert!(arch.topology_valid);
        assert!(!arch.ha_capable);
        assert_eq!(arch.replication_healthy, Some(false));
        assert!(
            arch.architecture_recommendations
                .iter()
                .any(|r| r.contains("fallen back to async"))
        );
        assert!(
            arch.architecture_recommendations
                .iter()
                .any(|r| r == "Only 0 of 1 replicas connected with semi-sync")
        );
    }
}
