//! Galera synchronous multi-master cluster.

use super::{TopologyReview, analyze_nodes};
use crate::analyzer::base::BaseAnalyzer;
use crate::analyzer::input::{ClusterReviewRequest, NodeRole, NodeSnapshot, TopologyType};
use crate::analyzer::metrics;
use crate::analyzer::types::{
    ArchitectureAssessment, Category, Effort, Finding, MetricAnalysis, NodeAnalysis,
    Recommendation, ReviewFindings, Severity, ratio_below, ratio_exceeds,
};
use std::collections::BTreeSet;

/// Local states in which a node serves traffic normally.
const HEALTHY_LOCAL_STATES: &[&str] = &["Synced", "Donor/Desynced"];

pub(super) fn analyze(base: &BaseAnalyzer<'_>, request: &ClusterReviewRequest) -> TopologyReview {
    let mut output = ReviewFindings::new();
    let nodes = analyze_nodes(request, &mut output, |node| analyze_node(base, node));
    let architecture = analyze_architecture(request, &mut output);
    let capacity = base.analyze_capacity(request);
    let load = base.analyze_load(request);

    if architecture.galera_flow_control_issues == Some(true) {
        output.recommend(
            Recommendation::new(
                2,
                Category::Performance,
                "Address flow control issues",
                "Flow control indicates performance bottleneck",
            )
            .with_action("Investigate slow nodes, tune wsrep_slave_threads, check disk I/O")
            .with_impact("Improved cluster throughput and reduced latency")
            .with_effort(Effort::Medium),
        );
    }

    if !architecture.quorum_capable {
        output.recommend(
            Recommendation::new(
                1,
                Category::Availability,
                "Add nodes for quorum",
                format!(
                    "Cluster has {} nodes, need 3+ for proper quorum",
                    architecture.node_count
                ),
            )
            .with_action("Add at least one more node to achieve quorum capability")
            .with_impact("Prevent split-brain and improve availability")
            .with_effort(Effort::High),
        );
    }

    let ratio = load.read_write_ratio;
    if ratio_exceeds(ratio, 20.0) && load.total_writes_per_second < 100.0 {
        output.recommend(
            Recommendation::new(
                4,
                Category::Configuration,
                "Consider simpler topology",
                format!(
                    "Read/write ratio is {}:1 with low write rate",
                    crate::analyzer::types::format_ratio(ratio)
                ),
            )
            .with_action("Evaluate if async replication with read replicas would suffice")
            .with_impact("Reduced complexity and potentially better read performance")
            .with_effort(Effort::High)
            .with_related("low_write_rate"),
        );
    }

    let mut insights = base.key_insights(request, &architecture, &capacity, &load);
    insights.insert(
        "galera_required",
        load.total_writes_per_second > 100.0 || ratio_below(ratio, 10.0),
    );
    insights.insert(
        "galera_healthy",
        nodes.iter().all(|n| {
            n.wsrep_ready == Some(true) && n.wsrep_cluster_status.as_deref() == Some("Primary")
        }),
    );
    insights.insert(
        "flow_control_issues",
        architecture.galera_flow_control_issues.unwrap_or(false),
    );
    if architecture.node_count > 3 && capacity.is_oversized {
        insights.insert("consider_downsizing", true);
        insights.insert("recommended_node_count", 3);
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

/// Base performance plus wsrep state, flow control, queues and conflicts.
fn analyze_node(base: &BaseAnalyzer<'_>, node: &NodeSnapshot) -> NodeAnalysis {
    let galera = &base.thresholds().galera;
    let mut analysis = base.analyze_node_performance(node);
    let host = node.hostname.as_str();

    let ready = node
        .wsrep_str("wsrep_ready")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("ON"));
    let cluster_status = node.wsrep_str("wsrep_cluster_status").unwrap_or_default();
    analysis.wsrep_ready = Some(ready);
    analysis.wsrep_cluster_status = Some(cluster_status.clone());

    if !ready {
        analysis.flag(
            Finding::new(
                Severity::Critical,
                Category::Replication,
                "Galera node issue",
                "wsrep_ready is OFF",
            )
            .with_node(host),
        );
    }

    if cluster_status != "Primary" {
        analysis.flag(
            Finding::new(
                Severity::Critical,
                Category::Replication,
                "Galera node issue",
                format!("Node not in Primary component (status: {cluster_status})"),
            )
            .with_node(host),
        );
    }

    let local_state = node
        .wsrep_str("wsrep_local_state_comment")
        .unwrap_or_default();
    if !HEALTHY_LOCAL_STATES.contains(&local_state.as_str()) {
        analysis.flag(
            Finding::new(
                Severity::Warning,
                Category::Replication,
                "Galera node issue",
                format!("Node state is {local_state}"),
            )
            .with_node(host),
        );
    }

    // Flow control is the only wsrep metric that escalates the node.
    let fc_tier = &galera.flow_control_paused;
    let fc = metrics::flow_control_paused(node);
    let fc_status = fc_tier.evaluate_high(fc);
    analysis.wsrep_flow_control_paused = Some(fc);
    if fc_status != Severity::Info {
        let threshold = match fc_status {
            Severity::Critical => fc_tier.critical_or(0.2),
            _ => fc_tier.warning_or(0.01),
        };
        analysis.flag(
            Finding::new(
                fc_status,
                Category::Performance,
                format!("Flow control {fc_status}"),
                format!("Node paused {:.2}% of time due to flow control", fc * 100.0),
            )
            .with_metric("wsrep_flow_control_paused", fc * 100.0)
            .with_threshold(threshold * 100.0)
            .with_node(host),
        );
    }
    analysis.metrics.push(
        MetricAnalysis::new(
            "wsrep_flow_control_paused",
            fc * 100.0,
            "%",
            fc_status,
            format!("Time paused for flow control: {:.2}%", fc * 100.0),
        )
        .with_thresholds(
            fc_tier.warning_or(0.01) * 100.0,
            fc_tier.critical_or(0.2) * 100.0,
        ),
    );

    let recv_tier = &galera.local_recv_queue_avg;
    let recv = metrics::recv_queue_avg(node);
    analysis.metrics.push(
        MetricAnalysis::new(
            "wsrep_local_recv_queue_avg",
            recv,
            "writesets",
            recv_tier.evaluate_high(recv),
            format!("Average receive queue: {recv:.2}"),
        )
        .with_thresholds(recv_tier.warning_or(0.5), recv_tier.critical_or(1.0)),
    );

    let send_tier = &galera.local_send_queue_avg;
    let send = metrics::send_queue_avg(node);
    analysis.metrics.push(
        MetricAnalysis::new(
            "wsrep_local_send_queue_avg",
            send,
            "writesets",
            send_tier.evaluate_high(send),
            format!("Average send queue: {send:.2}"),
        )
        .with_thresholds(send_tier.warning_or(0.5), send_tier.critical_or(1.0)),
    );

    let cert_tier = &galera.cert_conflicts_per_hour;
    let conflicts = metrics::cert_failures_per_hour(node);
    analysis.metrics.push(
        MetricAnalysis::new(
            "cert_conflicts_per_hour",
            conflicts,
            "conflicts/hour",
            cert_tier.evaluate_high(conflicts),
            format!("Certification conflicts: {conflicts:.1}/hour"),
        )
        .with_thresholds(cert_tier.warning_or(10.0), cert_tier.critical_or(100.0)),
    );

    analysis
}

fn analyze_architecture(
    request: &ClusterReviewRequest,
    output: &mut ReviewFindings,
) -> ArchitectureAssessment {
    let galera_nodes: Vec<&NodeSnapshot> = request
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::GaleraNode)
        .collect();
    let checked: Vec<&NodeSnapshot> = if galera_nodes.is_empty() {
        request.nodes.iter().collect()
    } else {
        galera_nodes
    };
    let node_count = checked.len();

    let mut arch = ArchitectureAssessment::new(TopologyType::Galera, node_count);
    arch.proxy_present = request.active_proxy().is_some();
    arch.summary = format!("Galera cluster with {node_count} nodes");

    let foreign: Vec<&str> = request
        .nodes
        .iter()
        .filter(|n| n.role != NodeRole::GaleraNode)
        .map(|n| n.hostname.as_str())
        .collect();
    if !foreign.is_empty() {
        output.finding(Finding::new(
            Severity::Warning,
            Category::Galera,
            "Unexpected node roles in Galera cluster",
            format!(
                "Nodes without the galera_node role: {}",
                foreign.join(", ")
            ),
        ));
    }

    if node_count < 3 {
        arch.topology_valid = false;
        arch.status.escalate(Severity::Warning);
        arch.architecture_recommendations.push(format!(
            "Galera cluster has {node_count} nodes. Minimum 3 recommended for quorum."
        ));
    }
    if node_count % 2 == 0 {
        arch.architecture_recommendations.push(format!(
            "Even number of nodes ({node_count}) - consider odd number to avoid split-brain"
        ));
    }

    let mut sizes = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    let mut uuids = BTreeSet::new();
    let mut flow_control_issues = false;

    for node in &checked {
        let size = node.wsrep_int("wsrep_cluster_size", 0);
        if size > 0 {
            sizes.insert(size);
        }
        if let Some(status) = node.wsrep_str("wsrep_cluster_status").filter(|s| !s.is_empty()) {
            statuses.insert(status);
        }
        if let Some(uuid) = node
            .wsrep_str("wsrep_cluster_state_uuid")
            .filter(|s| !s.is_empty())
        {
            uuids.insert(uuid);
        }
        if metrics::flow_control_paused(node) > 0.01 {
            flow_control_issues = true;
        }
    }

    if sizes.len() > 1 {
        arch.topology_valid = false;
        arch.status.escalate(Severity::Critical);
        let listed: Vec<String> = sizes.iter().map(i64::to_string).collect();
        let message = format!(
            "Inconsistent cluster sizes detected: {{{}}}. Cluster may be partitioned.",
            listed.join(", ")
        );
        output.finding(Finding::new(
            Severity::Critical,
            Category::Galera,
            "Cluster may be partitioned",
            message.clone(),
        ));
        arch.architecture_recommendations.push(message);
    }

    if uuids.len() > 1 {
        arch.topology_valid = false;
        arch.status.escalate(Severity::Critical);
        let message = "Multiple cluster UUIDs detected. Nodes may not be in the same cluster.";
        output.finding(Finding::new(
            Severity::Critical,
            Category::Galera,
            "Multiple cluster UUIDs",
            message,
        ));
        arch.architecture_recommendations.push(message.to_string());
    }

    if !statuses.is_empty() && !statuses.contains("Primary") {
        arch.status.escalate(Severity::Critical);
        let message = "No nodes in Primary component - cluster is non-operational";
        output.finding(Finding::new(
            Severity::Critical,
            Category::Galera,
            "Cluster non-operational",
            message,
        ));
        arch.architecture_recommendations.push(message.to_string());
    }

    if flow_control_issues {
        arch.architecture_recommendations
            .push("Flow control detected - some nodes may be slower than others".to_string());
    }
    if node_count > 5 {
        arch.consider_alternatives.push(
            "Consider if 5+ node cluster is necessary - may add replication overhead".to_string(),
        );
    }

    arch.ha_capable = node_count >= 2;
    arch.quorum_capable = node_count >= 3;
    arch.galera_cluster_size = Some(sizes.iter().next().copied().unwrap_or(node_count as i64));
    arch.galera_cluster_status = statuses.iter().next().cloned();
    arch.galera_flow_control_issues = Some(flow_control_issues);
    arch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::thresholds::Thresholds;
    use crate::analyzer::topology::TopologyAnalyzer;
    use crate::analyzer::topology::test_support::healthy_node;

    fn galera_node(host: &str, size: &str, uuid: &str) -> NodeSnapshot {
        let mut node = healthy_node(host, NodeRole::GaleraNode);
        for (k, v) in [
            ("wsrep_ready", "ON"),
            ("wsrep_cluster_status", "Primary"),
            ("wsrep_flow_control_paused", "0.001"),
            ("wsrep_cluster_size", size),
            ("wsrep_cluster_state_uuid", uuid),
            ("wsrep_local_state_comment", "Synced"),
        ] {
            node.global_status.insert(k, v);
        }
        node
    }

    fn request(nodes: Vec<NodeSnapshot>) -> ClusterReviewRequest {
        ClusterReviewRequest::new("galera", TopologyType::Galera, nodes)
    }

    #[test]
    fn test_healthy_three_node_cluster() {
        let req = request(vec![
            galera_node("g1", "3", "abc"),
            galera_node("g2", "3", "abc"),
            galera_node("g3", "3", "abc"),
        ]);
        let response = TopologyAnalyzer::Galera.analyze(&req, &Thresholds::default());
        assert!(response.architecture.topology_valid);
        assert!(response.architecture.quorum_capable);
        assert_eq!(response.architecture.galera_cluster_size, Some(3));
        assert_eq!(response.overall_status, Severity::Info);
        assert_eq!(response.key_insights.get_bool("galera_healthy"), Some(true));
        assert_eq!(
            response.overall_summary,
            "Galera cluster is healthy and operating normally"
        );
    }

    #[test]
    fn test_size_divergence_is_partition() {
        let req = request(vec![
            galera_node("g1", "3", "abc"),
            galera_node("g2", "3", "abc"),
            galera_node("g3", "2", "abc"),
        ]);
        let response = TopologyAnalyzer::Galera.analyze(&req, &Thresholds::default());
        assert!(!response.architecture.topology_valid);
        assert_eq!(response.architecture.status, Severity::Critical);
        assert_eq!(response.overall_status, Severity::Critical);
        assert!(
            response
                .findings
                .iter()
                .any(|f| f.title == "Cluster may be partitioned")
        );
    }

    #[test]
    fn test_uuid_divergence_is_invalid() {
        let req = request(vec![galera_node("g1", "2", "abc"), galera_node("g2", "2", "def")]);
        let mut output = ReviewFindings::new();
        let arch = analyze_architecture(&req, &mut output);
        assert!(!arch.topology_valid);
        assert_eq!(arch.status, Severity::Critical);
    }

    #[test]
    fn test_non_primary_node_is_critical() {
        let thresholds = Thresholds::default();
        let base = BaseAnalyzer::new(&thresholds);
        let mut node = galera_node("g1", "3", "abc");
        node.global_status.insert("wsrep_cluster_status", "non-Primary");
        node.global_status.insert("wsrep_local_state_comment", "Joining");
        let analysis = analyze_node(&base, &node);
        assert_eq!(analysis.status, Severity::Critical);
        assert_eq!(analysis.findings.len(), 2);
    }

    #[test]
    fn test_missing_local_state_is_a_warning() {
        let thresholds = Thresholds::default();
        let base = BaseAnalyzer::new(&thresholds);
        let mut node = healthy_node("g1", NodeRole::GaleraNode);
        node.global_status.insert("wsrep_ready", "ON");
        node.global_status.insert("wsrep_cluster_status", "Primary");
        node.global_status.insert("wsrep_flow_control_paused", "0.001");
        let analysis = analyze_node(&base, &node);
        assert_eq!(analysis.status, Severity::Warning);
        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].description, "Node state is ");
    }

    #[test]
    fn test_flow_control_escalates_but_queues_do_not() {
        let thresholds = Thresholds::default();
        let base = BaseAnalyzer::new(&thresholds);
        let mut node = galera_node("g1", "3", "abc");
        node.global_status.insert("wsrep_local_recv_queue_avg", "5.0");
        let analysis = analyze_node(&base, &node);
        assert_eq!(analysis.status, Severity::Info);
        let recv = analysis
            .metrics
            .iter()
            .find(|m| m.name == "wsrep_local_recv_queue_avg")
            .unwrap();
        assert_eq!(recv.status, Severity::Critical);

        node.global_status.insert("wsrep_flow_control_paused", "0.05");
        let analysis = analyze_node(&base, &node);
        assert_eq!(analysis.status, Severity::Warning);
        assert_eq!(analysis.findings[0].title, "Flow control warning");
    }

    #[test]
    fn test_two_nodes_not_quorum_capable() {
        let req = request(vec![galera_node("g1", "2", "abc"), galera_node("g2", "2", "abc")]);
        let response = TopologyAnalyzer::Galera.analyze(&req, &Thresholds::default());
        assert!(!response.architecture.quorum_capable);
        assert!(response.architecture.ha_capable);
        let first = &response.recommendations[0];
        assert_eq!(first.title, "Add nodes for quorum");
    }
}
