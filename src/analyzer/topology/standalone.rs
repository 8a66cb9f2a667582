//! Standalone server.

use super::{TopologyReview, analyze_nodes};
use crate::analyzer::base::BaseAnalyzer;
use crate::analyzer::input::{ClusterReviewRequest, TopologyType};
use crate::analyzer::types::{
    ArchitectureAssessment, Category, Effort, Finding, Recommendation, ReviewFindings, Severity,
};

pub(super) fn analyze(base: &BaseAnalyzer<'_>, request: &ClusterReviewRequest) -> TopologyReview {
    let mut output = ReviewFindings::new();
    let nodes = analyze_nodes(request, &mut output, |node| {
        base.analyze_node_performance(node)
    });
    let architecture = analyze_architecture(request, &mut output);
    let capacity = base.analyze_capacity(request);
    let load = base.analyze_load(request);

    // A single server is always a single point of failure.
    output.finding(
        Finding::new(
            Severity::Warning,
            Category::Availability,
            "No high availability",
            "Standalone node has single point of failure",
        )
        .with_node(request.nodes.first().map(|n| n.hostname.as_str()).unwrap_or_default()),
    );
    output.recommend(
        Recommendation::new(
            2,
            Category::Availability,
            "Consider adding high availability",
            "Standalone node lacks redundancy",
        )
        .with_action("Add at least one replica for failover capability")
        .with_impact("Improved availability and disaster recovery")
        .with_effort(Effort::Medium),
    );

    let mut insights = base.key_insights(request, &architecture, &capacity, &load);
    insights.insert("galera_required", false);
    insights.insert("semi_sync_sufficient", true);

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
    let node_count = request.nodes.len();
    let mut arch = ArchitectureAssessment::new(TopologyType::Standalone, node_count);
    arch.topology_valid = node_count == 1;
    arch.expected_node_count = Some(1);
    arch.summary = "Standalone node - no high availability".to_string();
    arch.proxy_present = request.active_proxy().is_some();

    if !arch.topology_valid {
        arch.status.escalate(Severity::Warning);
        arch.architecture_recommendations.push(format!(
            "Standalone topology expects 1 node, but {node_count} were provided"
        ));
        output.finding(Finding::new(
            Severity::Warning,
            Category::Configuration,
            "Unexpected node count for standalone topology",
            format!("Standalone topology expects 1 node, but {node_count} were provided"),
        ));
    }

    arch.architecture_recommendations.push(
        "Standalone node has no high availability. Consider adding replicas for redundancy."
            .to_string(),
    );
    arch.consider_alternatives = vec![
        "master_replica - Add replica(s) for read scaling and failover capability".to_string(),
        "galera - For automatic failover and multi-master writes".to_string(),
    ];
    arch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::NodeRole;
    use crate::analyzer::thresholds::Thresholds;
    use crate::analyzer::topology::TopologyAnalyzer;
    use crate::analyzer::topology::test_support::healthy_node;

    #[test]
    fn test_healthy_single_node_still_flags_ha() {
        let request = ClusterReviewRequest::new(
            "single",
            TopologyType::Standalone,
            vec![healthy_node("db1", NodeRole::Standalone)],
        );
        let response =
            TopologyAnalyzer::Standalone.analyze(&request, &Thresholds::default());
        assert!(response.architecture.topology_valid);
        assert!(
            response
                .findings
                .iter()
                .any(|f| f.category == Category::Availability && f.title == "No high availability")
        );
        assert!(
            response
                .recommendations
                .iter()
                .any(|r| r.title == "Consider adding high availability")
        );
        assert_eq!(response.key_insights.get_bool("semi_sync_sufficient"), Some(true));
        assert_eq!(response.overall_status, Severity::Info);
    }

    #[test]
    fn test_two_nodes_invalid_with_finding() {
        let request = ClusterReviewRequest::new(
            "pair",
            TopologyType::Standalone,
            vec![
                healthy_node("db1", NodeRole::Standalone),
                healthy_node("db2", NodeRole::Standalone),
            ],
        );
        let response =
            TopologyAnalyzer::Standalone.analyze(&request, &Thresholds::default());
        assert!(!response.architecture.topology_valid);
        assert_eq!(response.architecture.status, Severity::Warning);
        assert_eq!(response.overall_status, Severity::Warning);
        assert!(
            response
                .findings
                .iter()
                .any(|f| f.title.starts_with("Unexpected node count"))
        );
    }
}
