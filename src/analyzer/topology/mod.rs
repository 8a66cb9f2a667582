//! Topology analyzers.
//!
//! One variant per supported topology. Each runs a fixed sequence of checks
//! on top of [`BaseAnalyzer`] and returns a [`TopologyReview`] that is turned
//! into the final response. Semi-sync reuses the replication checks.

mod galera;
mod replication;
mod semi_sync;
mod standalone;

use super::base::{BaseAnalyzer, overall_status};
use super::input::{ClusterReviewRequest, NodeSnapshot, TopologyType};
use super::thresholds::Thresholds;
use super::types::{
    ArchitectureAssessment, CapacityAssessment, ClusterReviewResponse, KeyInsights,
    LoadAnalysis, NodeAnalysis, ReviewFindings, Severity,
};
use chrono::Utc;

/// Closed set of topology analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyAnalyzer {
    Standalone,
    Replication,
    SemiSync,
    Galera,
}

impl TopologyAnalyzer {
    pub fn for_topology(topology: TopologyType) -> Self {
        match topology {
            TopologyType::Standalone => Self::Standalone,
            TopologyType::MasterReplica => Self::Replication,
            TopologyType::SemiSync => Self::SemiSync,
            TopologyType::Galera => Self::Galera,
        }
    }

    pub fn topology(&self) -> TopologyType {
        match self {
            Self::Standalone => TopologyType::Standalone,
            Self::Replication => TopologyType::MasterReplica,
            Self::SemiSync => TopologyType::SemiSync,
            Self::Galera => TopologyType::Galera,
        }
    }

    /// Run the full topology review.
    pub fn analyze(
        &self,
        request: &ClusterReviewRequest,
        thresholds: &Thresholds,
    ) -> ClusterReviewResponse {
        let base = BaseAnalyzer::new(thresholds);
        log::debug!(
            "Running {} analyzer over {} node(s)",
            self.topology(),
            request.nodes.len()
        );
        let review = match self {
            Self::Standalone => standalone::analyze(&base, request),
            Self::Replication => replication::analyze(&base, request),
            Self::SemiSync => semi_sync::analyze(&base, request),
            Self::Galera => galera::analyze(&base, request),
        };
        review.into_response(request, self.topology())
    }
}

/// Intermediate result of one topology analyzer.
#[derive(Debug)]
pub(crate) struct TopologyReview {
    pub nodes: Vec<NodeAnalysis>,
    pub architecture: ArchitectureAssessment,
    pub capacity: CapacityAssessment,
    pub load: LoadAnalysis,
    pub output: ReviewFindings,
    pub insights: KeyInsights,
}

impl TopologyReview {
    fn into_response(
        self,
        request: &ClusterReviewRequest,
        topology: TopologyType,
    ) -> ClusterReviewResponse {
        let status = overall_status(&self.nodes, &self.architecture, &self.capacity);
        ClusterReviewResponse {
            cluster_name: request.cluster_name.clone(),
            topology_type: topology,
            review_timestamp: Utc::now(),
            overall_status: status,
            overall_summary: overall_summary(topology, status).to_string(),
            architecture: self.architecture,
            capacity: self.capacity,
            load: self.load,
            nodes: self.nodes,
            findings: self.output.findings,
            recommendations: self.output.recommendations,
            key_insights: self.insights,
        }
    }
}

/// Analyze every node and copy node findings into the review output.
pub(crate) fn analyze_nodes<F>(
    request: &ClusterReviewRequest,
    output: &mut ReviewFindings,
    per_node: F,
) -> Vec<NodeAnalysis>
where
    F: Fn(&NodeSnapshot) -> NodeAnalysis,
{
    request
        .nodes
        .iter()
        .map(|node| {
            let analysis = per_node(node);
            for finding in &analysis.findings {
                output.finding(finding.clone());
            }
            analysis
        })
        .collect()
}

fn overall_summary(topology: TopologyType, status: Severity) -> &'static str {
    match (topology, status) {
        (TopologyType::Standalone, Severity::Critical) => {
            "Standalone node has critical issues requiring attention"
        }
        (TopologyType::Standalone, Severity::Warning) => {
            "Standalone node is functional but has optimization opportunities"
        }
        (TopologyType::Standalone, Severity::Info) => "Standalone node is operating normally",
        (TopologyType::MasterReplica, Severity::Critical) => {
            "Master-replica cluster has critical issues"
        }
        (TopologyType::MasterReplica, Severity::Warning) => {
            "Master-replica cluster has warnings to address"
        }
        (TopologyType::MasterReplica, Severity::Info) => "Master-replica cluster is healthy",
        (TopologyType::SemiSync, Severity::Critical) => "Semi-sync cluster has critical issues",
        (TopologyType::SemiSync, Severity::Warning) => {
            "Semi-sync cluster has warnings to address"
        }
        (TopologyType::SemiSync, Severity::Info) => "Semi-sync cluster is healthy",
        (TopologyType::Galera, Severity::Critical) => {
            "Galera cluster has critical issues requiring immediate attention"
        }
        (TopologyType::Galera, Severity::Warning) => {
            "Galera cluster is functional but has issues to address"
        }
        (TopologyType::Galera, Severity::Info) => {
            "Galera cluster is healthy and operating normally"
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::analyzer::input::{NodeRole, NodeSnapshot, VarMap};

    /// A node with healthy, fully populated server counters.
    pub fn healthy_node(host: &str, role: NodeRole) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(host, role);
        node.global_status = VarMap::new()
            .with("Uptime", "86400")
            .with("Questions", "8640000")
            .with("Com_select", "6048000")
            .with("Com_insert", "864000")
            .with("Com_update", "432000")
            .with("Threads_connected", "40")
            .with("Max_used_connections", "200")
            .with("Innodb_buffer_pool_reads", "100")
            .with("Innodb_buffer_pool_read_requests", "1000000")
            .with("Innodb_buffer_pool_pages_data", "7000")
            .with("Innodb_buffer_pool_pages_total", "10000");
        node.global_variables = VarMap::new().with("max_connections", "500");
        node
    }
}
