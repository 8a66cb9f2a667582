//! Review orchestration.
//!
//! [`ReviewService`] validates a request, dispatches to the topology
//! analyzer and merges the proxy, configuration, comparison and sizing
//! results into one [`ClusterReviewResponse`]. The topology is always an
//! explicit parameter; the request is never modified.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::comparison::compare_topologies;
use super::config_rules::ConfigAnalyzer;
use super::input::{ClusterReviewRequest, TopologyType};
use super::proxy::analyze_proxy;
use super::sizing::analyze_sizing;
use super::thresholds::Thresholds;
use super::topology::TopologyAnalyzer;
use super::types::{ClusterReviewResponse, Severity};
use crate::error::Result;

const PROXY_SUMMARY_SUFFIX: &str = " (proxy issues detected)";

// ============================================================================
// Topology Detection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionConfidence {
    High,
    Low,
}

impl fmt::Display for DetectionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Detected topology with the evidence that led to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDetection {
    pub topology: TopologyType,
    pub confidence: DetectionConfidence,
    pub indicators: Vec<String>,
}

/// Inspect the request for Galera, replica and semi-sync indicators, in that order.
pub fn detect_topology_with_indicators(request: &ClusterReviewRequest) -> TopologyDetection {
    let mut indicators = Vec::new();

    for node in &request.nodes {
        if node.variable_enabled("wsrep_on") {
            indicators.push(format!("{}: wsrep_on=ON", node.hostname));
        }
        if let Some(size) = node
            .wsrep_str("wsrep_cluster_size")
            .filter(|s| !s.trim().is_empty() && s.trim() != "0")
        {
            indicators.push(format!("{}: wsrep_cluster_size={}", node.hostname, size.trim()));
        }
        if node.wsrep_status.as_ref().is_some_and(|m| !m.is_empty()) {
            indicators.push(format!("{}: wsrep status reported", node.hostname));
        }
    }
    if !indicators.is_empty() {
        return TopologyDetection {
            topology: TopologyType::Galera,
            confidence: DetectionConfidence::High,
            indicators,
        };
    }

    let mut has_replica = false;
    let mut has_semi_sync = false;
    for node in &request.nodes {
        if node.master_status.as_ref().is_some_and(|m| !m.is_empty()) {
            indicators.push(format!("{}: master status reported", node.hostname));
        }
        if node.slave_status.as_ref().is_some_and(|m| !m.is_empty()) {
            has_replica = true;
            indicators.push(format!("{}: slave status reported", node.hostname));
        }
        for key in ["rpl_semi_sync_master_enabled", "rpl_semi_sync_slave_enabled"] {
            if node.variable_enabled(key) {
                has_semi_sync = true;
                indicators.push(format!("{}: {key}=ON", node.hostname));
            }
        }
    }

    let topology = match (has_replica, has_semi_sync) {
        (true, true) => TopologyType::SemiSync,
        (true, false) => TopologyType::MasterReplica,
        (false, _) => TopologyType::Standalone,
    };
    let confidence = if indicators.is_empty() {
        DetectionConfidence::Low
    } else {
        DetectionConfidence::High
    };
    TopologyDetection {
        topology,
        confidence,
        indicators,
    }
}

// ============================================================================
// Review Service
// ============================================================================

/// Entry point for cluster reviews.
pub struct ReviewService {
    thresholds: Thresholds,
    config_analyzer: ConfigAnalyzer,
}

impl Default for ReviewService {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewService {
    /// Service with built-in thresholds and every configuration rule enabled.
    pub fn new() -> Self {
        Self {
            thresholds: Thresholds::default(),
            config_analyzer: ConfigAnalyzer::new(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Skip configuration rules by code (e.g. `MDB-CFG-005`).
    pub fn with_ignored_rules<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config_analyzer = self.config_analyzer.with_ignored(codes);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Review using the request's declared topology.
    pub fn review(&self, request: &ClusterReviewRequest) -> Result<ClusterReviewResponse> {
        self.review_as(request, request.topology_type)
    }

    /// Review treating the cluster as `topology`, whatever the request declares.
    pub fn review_as(
        &self,
        request: &ClusterReviewRequest,
        topology: TopologyType,
    ) -> Result<ClusterReviewResponse> {
        request.validate()?;
        log::info!(
            "Reviewing '{}' as {} ({} nodes)",
            request.cluster_name,
            topology,
            request.nodes.len()
        );

        let mut response = TopologyAnalyzer::for_topology(topology).analyze(request, &self.thresholds);

        if let Some(proxy) = request.active_proxy() {
            let report = analyze_proxy(proxy, request, topology);
            response.architecture.proxy_healthy = Some(report.healthy);
            response.key_insights.insert("proxy_healthy", report.healthy);
            response.findings.extend(report.output.findings);
            response.recommendations.extend(report.output.recommendations);
            if report.status == Severity::Critical && response.overall_status != Severity::Critical
            {
                response.overall_status = Severity::Critical;
                response.overall_summary.push_str(PROXY_SUMMARY_SUFFIX);
            }
        }

        let config = self.config_analyzer.analyze(request, topology);
        log::debug!("configuration rules triggered: {:?}", config.triggered_rules);
        response.findings.extend(config.output.findings);
        response.recommendations.extend(config.output.recommendations);

        let comparison = compare_topologies(request, topology);
        let insights = &mut response.key_insights;
        insights.insert("topology_comparison", &comparison.topology_comparison);
        insights.insert("workload_characteristics", &comparison.workload_characteristics);
        insights.insert("topology_recommendation", &comparison.recommendation);
        insights.insert("semi_sync_suitable", comparison.semi_sync_suitable);

        let sizing = analyze_sizing(request, topology);
        insights.insert("current_sizing", &sizing.current_sizing);
        insights.insert("utilization", &sizing.utilization);
        insights.insert("rightsizing_options", &sizing.rightsizing_options);
        insights.insert("cost_impact", &sizing.cost_impact);
        insights.insert("resource_consistency", &sizing.resource_consistency);

        response.sort_recommendations();

        let total_findings = response.findings.len();
        let critical_findings = response.critical_count();
        let total_recommendations = response.recommendations.len();
        let insights = &mut response.key_insights;
        insights.insert("total_findings", total_findings);
        insights.insert("critical_findings", critical_findings);
        insights.insert("total_recommendations", total_recommendations);

        log::info!(
            "Review of '{}' finished: {} ({} findings, {} critical)",
            response.cluster_name,
            response.overall_status,
            total_findings,
            critical_findings
        );
        Ok(response)
    }

    pub fn detect_topology(&self, request: &ClusterReviewRequest) -> TopologyType {
        detect_topology_with_indicators(request).topology
    }

    /// Detect the topology, then review as that topology.
    pub fn auto_review(&self, request: &ClusterReviewRequest) -> Result<ClusterReviewResponse> {
        let detection = detect_topology_with_indicators(request);
        log::info!(
            "Detected {} topology ({} confidence)",
            detection.topology,
            detection.confidence
        );
        let mut response = self.review_as(request, detection.topology)?;
        response.key_insights.insert("topology_auto_detected", true);
        response
            .key_insights
            .insert("detected_topology", detection.topology.as_str());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::{NodeRole, NodeSnapshot, ProxyConfig, ProxyServer, VarMap};
    use crate::analyzer::topology::test_support::healthy_node;
    use crate::error::ReviewError;

    fn galera_node(host: &str) -> NodeSnapshot {
        let mut node = healthy_node(host, NodeRole::GaleraNode);
        node.wsrep_status = Some(
            VarMap::new()
                .with("wsrep_ready", "ON")
                .with("wsrep_cluster_status", "Primary")
                .with("wsrep_cluster_size", "3")
                .with("wsrep_flow_control_paused", "0.001")
                .with("wsrep_local_state_comment", "Synced"),
        );
        node
    }

    #[test]
    fn test_detects_galera_first() {
        let mut replica = healthy_node("r1", NodeRole::Replica);
        replica.slave_status = Some(VarMap::new().with("Slave_IO_Running", "Yes"));
        let request = ClusterReviewRequest::new(
            "c",
            TopologyType::Standalone,
            vec![galera_node("g1"), replica],
        );
        let detection = detect_topology_with_indicators(&request);
        assert_eq!(detection.topology, TopologyType::Galera);
        assert_eq!(detection.confidence, DetectionConfidence::High);
        assert!(detection.indicators.iter().any(|i| i.contains("wsrep_cluster_size=3")));
    }

    #[test]
    fn test_detects_semi_sync_and_replication() {
        let master = healthy_node("m1", NodeRole::Master);
        let mut replica = healthy_node("r1", NodeRole::Replica);
        replica.slave_status = Some(VarMap::new().with("Slave_IO_Running", "Yes"));
        let request = ClusterReviewRequest::new(
            "c",
            TopologyType::Standalone,
            vec![master.clone(), replica.clone()],
        );
        let service = ReviewService::new();
        assert_eq!(service.detect_topology(&request), TopologyType::MasterReplica);

        replica.global_variables.insert("rpl_semi_sync_slave_enabled", "ON");
        let request =
            ClusterReviewRequest::new("c", TopologyType::Standalone, vec![master, replica]);
        assert_eq!(service.detect_topology(&request), TopologyType::SemiSync);
    }

    #[test]
    fn test_standalone_detection_has_low_confidence() {
        let request = ClusterReviewRequest::new(
            "c",
            TopologyType::Galera,
            vec![NodeSnapshot::new("db1", NodeRole::Standalone)],
        );
        let detection = detect_topology_with_indicators(&request);
        assert_eq!(detection.topology, TopologyType::Standalone);
        assert_eq!(detection.confidence, DetectionConfidence::Low);
    }

    #[test]
    fn test_review_as_does_not_touch_request() {
        let request = ClusterReviewRequest::new(
            "c",
            TopologyType::Galera,
            vec![healthy_node("db1", NodeRole::Standalone)],
        );
        let before = request.clone();
        let response = ReviewService::new()
            .review_as(&request, TopologyType::Standalone)
            .unwrap();
        assert_eq!(response.topology_type, TopologyType::Standalone);
        assert_eq!(request, before);
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let request = ClusterReviewRequest::new("c", TopologyType::Standalone, Vec::new());
        let err = ReviewService::new().review(&request).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidRequest(_)));
    }

    #[test]
    fn test_merged_insights_and_sorted_recommendations() {
        let request = ClusterReviewRequest::new(
            "g",
            TopologyType::Galera,
            vec![galera_node("g1"), galera_node("g2"), galera_node("g3")],
        );
        let response = ReviewService::new().review(&request).unwrap();
        assert_eq!(response.overall_status, Severity::Info);
        for key in [
            "topology_comparison",
            "workload_characteristics",
            "topology_recommendation",
            "semi_sync_suitable",
            "current_sizing",
            "utilization",
            "rightsizing_options",
            "cost_impact",
            "total_findings",
            "critical_findings",
            "total_recommendations",
        ] {
            assert!(response.key_insights.contains_key(key), "missing {key}");
        }
        let priorities: Vec<u8> = response.recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert_eq!(
            response.key_insights.get("total_findings"),
            Some(&serde_json::json!(response.findings.len()))
        );
    }

    #[test]
    fn test_proxy_critical_escalates_overall_status() {
        let proxy = ProxyConfig {
            servers: vec![
                ProxyServer {
                    name: "s1".to_string(),
                    state: Some("Down".to_string()),
                    ..ProxyServer::default()
                },
                ProxyServer {
                    name: "s2".to_string(),
                    state: Some("Master, Running".to_string()),
                    queries: Some(10),
                    ..ProxyServer::default()
                },
            ],
            ..ProxyConfig::default()
        };
        let request = ClusterReviewRequest::new(
            "single",
            TopologyType::Standalone,
            vec![healthy_node("db1", NodeRole::Standalone)],
        )
        .with_proxy(proxy);
        let response = ReviewService::new().review(&request).unwrap();
        assert_eq!(response.overall_status, Severity::Critical);
        assert!(response.overall_summary.ends_with(" (proxy issues detected)"));
        assert_eq!(response.architecture.proxy_healthy, Some(false));
        assert_eq!(response.key_insights.get_bool("proxy_healthy"), Some(false));
    }

    #[test]
    fn test_auto_review_marks_detection() {
        let request = ClusterReviewRequest::new(
            "g",
            TopologyType::Standalone,
            vec![galera_node("g1"), galera_node("g2"), galera_node("g3")],
        );
        let response = ReviewService::new().auto_review(&request).unwrap();
        assert_eq!(response.topology_type, TopologyType::Galera);
        assert_eq!(response.key_insights.get_bool("topology_auto_detected"), Some(true));
        assert_eq!(
            response.key_insights.get("detected_topology"),
            Some(&serde_json::json!("galera"))
        );
    }

    #[test]
    fn test_ignored_rules_skip_config_output() {
        let request = ClusterReviewRequest::new(
            "single",
            TopologyType::Standalone,
            vec![healthy_node("db1", NodeRole::Standalone)],
        );
        let with_rule = ReviewService::new().review(&request).unwrap();
        assert!(
            with_rule
                .recommendations
                .iter()
                .any(|r| r.title == "Review wait_timeout on db1")
        );
        let without = ReviewService::new()
            .with_ignored_rules(["MDB-CFG-005"])
            .review(&request)
            .unwrap();
        assert!(
            !without
                .recommendations
                .iter()
                .any(|r| r.title == "Review wait_timeout on db1")
        );
    }
}
