//! Topology comparison.
//!
//! Scores Galera, semi-sync and async replication against the observed
//! workload and documents their latency and multi-datacenter trade-offs.

use serde::{Deserialize, Serialize};

use super::input::{ClusterReviewRequest, TopologyType};
use super::metrics;
use super::types::{format_ratio, ratio_exceeds, read_write_ratio};

/// Minimum score for a topology to count as suitable.
pub const SUITABLE_SCORE: u32 = 60;

pub const SEMI_SYNC_FAILOVER_OPTIONS: &[&str] = &[
    "MaxScale with mariadbmon (auto_failover=true)",
    "Orchestrator (topology management + auto-failover)",
    "MHA (Master High Availability Manager)",
    "MariaDB Replication Manager",
    "ProxySQL + custom scripts",
];

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadCharacteristics {
    pub total_qps: f64,
    pub writes_per_second: f64,
    pub reads_per_second: f64,
    /// `None` for a read-only workload.
    pub read_write_ratio: Option<f64>,
    pub certification_failures: i64,
    pub flow_control_issues: bool,
}

/// Score and trade-offs of one candidate topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyOption {
    pub topology: String,
    pub score: u32,
    pub suitable: bool,
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advantages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disadvantages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configuration_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failover_options: Vec<String>,
}

impl TopologyOption {
    fn new(topology: &str, raw_score: i32, notes: Vec<String>) -> Self {
        let score = raw_score.clamp(0, 100) as u32;
        Self {
            topology: topology.to_string(),
            score,
            suitable: score >= SUITABLE_SCORE,
            notes,
            advantages: Vec::new(),
            disadvantages: Vec::new(),
            configuration_options: Vec::new(),
            failover_options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyProfile {
    pub topology: String,
    pub same_dc_write_latency: String,
    pub cross_dc_write_latency: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumLayout {
    pub nodes: String,
    pub dc1_loss: String,
    pub dc2_loss: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDcConsiderations {
    pub galera_quorum_rule: String,
    pub layouts: Vec<QuorumLayout>,
    pub warning: String,
    pub semi_sync_description: String,
    pub semi_sync_configuration: String,
    pub semi_sync_dr_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub current_topology: TopologyType,
    pub workload_characteristics: WorkloadCharacteristics,
    pub topology_comparison: Vec<TopologyOption>,
    pub latency_comparison: Vec<LatencyProfile>,
    pub multi_dc_considerations: MultiDcConsiderations,
    /// Only produced for Galera clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub galera_suitable: bool,
    pub semi_sync_suitable: bool,
    pub async_suitable: bool,
    pub semi_sync_failover_options: Vec<String>,
}

impl ComparisonReport {
    pub fn option(&self, topology: &str) -> Option<&TopologyOption> {
        self.topology_comparison.iter().find(|o| o.topology == topology)
    }
}

// ============================================================================
// Analysis
// ============================================================================

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Workload characteristics used for scoring.
///
/// Galera writes replicate to every node, so for multi-node Galera the write
/// rate is the busiest node's local commit rate rather than the sum.
pub fn workload_characteristics(
    request: &ClusterReviewRequest,
    topology: TopologyType,
) -> WorkloadCharacteristics {
    let mut total_qps = 0.0;
    let mut writes = 0.0;
    let mut reads = 0.0;
    let mut cert_failures = 0i64;
    let mut flow_control_issues = false;

    for node in &request.nodes {
        total_qps += metrics::queries_per_second(node);
        writes += metrics::writes_per_second(node);
        reads += metrics::reads_per_second(node);
        cert_failures =
            cert_failures.saturating_add(node.wsrep_int("wsrep_local_cert_failures", 0).max(0));
        if metrics::flow_control_paused(node) > 0.01 {
            flow_control_issues = true;
        }
    }

    if topology == TopologyType::Galera && request.nodes.len() > 1 {
        let max_commits = request
            .nodes
            .iter()
            .map(metrics::local_commits_per_second)
            .fold(0.0, f64::max);
        writes = if max_commits > 0.0 {
            max_commits
        } else {
            writes / request.nodes.len() as f64
        };
    }

    WorkloadCharacteristics {
        total_qps: round2(total_qps),
        writes_per_second: round2(writes),
        reads_per_second: round2(reads),
        read_write_ratio: read_write_ratio(reads, writes).map(round2),
        certification_failures: cert_failures,
        flow_control_issues,
    }
}

fn score_galera(workload: &WorkloadCharacteristics, node_count: usize) -> TopologyOption {
    let mut score = 90;
    let mut notes = Vec::new();
    if workload.writes_per_second > 500.0 {
        score -= 10;
        notes.push("High write volume may cause flow control".to_string());
    }
    if workload.certification_failures > 100 {
        score -= 20;
        notes.push(format!(
            "Certification failures ({}) indicate write conflicts",
            workload.certification_failures
        ));
    }
    if workload.flow_control_issues {
        score -= 15;
        notes.push("Flow control indicates nodes struggling to keep up".to_string());
    }
    if node_count >= 3 {
        score += 5;
        notes.push("Quorum-capable with current node count".to_string());
    }
    if workload.writes_per_second < 50.0 && ratio_exceeds(workload.read_write_ratio, 10.0) {
        score -= 5;
        notes.push("Very low writes - Galera overhead may not be justified".to_string());
    }
    notes.push(
        "NOTE: Galera certification requires cross-DC round-trip on every commit".to_string(),
    );

    let mut option = TopologyOption::new("galera", score, notes);
    option.advantages = strings(&[
        "Multi-master writes supported",
        "Automatic failover with MaxScale",
        "All nodes always consistent (synchronous)",
        "Automatic node recovery (IST/SST)",
        "Built-in quorum and split-brain prevention",
    ]);
    option.disadvantages = strings(&[
        "Cross-DC latency on EVERY commit (certification)",
        "Requires more nodes (2n+1 for quorum)",
        "More complex operations (SST/IST/gcache tuning)",
        "Write conflicts cause transaction rollback",
    ]);
    option
}

fn score_semi_sync(workload: &WorkloadCharacteristics) -> TopologyOption {
    let mut score = 75;
    let mut notes =
        vec!["Automatic failover available via MaxScale/Orchestrator/MHA".to_string()];
    let writes = workload.writes_per_second;
    if writes < 100.0 {
        score += 10;
        notes.push("Low write volume - easily handled by single master".to_string());
    } else if writes < 500.0 {
        notes.push(format!(
            "Write rate ({writes:.0}/sec) manageable by single master"
        ));
    } else {
        notes.push(format!(
            "High write rate ({writes:.0}/sec) - still viable for single master"
        ));
    }
    if ratio_exceeds(workload.read_write_ratio, 5.0) {
        score += 10;
        notes.push("Read-heavy workload benefits from read replicas".to_string());
    }
    if workload.certification_failures == 0 {
        score += 5;
        notes.push("No write conflicts - single-writer model would work".to_string());
    }

    let mut option = TopologyOption::new("semi_sync", score, notes);
    option.advantages = strings(&[
        "Faster writes with local-DC ACK (no cross-DC wait)",
        "Simpler operations - standard replication",
        "Fewer nodes required (2-3 vs 5-7 for Galera)",
        "Better tooling ecosystem (pt-tools, standard backup)",
    ]);
    option.disadvantages = strings(&[
        "Single writer only - no multi-master capability",
        "Remote DC may lag (RPO > 0 for DR site)",
        "Node recovery requires manual/scripted rebuild",
        "Need to configure split-brain prevention",
    ]);
    option.configuration_options = strings(&[
        "Local-DC ACK only (fastest - remote DC uses async)",
        "Any replica ACK (semi-sync from any node)",
        "Hybrid (semi-sync local + async remote)",
    ]);
    option.failover_options = strings(SEMI_SYNC_FAILOVER_OPTIONS);
    option
}

fn score_async(workload: &WorkloadCharacteristics) -> TopologyOption {
    let mut score = 60;
    let mut notes = strings(&[
        "Lowest latency for writes",
        "Risk of data loss on master failure",
    ]);
    if workload.writes_per_second > 500.0 {
        score += 10;
        notes.push("High writes benefit from async's lower latency".to_string());
    } else {
        notes.push("Low write volume doesn't need async performance".to_string());
    }
    TopologyOption::new("async_replication", score, notes)
}

fn latency_table() -> Vec<LatencyProfile> {
    [
        (
            "galera",
            "2-5ms (certification overhead)",
            "10-50ms+ (certification requires ALL nodes)",
            "Every commit waits for cross-DC certification",
        ),
        (
            "semi_sync_local_ack",
            "1-2ms (local replica ACK)",
            "N/A (remote DC uses async)",
            "Fastest writes - only wait for local DC ACK",
        ),
        (
            "semi_sync_any_ack",
            "1-2ms (if local ACKs first)",
            "10-50ms+ (if remote ACKs first)",
            "Latency depends on which replica ACKs first",
        ),
        (
            "async",
            "<1ms (no wait)",
            "N/A",
            "Fastest but risk of data loss",
        ),
    ]
    .into_iter()
    .map(|(topology, same, cross, note)| LatencyProfile {
        topology: topology.to_string(),
        same_dc_write_latency: same.to_string(),
        cross_dc_write_latency: cross.to_string(),
        note: note.to_string(),
    })
    .collect()
}

fn multi_dc_considerations() -> MultiDcConsiderations {
    let layout = |nodes: &str, dc1: &str, dc2: &str| QuorumLayout {
        nodes: nodes.to_string(),
        dc1_loss: dc1.to_string(),
        dc2_loss: dc2.to_string(),
    };
    MultiDcConsiderations {
        galera_quorum_rule: "Galera requires >50% of nodes for quorum".to_string(),
        layouts: vec![
            layout("3+3+arbitrator (7 total)", "4/7=57% ✓", "4/7=57% ✓"),
            layout("2+2+arbitrator (5 total)", "3/5=60% ✓", "3/5=60% ✓"),
            layout("3+2 (5 total, no arb)", "2/5=40% ✗", "3/5=60% ✓"),
        ],
        warning: "2 nodes per DC without arbitrator = CLUSTER FREEZE on DC failure (50% = no quorum)"
            .to_string(),
        semi_sync_description: "Semi-sync with local ACK has no cross-DC latency for writes"
            .to_string(),
        semi_sync_configuration:
            "Enable semi-sync on local DC replicas only, use async for remote DC".to_string(),
        semi_sync_dr_note: "Remote DC will lag behind (RPO > 0)".to_string(),
    }
}

fn galera_recommendation(
    galera: &TopologyOption,
    semi_sync: &TopologyOption,
    workload: &WorkloadCharacteristics,
) -> String {
    let mut parts = Vec::new();
    if galera.score >= semi_sync.score {
        parts.push(format!(
            "Galera score: {}, Semi-sync score: {}",
            galera.score, semi_sync.score
        ));
        parts.push("Current Galera topology is working. Migration has risk.".to_string());
    }
    if workload.certification_failures == 0 {
        parts.push("No certification conflicts detected - single-writer pattern.".to_string());
        parts.push("Semi-sync with local-DC ACK would provide FASTER writes.".to_string());
    }
    parts.push(
        "KEEP GALERA if: Need multi-master writes, zero RPO for DR, already working.".to_string(),
    );
    parts.push(
        "CONSIDER SEMI-SYNC if: Want faster writes, simpler operations, cost reduction."
            .to_string(),
    );
    parts.join(" | ")
}

/// Compare the candidate topologies for the request's workload.
pub fn compare_topologies(
    request: &ClusterReviewRequest,
    topology: TopologyType,
) -> ComparisonReport {
    let workload = workload_characteristics(request, topology);
    let galera = score_galera(&workload, request.nodes.len());
    let semi_sync = score_semi_sync(&workload);
    let async_option = score_async(&workload);
    log::debug!(
        "topology scores: galera={} semi_sync={} async={} (R/W {}:1)",
        galera.score,
        semi_sync.score,
        async_option.score,
        format_ratio(workload.read_write_ratio)
    );

    let recommendation = (topology == TopologyType::Galera)
        .then(|| galera_recommendation(&galera, &semi_sync, &workload));

    ComparisonReport {
        current_topology: topology,
        galera_suitable: galera.suitable,
        semi_sync_suitable: semi_sync.suitable,
        async_suitable: async_option.suitable,
        workload_characteristics: workload,
        topology_comparison: vec![galera, semi_sync, async_option],
        latency_comparison: latency_table(),
        multi_dc_considerations: multi_dc_considerations(),
        recommendation,
        semi_sync_failover_options: strings(SEMI_SYNC_FAILOVER_OPTIONS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::{NodeRole, NodeSnapshot, VarMap};

    fn galera_node(host: &str, commits: i64, cert_failures: i64, fc: f64) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(host, NodeRole::GaleraNode);
        node.global_status = VarMap::new()
            .with("Uptime", 1000)
            .with("Questions", 1_000_000)
            .with("Com_select", 800_000)
            .with("Com_insert", 100_000)
            .with("wsrep_local_commits", commits)
            .with("wsrep_local_cert_failures", cert_failures)
            .with("wsrep_flow_control_paused", fc);
        node
    }

    #[test]
    fn test_galera_writes_use_max_local_commits() {
        let request = ClusterReviewRequest::new(
            "g",
            TopologyType::Galera,
            vec![
                galera_node("g1", 50_000, 0, 0.0),
                galera_node("g2", 20_000, 0, 0.0),
                galera_node("g3", 0, 0, 0.0),
            ],
        );
        let workload = workload_characteristics(&request, TopologyType::Galera);
        assert_eq!(workload.writes_per_second, 50.0);
        assert_eq!(workload.reads_per_second, 2400.0);
        assert_eq!(workload.total_qps, 3000.0);
        assert_eq!(workload.read_write_ratio, Some(48.0));

        // The same nodes declared as replication sum their write rates.
        let workload = workload_characteristics(&request, TopologyType::MasterReplica);
        assert_eq!(workload.writes_per_second, 300.0);
    }

    #[test]
    fn test_cert_failure_sum_saturates() {
        let request = ClusterReviewRequest::new(
            "g",
            TopologyType::Galera,
            vec![
                galera_node("g1", 100, i64::MAX, 0.0),
                galera_node("g2", 100, i64::MAX, 0.0),
                galera_node("g3", 100, -5, 0.0),
            ],
        );
        let workload = workload_characteristics(&request, TopologyType::Galera);
        assert_eq!(workload.certification_failures, i64::MAX);
    }

    #[test]
    fn test_scores_for_conflicted_galera() {
        let request = ClusterReviewRequest::new(
            "g",
            TopologyType::Galera,
            vec![
                galera_node("g1", 700_000, 80, 0.2),
                galera_node("g2", 10, 80, 0.0),
                galera_node("g3", 10, 0, 0.0),
            ],
        );
        let report = compare_topologies(&request, TopologyType::Galera);
        let galera = report.option("galera").unwrap();
        // 90 - 10 (writes) - 20 (conflicts) - 15 (flow control) + 5 (quorum)
        assert_eq!(galera.score, 50);
        assert!(!galera.suitable);
        assert!(!report.galera_suitable);

        let semi = report.option("semi_sync").unwrap();
        // 75 with high writes, ratio ~3.4, conflicts present
        assert_eq!(semi.score, 75);
        assert!(semi.failover_options.len() == 5);

        let async_option = report.option("async_replication").unwrap();
        assert_eq!(async_option.score, 70);

        let rec = report.recommendation.unwrap();
        assert!(!rec.starts_with("Galera score"));
        assert!(rec.contains("KEEP GALERA"));
    }

    #[test]
    fn test_read_only_workload_and_caps() {
        let mut node = NodeSnapshot::new("db1", NodeRole::Master);
        node.global_status = VarMap::new()
            .with("Uptime", 100)
            .with("Com_select", 1000);
        let request = ClusterReviewRequest::new("r", TopologyType::MasterReplica, vec![node]);
        let report = compare_topologies(&request, TopologyType::MasterReplica);
        assert_eq!(report.workload_characteristics.read_write_ratio, None);
        // 75 + 10 + 10 + 5 = 100
        assert_eq!(report.option("semi_sync").unwrap().score, 100);
        // 90 - 5 (low writes, read-only)
        assert_eq!(report.option("galera").unwrap().score, 85);
        assert!(report.recommendation.is_none());
        assert_eq!(report.latency_comparison.len(), 4);
        assert!(report.multi_dc_considerations.warning.contains("CLUSTER FREEZE"));
    }
}
