//! Cluster sizing and rightsizing.
//!
//! Per-node load and resource metrics, per-node scale up/down advice,
//! resource consistency across nodes, and a set of discrete rightsizing
//! options with a relative cost factor and risk level.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::input::{ClusterReviewRequest, NodeSnapshot, TopologyType};
use super::metrics;
use super::types::Severity;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// `max_connections` assumed when a node does not report it.
const DEFAULT_MAX_CONNECTIONS: i64 = 1000;

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSizing {
    pub node_count: usize,
    pub total_vcpus: u32,
    pub total_ram_gb: f64,
    pub total_disk_gb: f64,
    pub vcpus_per_node: f64,
    pub ram_per_node_gb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub avg_connection_utilization_pct: f64,
    /// Mean over nodes that report CPU utilization.
    pub avg_cpu_utilization_pct: Option<f64>,
    pub peak_connections_cluster: i64,
    pub total_qps_cluster: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadMetrics {
    pub qps: f64,
    pub writes_per_sec: f64,
    pub reads_per_sec: f64,
    pub commits_per_sec: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub max_connections: i64,
    pub max_used_connections: i64,
    pub threads_connected: i64,
    pub threads_running: i64,
    pub connection_utilization_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferPoolMetrics {
    /// `None` when the node served no buffer pool reads.
    pub hit_ratio_pct: Option<f64>,
    pub pages_total: i64,
    pub pages_data: i64,
    pub pages_free: i64,
    pub pages_dirty: i64,
    pub usage_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configured_size_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub vcpus: u32,
    pub ram_gb: f64,
    pub cpu_utilization_pct: Option<f64>,
    pub memory_utilization_pct: Option<f64>,
    /// Derived from QPS when no CPU utilization is reported.
    pub estimated_cpu_utilization_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSizing {
    pub hostname: String,
    pub uptime_hours: f64,
    pub load: LoadMetrics,
    pub connections: ConnectionMetrics,
    pub buffer_pool: BufferPoolMetrics,
    pub resources: ResourceMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingAction {
    #[default]
    Keep,
    ScaleDown,
    ScaleUp,
}

impl SizingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::ScaleDown => "scale_down",
            Self::ScaleUp => "scale_up",
        }
    }
}

impl fmt::Display for SizingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSizingRecommendation {
    pub hostname: String,
    pub current_vcpus: u32,
    pub current_ram_gb: f64,
    pub recommended_vcpus: u32,
    pub recommended_ram_gb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_buffer_pool_gb: Option<f64>,
    pub action: SizingAction,
    pub rationale: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResources {
    pub hostname: String,
    pub cpu_cores: Option<u32>,
    pub ram_gb: Option<f64>,
    pub disk_total_gb: Option<f64>,
    pub disk_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInconsistency {
    pub resource: String,
    pub severity: Severity,
    pub message: String,
    /// Hostnames grouped by resource value.
    pub details: BTreeMap<String, Vec<String>>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceConsistency {
    pub is_consistent: bool,
    pub inconsistencies: Vec<ResourceInconsistency>,
    pub node_resources: Vec<NodeResources>,
    pub recommendation: String,
}

/// Total, mean, max and min of a per-node series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub total: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

impl Spread {
    fn of(values: &[f64], places: i32) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let total: f64 = values.iter().sum();
        Some(Self {
            total: round_to(total, places),
            avg: round_to(total / values.len() as f64, places),
            max: round_to(values.iter().copied().fold(f64::MIN, f64::max), places),
            min: round_to(values.iter().copied().fold(f64::MAX, f64::min), places),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub qps: Option<Spread>,
    pub writes_per_sec: Option<Spread>,
    pub connection_utilization_pct: Option<Spread>,
    pub buffer_pool_hit_ratio_pct: Option<Spread>,
    pub cpu_utilization_pct: Option<Spread>,
    pub memory_utilization_pct: Option<Spread>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightsizingOption {
    pub option: String,
    pub node_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    pub vcpus_per_node: f64,
    pub ram_per_node_gb: f64,
    pub cost_factor: f64,
    pub risk_level: RiskLevel,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc_failure_behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingReport {
    pub current_sizing: CurrentSizing,
    pub utilization: Utilization,
    pub per_node_analysis: Vec<NodeSizing>,
    pub per_node_sizing_recommendations: Vec<NodeSizingRecommendation>,
    pub resource_consistency: ResourceConsistency,
    pub cluster_summary: ClusterSummary,
    pub rightsizing_options: Vec<RightsizingOption>,
    pub cost_impact: String,
}

impl SizingReport {
    pub fn option(&self, name: &str) -> Option<&RightsizingOption> {
        self.rightsizing_options.iter().find(|o| o.option == name)
    }
}

// ============================================================================
// Analysis
// ============================================================================

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn connection_utilization_pct(node: &NodeSnapshot) -> (i64, i64, f64) {
    let max_connections = node.variable_int("max_connections", DEFAULT_MAX_CONNECTIONS);
    let max_used = node.status_int("Max_used_connections", 0);
    let pct = if max_connections > 0 {
        (max_used as f64 / max_connections as f64 * 100.0).max(0.0)
    } else {
        0.0
    };
    (max_connections, max_used, pct)
}

pub fn current_sizing(request: &ClusterReviewRequest) -> CurrentSizing {
    let mut sizing = CurrentSizing {
        node_count: request.nodes.len(),
        ..CurrentSizing::default()
    };
    for res in request.nodes.iter().filter_map(|n| n.system_resources.as_ref()) {
        sizing.total_vcpus = sizing.total_vcpus.saturating_add(res.cpu_cores);
        sizing.total_ram_gb += res.ram_gb;
        sizing.total_disk_gb += res.disk_total_gb;
    }
    if sizing.node_count > 0 {
        sizing.vcpus_per_node = sizing.total_vcpus as f64 / sizing.node_count as f64;
        sizing.ram_per_node_gb = sizing.total_ram_gb / sizing.node_count as f64;
    }
    sizing
}

pub fn utilization(request: &ClusterReviewRequest) -> Utilization {
    let mut conn = Vec::new();
    let mut cpu = Vec::new();
    let mut peak = 0;
    let mut qps = 0.0;
    for node in &request.nodes {
        let (_, max_used, pct) = connection_utilization_pct(node);
        conn.push(pct);
        peak = peak.max(max_used);
        qps += metrics::queries_per_second(node);
        if let Some(c) = node
            .system_resources
            .as_ref()
            .and_then(|r| r.cpu_utilization_pct)
        {
            cpu.push(c);
        }
    }
    Utilization {
        avg_connection_utilization_pct: round_to(mean(&conn).unwrap_or(0.0), 1),
        avg_cpu_utilization_pct: mean(&cpu).map(|c| round_to(c, 1)),
        peak_connections_cluster: peak,
        total_qps_cluster: round_to(qps, 1),
    }
}

fn analyze_node(node: &NodeSnapshot) -> NodeSizing {
    let (max_connections, max_used, conn_pct) = connection_utilization_pct(node);
    let requests = node.status_int("Innodb_buffer_pool_read_requests", 0);
    let pages_total = node.status_int("Innodb_buffer_pool_pages_total", 0);

    let (vcpus, ram_gb, cpu_pct, mem_pct) = match node.system_resources.as_ref() {
        Some(r) => (r.cpu_cores, r.ram_gb, r.cpu_utilization_pct, r.ram_utilization_pct),
        None => (0, 0.0, None, None),
    };
    let qps = metrics::queries_per_second(node);
    let estimated = (cpu_pct.is_none() && vcpus > 0)
        .then(|| round_to((qps / (vcpus as f64 * 100.0) * 10.0).min(100.0), 1));

    let mut buffer_pool = BufferPoolMetrics {
        hit_ratio_pct: (requests > 0)
            .then(|| round_to(metrics::buffer_pool_hit_ratio(node) * 100.0, 2)),
        pages_total,
        pages_data: node.status_int("Innodb_buffer_pool_pages_data", 0),
        pages_free: node.status_int("Innodb_buffer_pool_pages_free", 0),
        pages_dirty: node.status_int("Innodb_buffer_pool_pages_dirty", 0),
        usage_pct: if pages_total > 0 {
            round_to(metrics::buffer_pool_usage(node) * 100.0, 1)
        } else {
            0.0
        },
        ..BufferPoolMetrics::default()
    };
    let pool_gb = node.variable_int("innodb_buffer_pool_size", 0).max(0) as f64 / GIB;
    if ram_gb > 0.0 && pool_gb > 0.0 {
        buffer_pool.configured_size_gb = Some(round_to(pool_gb, 2));
        buffer_pool.ram_percentage = Some(round_to(pool_gb / ram_gb * 100.0, 1));
    }

    NodeSizing {
        hostname: node.hostname.clone(),
        uptime_hours: round_to(metrics::uptime_seconds(node).max(0.0) / 3600.0, 1),
        load: LoadMetrics {
            qps: round_to(qps, 1),
            writes_per_sec: round_to(metrics::writes_per_second(node), 1),
            reads_per_sec: round_to(metrics::reads_per_second(node), 1),
            commits_per_sec: round_to(
                node.status_int("Com_commit", 0).max(0) as f64
                    / metrics::uptime_seconds(node).max(1.0),
                1,
            ),
        },
        connections: ConnectionMetrics {
            max_connections,
            max_used_connections: max_used,
            threads_connected: node.status_int("Threads_connected", 0),
            threads_running: node.status_int("Threads_running", 0),
            connection_utilization_pct: round_to(conn_pct, 1),
        },
        buffer_pool,
        resources: ResourceMetrics {
            vcpus,
            ram_gb,
            cpu_utilization_pct: cpu_pct,
            memory_utilization_pct: mem_pct,
            estimated_cpu_utilization_pct: estimated,
        },
    }
}

fn recommend_node(analysis: &NodeSizing) -> NodeSizingRecommendation {
    let res = &analysis.resources;
    let mut rec = NodeSizingRecommendation {
        hostname: analysis.hostname.clone(),
        current_vcpus: res.vcpus,
        current_ram_gb: res.ram_gb,
        recommended_vcpus: res.vcpus,
        recommended_ram_gb: res.ram_gb,
        ..NodeSizingRecommendation::default()
    };

    if let Some(cpu) = res.cpu_utilization_pct.or(res.estimated_cpu_utilization_pct) {
        if cpu < 20.0 && res.vcpus >= 8 {
            rec.recommended_vcpus = (res.vcpus / 2).max(4);
            rec.action = SizingAction::ScaleDown;
            rec.rationale.push(format!(
                "Low CPU utilization ({cpu:.1}%) - can reduce vCPUs"
            ));
        } else if cpu > 80.0 {
            rec.recommended_vcpus = res.vcpus.saturating_mul(2).min(32);
            rec.action = SizingAction::ScaleUp;
            rec.rationale.push(format!(
                "High CPU utilization ({cpu:.1}%) - consider adding vCPUs"
            ));
        }
    }

    let conn = &analysis.connections;
    if conn.connection_utilization_pct < 20.0 && conn.max_connections >= 500 {
        rec.rationale.push(format!(
            "Connection utilization low ({:.1}%) - max_connections can be reduced",
            conn.connection_utilization_pct
        ));
    } else if conn.connection_utilization_pct > 80.0 {
        rec.rationale.push(format!(
            "High connection utilization ({:.1}%) - consider increasing max_connections",
            conn.connection_utilization_pct
        ));
    }

    let bp = &analysis.buffer_pool;
    if let Some(hit) = bp.hit_ratio_pct.filter(|h| *h > 0.0 && *h < 95.0) {
        rec.rationale.push(format!(
            "Buffer pool hit ratio low ({hit:.1}%) - consider increasing innodb_buffer_pool_size"
        ));
    }
    if bp.pages_total > 0 && bp.pages_free < 100 {
        let free_pct = bp.pages_free.max(0) as f64 / bp.pages_total as f64 * 100.0;
        if free_pct < 5.0 {
            rec.rationale.push(format!(
                "Buffer pool nearly full ({free_pct:.1}% free) - may need more RAM"
            ));
        }
    }

    if let (Some(size_gb), Some(ram_pct)) = (bp.configured_size_gb, bp.ram_percentage) {
        if ram_pct < 50.0 {
            let target = round_to(res.ram_gb * 0.70, 1);
            rec.rationale.push(format!(
                "Buffer pool undersized: {size_gb:.1}GB = {ram_pct:.0}% of RAM. Thumb rule: 70-75% for dedicated DB servers. Recommend: {target}GB"
            ));
            rec.recommended_buffer_pool_gb = Some(target);
        } else if ram_pct > 85.0 {
            rec.rationale.push(format!(
                "Buffer pool may be oversized: {size_gb:.1}GB = {ram_pct:.0}% of RAM. Leave 15-25% for OS and connections. Consider reducing to {}GB",
                round_to(res.ram_gb * 0.75, 1)
            ));
        } else if (70.0..=80.0).contains(&ram_pct) {
            rec.rationale.push(format!(
                "Buffer pool well-sized: {size_gb:.1}GB = {ram_pct:.0}% of RAM (optimal: 70-75%)"
            ));
        }
    }

    if rec.rationale.is_empty() {
        rec.rationale
            .push("Node is appropriately sized for current workload".to_string());
    }
    rec
}

/// Hostnames grouped by a resource value, keyed by its label.
fn group_hosts<F>(nodes: &[&NodeResources], label: F) -> BTreeMap<String, Vec<String>>
where
    F: Fn(&NodeResources) -> Option<String>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in nodes {
        if let Some(key) = label(node) {
            groups.entry(key).or_default().push(node.hostname.clone());
        }
    }
    groups
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn resource_consistency(request: &ClusterReviewRequest) -> ResourceConsistency {
    let node_resources: Vec<NodeResources> = request
        .nodes
        .iter()
        .map(|node| match node.system_resources.as_ref() {
            Some(r) => NodeResources {
                hostname: node.hostname.clone(),
                cpu_cores: Some(r.cpu_cores),
                ram_gb: Some(r.ram_gb),
                disk_total_gb: Some(r.disk_total_gb),
                disk_type: r.disk_type.clone(),
            },
            None => NodeResources {
                hostname: node.hostname.clone(),
                cpu_cores: None,
                ram_gb: None,
                disk_total_gb: None,
                disk_type: None,
            },
        })
        .collect();

    let mut consistency = ResourceConsistency {
        is_consistent: true,
        ..ResourceConsistency::default()
    };
    let reporting: Vec<&NodeResources> =
        node_resources.iter().filter(|n| n.cpu_cores.is_some()).collect();

    if reporting.len() >= 2 {
        let cpu = group_hosts(&reporting, |n| n.cpu_cores.map(|c| format!("{c} vCPUs")));
        if cpu.len() > 1 {
            let (lo, hi) = min_max(reporting.iter().filter_map(|n| n.cpu_cores.map(f64::from)))
                .unwrap_or_default();
            consistency.inconsistencies.push(ResourceInconsistency {
                resource: "cpu_cores".to_string(),
                severity: Severity::Warning,
                message: format!("CPU cores vary across nodes: {lo} to {hi} vCPUs"),
                details: cpu,
                recommendation: format!(
                    "Standardize all nodes to {hi} vCPUs for consistent performance"
                ),
            });
        }

        let ram = group_hosts(&reporting, |n| n.ram_gb.map(|r| format!("{r} GB")));
        if ram.len() > 1 {
            let (lo, hi) =
                min_max(reporting.iter().filter_map(|n| n.ram_gb)).unwrap_or_default();
            consistency.inconsistencies.push(ResourceInconsistency {
                resource: "ram_gb".to_string(),
                severity: Severity::Warning,
                message: format!("RAM varies across nodes: {lo}GB to {hi}GB"),
                details: ram,
                recommendation: format!(
                    "Standardize all nodes to {hi}GB RAM for consistent performance"
                ),
            });
        }

        let disks = reporting
            .iter()
            .filter_map(|n| n.disk_total_gb)
            .filter(|d| *d > 0.0);
        if let Some((lo, hi)) = min_max(disks) {
            if hi > 0.0 && (hi - lo) / hi > 0.10 {
                consistency.inconsistencies.push(ResourceInconsistency {
                    resource: "disk_total_gb".to_string(),
                    severity: Severity::Warning,
                    message: format!("Disk capacity varies across nodes: {lo}GB to {hi}GB"),
                    details: group_hosts(&reporting, |n| {
                        n.disk_total_gb.filter(|d| *d > 0.0).map(|d| format!("{d} GB"))
                    }),
                    recommendation: "Ensure all nodes have sufficient and consistent disk capacity"
                        .to_string(),
                });
            }
        }

        let types: BTreeSet<&str> = reporting
            .iter()
            .filter_map(|n| n.disk_type.as_deref())
            .collect();
        if types.len() > 1 {
            consistency.inconsistencies.push(ResourceInconsistency {
                resource: "disk_type".to_string(),
                severity: Severity::Critical,
                message: format!(
                    "Disk types vary across nodes: {}",
                    types.iter().copied().collect::<Vec<_>>().join(", ")
                ),
                details: group_hosts(&reporting, |n| n.disk_type.clone()),
                recommendation: "CRITICAL: All nodes should use same storage type (SSD/NVMe recommended). Mixed storage causes performance inconsistencies and replication lag.".to_string(),
            });
        }

        consistency.is_consistent = consistency.inconsistencies.is_empty();
        consistency.recommendation = if consistency.is_consistent {
            "All nodes have consistent resource allocation (CPU, RAM, storage). This is optimal for cluster performance.".to_string()
        } else {
            "Resource inconsistencies detected across cluster nodes. For Galera/Semi-Sync/Async replication, all nodes should have equivalent CPU, RAM, and storage resources to ensure consistent performance and prevent replication lag or flow control issues.".to_string()
        };
    }

    consistency.node_resources = node_resources;
    consistency
}

fn series<F>(nodes: &[NodeSizing], value: F) -> Vec<f64>
where
    F: Fn(&NodeSizing) -> Option<f64>,
{
    nodes.iter().filter_map(value).collect()
}

fn cluster_summary(nodes: &[NodeSizing]) -> ClusterSummary {
    ClusterSummary {
        qps: Spread::of(&series(nodes, |n| Some(n.load.qps)), 1),
        writes_per_sec: Spread::of(&series(nodes, |n| Some(n.load.writes_per_sec)), 1),
        connection_utilization_pct: Spread::of(
            &series(nodes, |n| Some(n.connections.connection_utilization_pct)),
            1,
        ),
        buffer_pool_hit_ratio_pct: Spread::of(
            &series(nodes, |n| n.buffer_pool.hit_ratio_pct.filter(|h| *h > 0.0)),
            2,
        ),
        cpu_utilization_pct: Spread::of(&series(nodes, |n| n.resources.cpu_utilization_pct), 1),
        memory_utilization_pct: Spread::of(
            &series(nodes, |n| n.resources.memory_utilization_pct),
            1,
        ),
    }
}

fn rightsizing_options(
    topology: TopologyType,
    sizing: &CurrentSizing,
    utilization: &Utilization,
) -> Vec<RightsizingOption> {
    let option = |name: &str, nodes: usize, cost: f64, risk: RiskLevel, notes: &str| {
        RightsizingOption {
            option: name.to_string(),
            node_count: nodes,
            configuration: None,
            vcpus_per_node: sizing.vcpus_per_node,
            ram_per_node_gb: sizing.ram_per_node_gb,
            cost_factor: cost,
            risk_level: risk,
            notes: notes.to_string(),
            dc_failure_behavior: None,
            recommendation: None,
        }
    };

    let mut options = vec![option(
        "current",
        sizing.node_count,
        1.0,
        RiskLevel::Low,
        "Current configuration - maximum redundancy",
    )];

    if topology == TopologyType::Galera && sizing.node_count >= 6 {
        options.push(RightsizingOption {
            configuration: Some("2 nodes per DC + 1 arbitrator (cloud)".to_string()),
            dc_failure_behavior: Some(
                "Cluster continues with 3/5 nodes (quorum maintained)".to_string(),
            ),
            ..option(
                "reduced_5_node_with_arbitrator",
                5,
                0.72,
                RiskLevel::Low,
                "SAFE: 2+2+arb maintains quorum on DC failure (3/5=60%)",
            )
        });
        options.push(RightsizingOption {
            configuration: Some("2 nodes per DC, NO arbitrator".to_string()),
            dc_failure_behavior: Some(
                "CLUSTER FREEZES - no reads or writes possible".to_string(),
            ),
            recommendation: Some(
                "DO NOT USE without arbitrator or asymmetric node distribution".to_string(),
            ),
            ..option(
                "reduced_4_node_WARNING",
                4,
                0.67,
                RiskLevel::Critical,
                "UNSAFE: 2+2 = CLUSTER FREEZE on DC failure (2/4=50% = NO quorum)",
            )
        });
        options.push(RightsizingOption {
            configuration: Some("3 nodes in single DC (no DR)".to_string()),
            dc_failure_behavior: Some("Complete outage if DC fails".to_string()),
            ..option(
                "minimum_3_node_single_dc",
                3,
                0.5,
                RiskLevel::High,
                "Minimum for quorum - ~50% cost savings but NO disaster recovery",
            )
        });
    }

    let cpu_low = utilization
        .avg_cpu_utilization_pct
        .is_none_or(|cpu| cpu < 30.0);
    if utilization.avg_connection_utilization_pct < 30.0 && cpu_low && sizing.vcpus_per_node >= 8.0 {
        options.push(RightsizingOption {
            vcpus_per_node: (sizing.vcpus_per_node / 2.0).floor(),
            ram_per_node_gb: (sizing.ram_per_node_gb / 2.0).floor(),
            ..option(
                "smaller_nodes",
                sizing.node_count,
                0.5,
                RiskLevel::Medium,
                &format!(
                    "Half-sized nodes - utilization suggests {} vCPUs may be excessive",
                    sizing.vcpus_per_node
                ),
            )
        });
    }
    options
}

fn cost_impact(utilization: &Utilization) -> &'static str {
    let avg = utilization.avg_connection_utilization_pct;
    if avg < 25.0 {
        "Cluster appears over-provisioned. 30-50% cost reduction possible with minimal risk."
    } else if avg < 50.0 {
        "Cluster has good headroom. Minor rightsizing possible if needed."
    } else {
        "Cluster is well-utilized. Current sizing is appropriate."
    }
}

/// Run the full sizing analysis.
pub fn analyze_sizing(request: &ClusterReviewRequest, topology: TopologyType) -> SizingReport {
    let current = current_sizing(request);
    let utilization = utilization(request);
    let per_node: Vec<NodeSizing> = request.nodes.iter().map(analyze_node).collect();
    let recommendations = per_node.iter().map(recommend_node).collect();
    let options = rightsizing_options(topology, &current, &utilization);
    log::debug!(
        "sizing: {} nodes, {} rightsizing options",
        current.node_count,
        options.len()
    );

    SizingReport {
        cluster_summary: cluster_summary(&per_node),
        resource_consistency: resource_consistency(request),
        cost_impact: cost_impact(&utilization).to_string(),
        rightsizing_options: options,
        per_node_sizing_recommendations: recommendations,
        per_node_analysis: per_node,
        current_sizing: current,
        utilization,
    }
}
