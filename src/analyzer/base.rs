//! Topology-agnostic analysis shared by every topology analyzer.
//!
//! Covers per-node performance, cluster capacity and workload aggregation.
//! Node severities only move upward while the checks run.

use super::input::{ClusterReviewRequest, NodeSnapshot};
use super::metrics;
use super::thresholds::Thresholds;
use super::types::{
    ArchitectureAssessment, CapacityAssessment, Category, Finding, KeyInsights, LoadAnalysis,
    MetricAnalysis, NodeAnalysis, Severity, format_ratio, read_write_ratio,
};

/// Shared analysis routines bound to one threshold set.
#[derive(Debug, Clone, Copy)]
pub struct BaseAnalyzer<'a> {
    thresholds: &'a Thresholds,
}

impl<'a> BaseAnalyzer<'a> {
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &'a Thresholds {
        self.thresholds
    }

    // ========================================================================
    // Node performance
    // ========================================================================

    /// Evaluate QPS, connection utilization, buffer pool hit ratio and usage,
    /// and slow queries per hour for one node.
    pub fn analyze_node_performance(&self, node: &NodeSnapshot) -> NodeAnalysis {
        let server = &self.thresholds.server;
        let host = node.hostname.as_str();
        let mut analysis = NodeAnalysis {
            hostname: node.hostname.clone(),
            role: node.role.as_str().to_string(),
            ..NodeAnalysis::default()
        };

        let qps = metrics::queries_per_second(node);
        analysis.metrics.push(MetricAnalysis::new(
            "queries_per_second",
            qps,
            "qps",
            Severity::Info,
            format!("Current query rate: {qps:.2} queries/second"),
        ));

        // Connection utilization
        let conn_tier = &server.connection_utilization;
        let conn_util = metrics::connection_utilization(node);
        let conn_status = conn_tier.evaluate_high(conn_util);
        let conn_critical = conn_tier.critical_or(0.9);
        if conn_status == Severity::Critical {
            analysis.flag(
                Finding::new(
                    Severity::Critical,
                    Category::Capacity,
                    "Connection utilization critical",
                    format!("Connection utilization at {:.1}%", conn_util * 100.0),
                )
                .with_metric("connection_utilization", conn_util * 100.0)
                .with_threshold(conn_critical * 100.0)
                .with_node(host),
            );
        }
        analysis.status.escalate(conn_status);
        analysis.metrics.push(
            MetricAnalysis::new(
                "connection_utilization",
                conn_util * 100.0,
                "%",
                conn_status,
                format!(
                    "Max used connections: {} of {}",
                    node.status_int("Max_used_connections", 0),
                    node.variable_int("max_connections", 0)
                ),
            )
            .with_thresholds(conn_tier.warning_or(0.7) * 100.0, conn_critical * 100.0),
        );

        // Buffer pool hit ratio
        let hit_tier = &server.buffer_pool_hit_ratio;
        let hit_ratio = metrics::buffer_pool_hit_ratio(node);
        let hit_status = hit_tier.evaluate_low(hit_ratio);
        let hit_critical = hit_tier.critical_or(0.90);
        if hit_status == Severity::Critical {
            analysis.flag(
                Finding::new(
                    Severity::Critical,
                    Category::Performance,
                    "Buffer pool hit ratio critical",
                    format!(
                        "Buffer pool hit ratio at {:.2}% - too many disk reads",
                        hit_ratio * 100.0
                    ),
                )
                .with_metric("buffer_pool_hit_ratio", hit_ratio * 100.0)
                .with_threshold(hit_critical * 100.0)
                .with_node(host),
            );
        }
        analysis.status.escalate(hit_status);
        analysis.metrics.push(
            MetricAnalysis::new(
                "buffer_pool_hit_ratio",
                hit_ratio * 100.0,
                "%",
                hit_status,
                format!("Buffer pool efficiency: {:.2}%", hit_ratio * 100.0),
            )
            .with_thresholds(hit_tier.warning_or(0.95) * 100.0, hit_critical * 100.0),
        );

        let bp_usage = metrics::buffer_pool_usage(node);
        analysis.metrics.push(MetricAnalysis::new(
            "buffer_pool_usage",
            bp_usage * 100.0,
            "%",
            Severity::Info,
            format!("Buffer pool pages in use: {:.1}%", bp_usage * 100.0),
        ));

        // Slow queries
        let slow_tier = &server.slow_queries_per_hour;
        let slow_per_hour = metrics::slow_queries_per_hour(node);
        let slow_status = slow_tier.evaluate_high(slow_per_hour);
        if slow_status == Severity::Critical {
            analysis.flag(
                Finding::new(
                    Severity::Critical,
                    Category::Performance,
                    "High slow query rate",
                    format!("Slow queries: {slow_per_hour:.1}/hour"),
                )
                .with_metric("slow_queries_per_hour", slow_per_hour)
                .with_threshold(slow_tier.critical_or(500.0))
                .with_node(host),
            );
        }
        analysis.status.escalate(slow_status);
        analysis.metrics.push(
            MetricAnalysis::new(
                "slow_queries_per_hour",
                slow_per_hour,
                "queries/hour",
                slow_status,
                format!("Slow query rate: {slow_per_hour:.1} per hour"),
            )
            .with_thresholds(slow_tier.warning_or(100.0), slow_tier.critical_or(500.0)),
        );

        analysis.queries_per_second = Some(qps);
        analysis.connections_current = Some(node.status_int("Threads_connected", 0));
        analysis.connections_max_used = Some(node.status_int("Max_used_connections", 0));
        analysis.buffer_pool_hit_ratio = Some(hit_ratio);
        analysis
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    pub fn analyze_capacity(&self, request: &ClusterReviewRequest) -> CapacityAssessment {
        let resources = &self.thresholds.resources;
        let mut capacity = CapacityAssessment {
            cpu_assessment: Some("Unknown - no CPU data provided".to_string()),
            memory_assessment: Some("Unknown - no memory data provided".to_string()),
            disk_assessment: Some("Unknown - no disk data provided".to_string()),
            ..CapacityAssessment::default()
        };

        // Every node counts toward the averages; missing counters derive to 0.
        let mut conn_samples = Vec::with_capacity(request.nodes.len());
        let mut bp_samples = Vec::with_capacity(request.nodes.len());

        for node in &request.nodes {
            conn_samples.push(metrics::connection_utilization(node));
            bp_samples.push(metrics::buffer_pool_usage(node));

            let Some(res) = node.system_resources.as_ref() else {
                continue;
            };

            if let Some(used) = res.disk_used_gb.filter(|u| *u > 0.0 && res.disk_total_gb > 0.0) {
                let disk_pct = used / res.disk_total_gb;
                let label = match resources.disk.evaluate_high(disk_pct) {
                    Severity::Critical => {
                        capacity.is_undersized = true;
                        "CRITICAL"
                    }
                    Severity::Warning => "WARNING",
                    Severity::Info => "OK",
                };
                capacity.disk_assessment =
                    Some(format!("{label}: Disk usage at {:.1}%", disk_pct * 100.0));
            }

            if let Some(cpu) = res.cpu_utilization_pct {
                let cpu_pct = cpu / 100.0;
                let text = if resources.cpu.is_underutilized(cpu_pct) {
                    format!("Underutilized: CPU at {cpu:.1}%")
                } else {
                    match resources.cpu.evaluate_high(cpu_pct) {
                        Severity::Critical => {
                            capacity.is_undersized = true;
                            format!("CRITICAL: CPU at {cpu:.1}%")
                        }
                        Severity::Warning => format!("WARNING: CPU at {cpu:.1}%"),
                        Severity::Info => format!("OK: CPU at {cpu:.1}%"),
                    }
                };
                capacity.cpu_assessment = Some(text);
            }

            if let Some(mem) = res.ram_utilization_pct {
                let mem_pct = mem / 100.0;
                let text = if resources.memory.is_underutilized(mem_pct) {
                    capacity.is_oversized = true;
                    format!("Underutilized: Memory at {mem:.1}%")
                } else if resources.memory.evaluate_high(mem_pct) == Severity::Critical {
                    capacity.is_undersized = true;
                    format!("CRITICAL: Memory at {mem:.1}%")
                } else {
                    format!("OK: Memory at {mem:.1}%")
                };
                capacity.memory_assessment = Some(text);
            }
        }

        let avg_conn_util = mean(&conn_samples);
        if let Some(avg) = avg_conn_util {
            if self
                .thresholds
                .server
                .connection_utilization
                .is_underutilized(avg)
            {
                capacity.is_oversized = true;
                capacity.rightsizing_recommendations.push(format!(
                    "Connection utilization is low ({:.1}%). Consider reducing max_connections or node count.",
                    avg * 100.0
                ));
            }
        }

        if let Some(avg) = mean(&bp_samples) {
            if self.thresholds.server.buffer_pool_usage.is_underutilized(avg) {
                capacity.is_oversized = true;
                capacity.rightsizing_recommendations.push(format!(
                    "Buffer pool usage is low ({:.1}%). Consider reducing innodb_buffer_pool_size.",
                    avg * 100.0
                ));
            }
        }

        let (status, summary) = if capacity.is_undersized {
            (
                Severity::Critical,
                "Cluster resources are insufficient for current workload",
            )
        } else if capacity.is_oversized {
            (
                Severity::Warning,
                "Cluster appears to be over-provisioned for current workload",
            )
        } else {
            (
                Severity::Info,
                "Cluster capacity appears appropriate for current workload",
            )
        };
        capacity.status = status;
        capacity.summary = summary.to_string();
        capacity.connection_assessment = Some(match avg_conn_util {
            Some(avg) => format!("Average connection utilization: {:.1}%", avg * 100.0),
            None => "Unknown - no connection data provided".to_string(),
        });
        log::debug!(
            "capacity: undersized={} oversized={}",
            capacity.is_undersized,
            capacity.is_oversized
        );
        capacity
    }

    // ========================================================================
    // Load
    // ========================================================================

    pub fn analyze_load(&self, request: &ClusterReviewRequest) -> LoadAnalysis {
        let mut load = LoadAnalysis {
            can_handle_current_load: true,
            ..LoadAnalysis::default()
        };
        let conn_limit = self
            .thresholds
            .server
            .connection_utilization
            .critical_or(0.9);
        let hit_limit = self
            .thresholds
            .server
            .buffer_pool_hit_ratio
            .critical_or(0.90);

        for node in &request.nodes {
            load.total_queries_per_second += metrics::queries_per_second(node);
            load.total_writes_per_second += metrics::writes_per_second(node);
            load.total_reads_per_second += metrics::reads_per_second(node);
            load.slow_queries_per_hour += metrics::slow_queries_per_hour(node);
            load.total_current_connections = load
                .total_current_connections
                .saturating_add(node.status_int("Threads_connected", 0).max(0));
            load.total_max_connections = load
                .total_max_connections
                .saturating_add(node.variable_int("max_connections", 0).max(0));
            load.peak_connections_used = load
                .peak_connections_used
                .max(node.status_int("Max_used_connections", 0));

            // Both paths are evaluated for every node.
            if metrics::connection_utilization(node) > conn_limit {
                load.can_handle_current_load = false;
                load.status.escalate(Severity::Critical);
            }
            if metrics::buffer_pool_hit_ratio(node) < hit_limit {
                load.status.escalate(Severity::Warning);
            }
        }

        load.read_write_ratio =
            read_write_ratio(load.total_reads_per_second, load.total_writes_per_second);
        load.summary = format!(
            "Cluster processing {:.1} queries/sec (R/W ratio: {}:1)",
            load.total_queries_per_second,
            format_ratio(load.read_write_ratio)
        );
        load
    }

    // ========================================================================
    // Insights and status
    // ========================================================================

    /// Insights every topology reports.
    pub fn key_insights(
        &self,
        request: &ClusterReviewRequest,
        architecture: &ArchitectureAssessment,
        capacity: &CapacityAssessment,
        load: &LoadAnalysis,
    ) -> KeyInsights {
        let mut insights = KeyInsights::new();
        insights.insert("handling_current_load", load.can_handle_current_load);
        insights.insert("resources_sufficient", !capacity.is_undersized);
        insights.insert("is_oversized", capacity.is_oversized);
        insights.insert("topology_valid", architecture.topology_valid);
        insights.insert("ha_capable", architecture.ha_capable);
        insights.insert("quorum_capable", architecture.quorum_capable);
        insights.insert(
            "consider_downsizing",
            capacity.is_oversized && request.nodes.len() > 3,
        );
        insights.insert("read_write_ratio", load.read_write_ratio);
        insights.insert("queries_per_second", load.total_queries_per_second);
        insights
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Overall review severity from node, architecture and capacity results.
pub fn overall_status(
    nodes: &[NodeAnalysis],
    architecture: &ArchitectureAssessment,
    capacity: &CapacityAssessment,
) -> Severity {
    let mut status = nodes
        .iter()
        .map(|n| n.status)
        .max()
        .unwrap_or_default();
    status.escalate(architecture.status);
    if capacity.is_undersized {
        status.escalate(Severity::Critical);
    }
    if capacity.is_oversized {
        status.escalate(Severity::Warning);
    }
    status
}
