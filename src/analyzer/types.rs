//! Core result types for a cluster review.
//!
//! Every analyzer emits [`Finding`]s and [`Recommendation`]s into a
//! [`ReviewFindings`] accumulator that is created per call and returned by
//! value. The orchestrator composes the pieces into a [`ClusterReviewResponse`].

use super::input::TopologyType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Severity
// ============================================================================

/// Severity of a finding, metric or assessment.
///
/// Ordered `Info < Warning < Critical`. Escalation through [`Severity::escalate`]
/// only ever moves upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Parse a severity from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }

    /// Raise to `other` if it is more severe. Never lowers.
    pub fn escalate(&mut self, other: Severity) {
        if other > *self {
            *self = other;
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// Category and Effort
// ============================================================================

/// Area a finding or recommendation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Performance,
    Capacity,
    Availability,
    Configuration,
    Security,
    Replication,
    Resource,
    Storage,
    Galera,
    Network,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Capacity => "capacity",
            Self::Availability => "availability",
            Self::Configuration => "configuration",
            Self::Security => "security",
            Self::Replication => "replication",
            Self::Resource => "resource",
            Self::Storage => "storage",
            Self::Galera => "galera",
            Self::Network => "network",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Effort needed to apply a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    #[default]
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Findings and Recommendations
// ============================================================================

/// A single observation about the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_node: Option<String>,
}

impl Finding {
    pub fn new(
        severity: Severity,
        category: Category,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            title: title.into(),
            description: description.into(),
            details: None,
            metric_name: None,
            metric_value: None,
            threshold: None,
            affected_node: None,
        }
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.affected_node = Some(node.into());
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metric_name = Some(name.into());
        self.metric_value = Some(value);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A prioritized action. Priority 1 is the most urgent, 5 the least.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: u8,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub action: String,
    pub impact: String,
    pub effort: Effort,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_findings: Vec<String>,
}

impl Recommendation {
    pub fn new(
        priority: u8,
        category: Category,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            priority: priority.clamp(1, 5),
            category,
            title: title.into(),
            description: description.into(),
            action: String::new(),
            impact: String::new(),
            effort: Effort::Medium,
            related_findings: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.effort = effort;
        self
    }

    pub fn with_related(mut self, finding_title: impl Into<String>) -> Self {
        self.related_findings.push(finding_title.into());
        self
    }
}

/// Per-call accumulator threaded through the analyzers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewFindings {
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
}

impl ReviewFindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finding(&mut self, finding: Finding) {
        log::debug!(
            "finding [{}] {}: {}",
            finding.severity,
            finding.category,
            finding.title
        );
        self.findings.push(finding);
    }

    pub fn recommend(&mut self, recommendation: Recommendation) {
        log::debug!(
            "recommendation p{} {}",
            recommendation.priority,
            recommendation.title
        );
        self.recommendations.push(recommendation);
    }

    pub fn extend(&mut self, other: ReviewFindings) {
        self.findings.extend(other.findings);
        self.recommendations.extend(other.recommendations);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Highest severity among collected findings.
    pub fn max_severity(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or_default()
    }
}

// ============================================================================
// Metric and Node Analysis
// ============================================================================

/// One reported metric with its evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_warning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_critical: Option<f64>,
}

impl MetricAnalysis {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        status: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            status,
            description: description.into(),
            threshold_warning: None,
            threshold_critical: None,
        }
    }

    pub fn with_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.threshold_warning = Some(warning);
        self.threshold_critical = Some(critical);
        self
    }
}

/// Analysis of a single node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalysis {
    pub hostname: String,
    pub role: String,
    pub status: Severity,
    pub metrics: Vec<MetricAnalysis>,
    pub findings: Vec<Finding>,
    pub queries_per_second: Option<f64>,
    pub connections_current: Option<i64>,
    pub connections_max_used: Option<i64>,
    pub buffer_pool_hit_ratio: Option<f64>,
    pub wsrep_ready: Option<bool>,
    pub wsrep_cluster_status: Option<String>,
    pub wsrep_flow_control_paused: Option<f64>,
    pub seconds_behind_master: Option<f64>,
    pub slave_io_running: Option<bool>,
    pub slave_sql_running: Option<bool>,
}

impl NodeAnalysis {
    /// Record a finding on the node and escalate its status.
    pub fn flag(&mut self, finding: Finding) {
        self.status.escalate(finding.severity);
        self.findings.push(finding);
    }
}

// ============================================================================
// Cluster Assessments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureAssessment {
    pub topology_type: TopologyType,
    pub topology_valid: bool,
    pub status: Severity,
    pub summary: String,
    pub node_count: usize,
    pub expected_node_count: Option<usize>,
    pub ha_capable: bool,
    pub quorum_capable: bool,
    pub replication_healthy: Option<bool>,
    pub replication_lag_seconds: Option<f64>,
    pub galera_cluster_size: Option<i64>,
    pub galera_cluster_status: Option<String>,
    pub galera_flow_control_issues: Option<bool>,
    pub proxy_present: bool,
    pub proxy_healthy: Option<bool>,
    pub architecture_recommendations: Vec<String>,
    pub consider_alternatives: Vec<String>,
}

impl ArchitectureAssessment {
    pub fn new(topology_type: TopologyType, node_count: usize) -> Self {
        Self {
            topology_type,
            topology_valid: true,
            status: Severity::Info,
            summary: String::new(),
            node_count,
            expected_node_count: None,
            ha_capable: false,
            quorum_capable: false,
            replication_healthy: None,
            replication_lag_seconds: None,
            galera_cluster_size: None,
            galera_cluster_status: None,
            galera_flow_control_issues: None,
            proxy_present: false,
            proxy_healthy: None,
            architecture_recommendations: Vec::new(),
            consider_alternatives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityAssessment {
    pub status: Severity,
    pub summary: String,
    pub cpu_assessment: Option<String>,
    pub memory_assessment: Option<String>,
    pub disk_assessment: Option<String>,
    pub connection_assessment: Option<String>,
    pub is_oversized: bool,
    pub is_undersized: bool,
    pub rightsizing_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAnalysis {
    pub status: Severity,
    pub summary: String,
    pub total_queries_per_second: f64,
    pub total_writes_per_second: f64,
    pub total_reads_per_second: f64,
    /// Reads per write. `None` when writes are zero and reads are not.
    pub read_write_ratio: Option<f64>,
    pub total_current_connections: i64,
    pub total_max_connections: i64,
    pub peak_connections_used: i64,
    pub slow_queries_per_hour: f64,
    pub can_handle_current_load: bool,
}

/// Reads per write with an undefined result for a write-free workload.
pub fn read_write_ratio(reads: f64, writes: f64) -> Option<f64> {
    if writes > 0.0 {
        Some(reads / writes)
    } else if reads > 0.0 {
        None
    } else {
        Some(0.0)
    }
}

/// True when `ratio` is above `bound`; an undefined ratio exceeds every bound.
pub fn ratio_exceeds(ratio: Option<f64>, bound: f64) -> bool {
    ratio.is_none_or(|r| r > bound)
}

/// True when `ratio` is below `bound`; an undefined ratio never is.
pub fn ratio_below(ratio: Option<f64>, bound: f64) -> bool {
    ratio.is_some_and(|r| r < bound)
}

/// Human form of a read:write ratio.
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{r:.1}"),
        None => "∞".to_string(),
    }
}

// ============================================================================
// Key Insights
// ============================================================================

/// Free-form map of cross-analyzer facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyInsights(BTreeMap<String, Value>);

impl KeyInsights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

// ============================================================================
// Response
// ============================================================================

/// The complete review of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReviewResponse {
    pub cluster_name: String,
    pub topology_type: TopologyType,
    pub review_timestamp: DateTime<Utc>,
    pub overall_status: Severity,
    pub overall_summary: String,
    pub architecture: ArchitectureAssessment,
    pub capacity: CapacityAssessment,
    pub load: LoadAnalysis,
    pub nodes: Vec<NodeAnalysis>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub key_insights: KeyInsights,
}

impl ClusterReviewResponse {
    pub fn critical_count(&self) -> usize {
        self.findings.iter().filter(|f| f.severity.is_critical()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    /// Sort recommendations by priority, keeping insertion order for ties.
    pub fn sort_recommendations(&mut self) {
        self.recommendations.sort_by_key(|r| r.priority);
    }
}
