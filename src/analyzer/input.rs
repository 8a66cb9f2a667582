//! Input models for a cluster review.
//!
//! A review request is a captured snapshot: `SHOW GLOBAL STATUS`,
//! `SHOW GLOBAL VARIABLES`, replication status and optional OS resources per
//! node, plus an optional proxy (MaxScale) record. Values arrive loosely
//! typed, so every numeric read goes through [`VarMap`], which never fails
//! and falls back to a caller-supplied default.

use crate::error::{Result, ReviewError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Topology and Roles
// ============================================================================

/// Supported deployment topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyType {
    Standalone,
    MasterReplica,
    SemiSync,
    Galera,
}

impl TopologyType {
    /// Parse a topology name, accepting a few common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "standalone" => Some(Self::Standalone),
            "master_replica" | "async" | "replication" => Some(Self::MasterReplica),
            "semi_sync" | "semisync" => Some(Self::SemiSync),
            "galera" => Some(Self::Galera),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::MasterReplica => "master_replica",
            Self::SemiSync => "semi_sync",
            Self::Galera => "galera",
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TopologyType {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| ReviewError::UnsupportedTopology(s.to_string()))
    }
}

/// Role of a node within its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    #[default]
    Standalone,
    Master,
    Replica,
    GaleraNode,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Master => "master",
            Self::Replica => "replica",
            Self::GaleraNode => "galera_node",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Variable Maps
// ============================================================================

/// A loosely typed map of server variables.
///
/// Values may be JSON strings, numbers, booleans or null. All getters are
/// total: a missing key, a null, or a value that does not parse yields the
/// default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarMap(BTreeMap<String, Value>);

impl VarMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning self for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String form of a value. Booleans render as `ON`/`OFF`; null is absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("ON".to_string()),
            Value::Bool(false) => Some("OFF".to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Integer value. Floats truncate; strings must be plain integers.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.0.get(key) {
            Some(value) => value_as_int(value).unwrap_or(default),
            None => default,
        }
    }

    /// Finite float value.
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.0.get(key) {
            Some(value) => value_as_float(value).unwrap_or(default),
            None => default,
        }
    }

    /// Integer value honouring `K`/`M`/`G` size suffixes (`128M`, `1.5G`).
    pub fn get_size_bytes(&self, key: &str, default: i64) -> i64 {
        match self.0.get(key) {
            Some(Value::String(s)) => parse_size_bytes(s).unwrap_or(default),
            Some(value) => value_as_int(value).unwrap_or(default),
            None => default,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VarMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn value_as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn value_as_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parse a size string such as `134217728`, `128M` or `1.5G` into bytes.
pub fn parse_size_bytes(raw: &str) -> Option<i64> {
    let upper = raw.trim().to_uppercase();
    let (mantissa, multiplier) = if let Some(m) = upper.strip_suffix('G') {
        (m, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(m) = upper.strip_suffix('M') {
        (m, 1024.0 * 1024.0)
    } else if let Some(m) = upper.strip_suffix('K') {
        (m, 1024.0)
    } else {
        return upper.parse::<i64>().ok();
    };
    let value = mantissa.trim().parse::<f64>().ok()?;
    let bytes = value * multiplier;
    bytes.is_finite().then_some(bytes as i64)
}

// ============================================================================
// Node Snapshot
// ============================================================================

/// OS-level resource information for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemResources {
    pub cpu_cores: u32,
    pub ram_gb: f64,
    pub disk_total_gb: f64,
    #[serde(default)]
    pub disk_used_gb: Option<f64>,
    #[serde(default = "default_mount_point")]
    pub disk_mount_point: String,
    #[serde(default)]
    pub disk_type: Option<String>,
    #[serde(default)]
    pub cpu_utilization_pct: Option<f64>,
    #[serde(default)]
    pub ram_utilization_pct: Option<f64>,
    #[serde(default)]
    pub iops_read: Option<f64>,
    #[serde(default)]
    pub iops_write: Option<f64>,
}

fn default_mount_point() -> String {
    "/data01".to_string()
}

impl SystemResources {
    pub fn new(cpu_cores: u32, ram_gb: f64, disk_total_gb: f64) -> Self {
        Self {
            cpu_cores,
            ram_gb,
            disk_total_gb,
            disk_used_gb: None,
            disk_mount_point: default_mount_point(),
            disk_type: None,
            cpu_utilization_pct: None,
            ram_utilization_pct: None,
            iops_read: None,
            iops_write: None,
        }
    }
}

/// Captured state of one MariaDB server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub hostname: String,
    #[serde(default)]
    pub role: NodeRole,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub global_status: VarMap,
    #[serde(default)]
    pub global_variables: VarMap,
    #[serde(default)]
    pub slave_status: Option<VarMap>,
    #[serde(default)]
    pub master_status: Option<VarMap>,
    #[serde(default)]
    pub wsrep_status: Option<VarMap>,
    #[serde(default)]
    pub system_resources: Option<SystemResources>,
    #[serde(default)]
    pub uptime_seconds: Option<i64>,
    #[serde(default)]
    pub error_log: Option<String>,
    #[serde(default, alias = "slow_query_log")]
    pub slow_log: Option<String>,
}

impl NodeSnapshot {
    pub fn new(hostname: impl Into<String>, role: NodeRole) -> Self {
        Self {
            hostname: hostname.into(),
            role,
            ..Self::default()
        }
    }

    pub fn status_int(&self, key: &str, default: i64) -> i64 {
        self.global_status.get_int(key, default)
    }

    pub fn status_float(&self, key: &str, default: f64) -> f64 {
        self.global_status.get_float(key, default)
    }

    pub fn status_str(&self, key: &str) -> Option<String> {
        self.global_status.get_str(key)
    }

    pub fn variable_str(&self, key: &str) -> Option<String> {
        self.global_variables.get_str(key)
    }

    /// Configuration integer with size suffix support.
    pub fn variable_int(&self, key: &str, default: i64) -> i64 {
        self.global_variables.get_size_bytes(key, default)
    }

    /// A variable compared case-insensitively against `ON`, `1` or `TRUE`.
    pub fn variable_enabled(&self, key: &str) -> bool {
        self.variable_str(key)
            .map(|v| matches!(v.trim().to_uppercase().as_str(), "ON" | "1" | "TRUE"))
            .unwrap_or(false)
    }

    /// Look up a wsrep value in the dedicated map first, then in global status.
    fn wsrep_value(&self, key: &str) -> Option<&Value> {
        self.wsrep_status
            .as_ref()
            .and_then(|m| m.get(key))
            .or_else(|| self.global_status.get(key))
    }

    pub fn wsrep_str(&self, key: &str) -> Option<String> {
        match self.wsrep_status.as_ref() {
            Some(m) if m.contains_key(key) => m.get_str(key),
            _ => self.global_status.get_str(key),
        }
    }

    pub fn wsrep_float(&self, key: &str, default: f64) -> f64 {
        self.wsrep_value(key)
            .and_then(value_as_float)
            .unwrap_or(default)
    }

    pub fn wsrep_int(&self, key: &str, default: i64) -> i64 {
        self.wsrep_value(key).and_then(value_as_int).unwrap_or(default)
    }

    pub fn slave_str(&self, key: &str) -> Option<String> {
        self.slave_status.as_ref().and_then(|m| m.get_str(key))
    }
}

// ============================================================================
// Proxy (MaxScale)
// ============================================================================

/// A backend server as seen by the proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyServer {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub connections: Option<u64>,
    #[serde(default)]
    pub total_connections: Option<u64>,
    #[serde(default)]
    pub queries: Option<u64>,
    #[serde(default)]
    pub read_queries: Option<u64>,
    #[serde(default)]
    pub write_queries: Option<u64>,
}

fn default_port() -> u16 {
    3306
}

impl ProxyServer {
    /// Lowercased state string, empty when unknown.
    pub fn state_lower(&self) -> String {
        self.state.as_deref().unwrap_or_default().to_lowercase()
    }

    pub fn is_master(&self) -> bool {
        self.state_lower().contains("master")
    }
}

/// A routing service defined on the proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyService {
    pub name: String,
    pub router: String,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default)]
    pub connections: Option<u64>,
    #[serde(default)]
    pub total_connections: Option<u64>,
    #[serde(default)]
    pub route_master: Option<u64>,
    #[serde(default)]
    pub route_slave: Option<u64>,
    #[serde(default)]
    pub route_all: Option<u64>,
    #[serde(default)]
    pub rw_transactions: Option<u64>,
    #[serde(default)]
    pub ro_transactions: Option<u64>,
    #[serde(default)]
    pub replayed_transactions: Option<u64>,
    #[serde(default)]
    pub master_accept_reads: Option<bool>,
    #[serde(default)]
    pub transaction_replay: Option<bool>,
    #[serde(default)]
    pub slave_selection_criteria: Option<String>,
}

/// Proxy configuration and routing statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub servers: Vec<ProxyServer>,
    #[serde(default)]
    pub services: Vec<ProxyService>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
    #[serde(default)]
    pub total_connections: Option<u64>,
    #[serde(default)]
    pub current_connections: Option<u64>,
    #[serde(default)]
    pub system_resources: Option<SystemResources>,
    /// Proxy log text keyed by proxy node name
    #[serde(default)]
    pub logs: Option<BTreeMap<String, String>>,
}

fn default_true() -> bool {
    true
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version: None,
            servers: Vec::new(),
            services: Vec::new(),
            uptime_seconds: None,
            total_connections: None,
            current_connections: None,
            system_resources: None,
            logs: None,
        }
    }
}

// ============================================================================
// Review Request
// ============================================================================

/// Complete request for a cluster review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReviewRequest {
    pub cluster_name: String,
    pub topology_type: TopologyType,
    pub nodes: Vec<NodeSnapshot>,
    #[serde(default, alias = "maxscale")]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expected_queries_per_second: Option<f64>,
    #[serde(default)]
    pub expected_connections: Option<u64>,
    #[serde(default)]
    pub expected_write_percentage: Option<f64>,
}

impl ClusterReviewRequest {
    pub fn new(
        cluster_name: impl Into<String>,
        topology_type: TopologyType,
        nodes: Vec<NodeSnapshot>,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            topology_type,
            nodes,
            proxy: None,
            description: None,
            expected_queries_per_second: None,
            expected_connections: None,
            expected_write_percentage: None,
        }
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Proxy record if present and enabled.
    pub fn active_proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref().filter(|p| p.enabled)
    }

    /// Check the request shape. Role mismatches are not errors; they become
    /// findings during the review.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ReviewError::InvalidRequest(
                "at least one node is required".to_string(),
            ));
        }
        if let Some(pct) = self.expected_write_percentage {
            check_percentage("expected_write_percentage", pct)?;
        }
        let resources = self
            .nodes
            .iter()
            .map(|n| (n.hostname.as_str(), n.system_resources.as_ref()))
            .chain(
                self.proxy
                    .iter()
                    .map(|p| ("proxy", p.system_resources.as_ref())),
            );
        for node in &self.nodes {
            if node.hostname.trim().is_empty() {
                return Err(ReviewError::InvalidRequest(
                    "node hostname must not be empty".to_string(),
                ));
            }
        }
        for (host, res) in resources {
            let Some(res) = res else { continue };
            if res.cpu_cores < 1 {
                return Err(ReviewError::InvalidRequest(format!(
                    "{host}: cpu_cores must be at least 1"
                )));
            }
            if !(res.ram_gb.is_finite() && res.ram_gb > 0.0) {
                return Err(ReviewError::InvalidRequest(format!(
                    "{host}: ram_gb must be positive"
                )));
            }
            if !(res.disk_total_gb.is_finite() && res.disk_total_gb > 0.0) {
                return Err(ReviewError::InvalidRequest(format!(
                    "{host}: disk_total_gb must be positive"
                )));
            }
            if let Some(pct) = res.cpu_utilization_pct {
                check_percentage(&format!("{host}: cpu_utilization_pct"), pct)?;
            }
            if let Some(pct) = res.ram_utilization_pct {
                check_percentage(&format!("{host}: ram_utilization_pct"), pct)?;
            }
        }
        Ok(())
    }
}

fn check_percentage(field: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ReviewError::InvalidRequest(format!(
            "{field} must be between 0 and 100, got {value}"
        )))
    }
}
