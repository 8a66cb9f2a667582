//! Threshold configuration.
//!
//! Thresholds are grouped into `server`, `galera`, `replication` and
//! `resources` sections. Built-in defaults always exist; a YAML document can
//! override any individual field, and anything it omits keeps its default.

use super::types::Severity;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Tier
// ============================================================================

/// Cutoffs for one metric. Unused cutoffs are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underutilized: Option<f64>,
}

impl Tier {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self {
            warning: Some(warning),
            critical: Some(critical),
            underutilized: None,
        }
    }

    pub const fn with_underutilized(mut self, underutilized: f64) -> Self {
        self.underutilized = Some(underutilized);
        self
    }

    const fn underutilized_only(underutilized: f64) -> Self {
        Self {
            warning: None,
            critical: None,
            underutilized: Some(underutilized),
        }
    }

    /// Evaluate a higher-is-worse metric: at or above a cutoff breaches it.
    pub fn evaluate_high(&self, value: f64) -> Severity {
        if self.critical.is_some_and(|c| value >= c) {
            Severity::Critical
        } else if self.warning.is_some_and(|w| value >= w) {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    /// Evaluate a lower-is-worse metric: strictly below a cutoff breaches it.
    pub fn evaluate_low(&self, value: f64) -> Severity {
        if self.critical.is_some_and(|c| value < c) {
            Severity::Critical
        } else if self.warning.is_some_and(|w| value < w) {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    /// Strictly below the underutilized cutoff.
    pub fn is_underutilized(&self, value: f64) -> bool {
        self.underutilized.is_some_and(|u| value < u)
    }

    pub fn warning_or(&self, fallback: f64) -> f64 {
        self.warning.unwrap_or(fallback)
    }

    pub fn critical_or(&self, fallback: f64) -> f64 {
        self.critical.unwrap_or(fallback)
    }

    fn overlay(&mut self, other: &Tier) {
        if other.warning.is_some() {
            self.warning = other.warning;
        }
        if other.critical.is_some() {
            self.critical = other.critical;
        }
        if other.underutilized.is_some() {
            self.underutilized = other.underutilized;
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerThresholds {
    pub connection_utilization: Tier,
    pub buffer_pool_hit_ratio: Tier,
    pub buffer_pool_usage: Tier,
    pub slow_queries_per_hour: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaleraThresholds {
    pub flow_control_paused: Tier,
    pub local_recv_queue_avg: Tier,
    pub local_send_queue_avg: Tier,
    pub cert_conflicts_per_hour: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationThresholds {
    pub seconds_behind_master: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceThresholds {
    pub cpu: Tier,
    pub memory: Tier,
    pub disk: Tier,
}

/// Complete threshold set used by every analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub server: ServerThresholds,
    pub galera: GaleraThresholds,
    pub replication: ReplicationThresholds,
    pub resources: ResourceThresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            server: ServerThresholds {
                connection_utilization: Tier::new(0.7, 0.9).with_underutilized(0.3),
                buffer_pool_hit_ratio: Tier::new(0.95, 0.90),
                buffer_pool_usage: Tier::underutilized_only(0.5),
                slow_queries_per_hour: Tier::new(100.0, 500.0),
            },
            galera: GaleraThresholds {
                flow_control_paused: Tier::new(0.01, 0.2),
                local_recv_queue_avg: Tier::new(0.5, 1.0),
                local_send_queue_avg: Tier::new(0.5, 1.0),
                cert_conflicts_per_hour: Tier::new(10.0, 100.0),
            },
            replication: ReplicationThresholds {
                seconds_behind_master: Tier::new(30.0, 300.0),
            },
            resources: ResourceThresholds {
                cpu: Tier::new(0.8, 0.95).with_underutilized(0.3),
                memory: Tier::new(0.9, 0.95).with_underutilized(0.5),
                disk: Tier::new(0.8, 0.9),
            },
        }
    }
}

/// Partial threshold document: section -> metric -> tier fields.
type ThresholdDocument = BTreeMap<String, BTreeMap<String, Tier>>;

impl Thresholds {
    /// Parse a YAML document and overlay it onto the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut thresholds = Self::default();
        if content.trim().is_empty() {
            return Ok(thresholds);
        }
        let doc: Option<ThresholdDocument> = serde_yaml::from_str(content)?;
        if let Some(doc) = doc {
            thresholds.apply(&doc);
        }
        Ok(thresholds)
    }

    /// Load from a file, falling back to defaults on any problem.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_yaml_str(&content) {
                Ok(t) => {
                    log::info!("Loaded thresholds from {}", path.display());
                    t
                }
                Err(e) => {
                    log::warn!(
                        "Invalid thresholds file {}: {}; using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "Cannot read thresholds file {}: {}; using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_default()
    }

    fn apply(&mut self, doc: &ThresholdDocument) {
        for (section, metrics) in doc {
            for (metric, tier) in metrics {
                match self.tier_mut(section, metric) {
                    Some(target) => target.overlay(tier),
                    None => log::warn!("Ignoring unknown threshold {}.{}", section, metric),
                }
            }
        }
    }

    fn tier_mut(&mut self, section: &str, metric: &str) -> Option<&mut Tier> {
        let tier = match (section, metric) {
            ("server", "connection_utilization") => &mut self.server.connection_utilization,
            ("server", "buffer_pool_hit_ratio") => &mut self.server.buffer_pool_hit_ratio,
            ("server", "buffer_pool_usage") => &mut self.server.buffer_pool_usage,
            ("server", "slow_queries_per_hour") => &mut self.server.slow_queries_per_hour,
            ("galera", "flow_control_paused") => &mut self.galera.flow_control_paused,
            ("galera", "local_recv_queue_avg") => &mut self.galera.local_recv_queue_avg,
            ("galera", "local_send_queue_avg") => &mut self.galera.local_send_queue_avg,
            ("galera", "cert_conflicts_per_hour") => &mut self.galera.cert_conflicts_per_hour,
            ("replication", "seconds_behind_master") => {
                &mut self.replication.seconds_behind_master
            }
            ("resources", "cpu") => &mut self.resources.cpu,
            ("resources", "memory") => &mut self.resources.memory,
            ("resources", "disk") => &mut self.resources.disk,
            _ => return None,
        };
        Some(tier)
    }
}
