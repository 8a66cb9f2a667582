//! # Analyzer Module
//!
//! Rule-based review of MariaDB deployments:
//! - Per-node performance, cluster capacity and load aggregation
//! - Topology checks for standalone, replication, semi-sync and Galera
//! - Proxy, configuration, topology comparison and sizing advisories
//! - Log classification for server, proxy and slow query logs
//!
//! Every analyzer is a pure function of its input; results are returned by
//! value and nothing survives between calls.

pub mod base;
pub mod comparison;
pub mod config_rules;
pub mod formatter;
pub mod input;
pub mod logs;
pub mod metrics;
pub mod orchestrator;
pub mod proxy;
pub mod sizing;
pub mod thresholds;
pub mod topology;
pub mod types;

pub use comparison::{ComparisonReport, compare_topologies};
pub use config_rules::{ConfigAnalyzer, ConfigRule, all_rules, get_rule};
pub use formatter::{OutputFormat, Report, render};
pub use input::{
    ClusterReviewRequest, NodeRole, NodeSnapshot, ProxyConfig, ProxyServer, ProxyService,
    SystemResources, TopologyType, VarMap,
};
pub use logs::{CombinedLogResult, LogAnalysisInput, analyze_logs};
pub use orchestrator::{
    DetectionConfidence, ReviewService, TopologyDetection, detect_topology_with_indicators,
};
pub use proxy::{ProxyReport, analyze_proxy};
pub use sizing::{SizingReport, analyze_sizing};
pub use thresholds::Thresholds;
pub use types::{
    Category, ClusterReviewResponse, Effort, Finding, Recommendation, ReviewFindings, Severity,
};
