//! # MariaDB Review
//!
//! A rule-based diagnostic engine for MariaDB deployments. It takes captured
//! status and configuration snapshots of every node (and optionally of a
//! MaxScale-style proxy) and produces a structured review.
//!
//! ## Features
//!
//! - **Topology Analysis**: standalone, master/replica, semi-sync and Galera checks
//! - **Configuration Rules**: coded, individually ignorable best-practice rules
//! - **Log Classification**: server error logs, proxy logs and slow query logs
//! - **Advisories**: topology comparison and rightsizing options
//! - **Auto Detection**: infer the topology from the snapshots
//!
//! ## Example
//!
//! ```rust,no_run
//! use mariadb_review::{ClusterReviewRequest, ReviewService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request: ClusterReviewRequest =
//!     serde_json::from_str(&std::fs::read_to_string("cluster.json")?)?;
//! let response = ReviewService::new().review(&request)?;
//! println!("{}: {}", response.cluster_name, response.overall_summary);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

// Re-export commonly used types and functions
pub use analyzer::{
    ClusterReviewRequest, ClusterReviewResponse, CombinedLogResult, Finding, LogAnalysisInput,
    NodeRole, NodeSnapshot, OutputFormat, ProxyConfig, Recommendation, ReviewService, Severity,
    Thresholds, TopologyType, analyze_logs, analyze_sizing, compare_topologies,
    detect_topology_with_indicators,
};
pub use analyzer::logs::{analyze_mariadb_log, analyze_proxy_log, analyze_slow_query_log};
pub use error::{Result, ReviewError};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
