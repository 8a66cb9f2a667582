//! # Log Classifiers
//!
//! Line-oriented classification of server error logs, proxy logs and slow
//! query logs into categorized, timestamped events plus derived findings.
//!
//! Classification is total: a line no pattern recognizes only adds to the
//! line count.
//!
//! ```rust,ignore
//! use mariadb_review::analyzer::logs::{LogAnalysisInput, analyze_logs};
//!
//! let mut input = LogAnalysisInput::new();
//! input.mariadb_logs.insert("db1".into(), std::fs::read_to_string("error.log")?);
//! let result = analyze_logs(&input);
//! println!("disk issues: {}", result.summary.disk_issues_detected);
//! ```

pub mod combined;
pub mod mariadb;
pub mod patterns;
pub mod proxy;
pub mod slow_query;
pub mod types;

pub use combined::{
    CombinedLogResult, CombinedLogSummary, LogAnalysisInput, TimelineEntry, analyze_logs,
};
pub use mariadb::{MariaDbLogReport, analyze_mariadb_log};
pub use proxy::{ProxyLogReport, ProxyLogSummary, analyze_proxy_log};
pub use slow_query::{SlowQueryReport, SlowQuerySummary, analyze_slow_query_log};
pub use types::{EventKind, LogEvent, LogSummary};
