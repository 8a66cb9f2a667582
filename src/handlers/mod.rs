// Handler modules
pub mod common;
pub mod compare;
pub mod detect;
pub mod logs;
pub mod review;
pub mod thresholds;

// Re-export all handler functions
pub use compare::{AdvisoryOptions, handle_compare, handle_sizing};
pub use detect::handle_detect;
pub use logs::{LogsOptions, handle_logs};
pub use review::{ReviewOptions, handle_review};
pub use thresholds::handle_thresholds;
