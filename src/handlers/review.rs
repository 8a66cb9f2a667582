//! Handler for the `review` command.

use std::path::PathBuf;

use super::common::{emit, load_request, resolve_format, resolve_thresholds, resolve_topology};
use crate::analyzer::orchestrator::ReviewService;
use crate::config::types::Config;
use crate::error::{Result, ReviewError};

/// Configuration for the review command
pub struct ReviewOptions {
    /// Review request file
    pub request: PathBuf,
    /// Topology override
    pub topology: Option<String>,
    /// Detect the topology before reviewing
    pub auto: bool,
    /// Output format name
    pub format: Option<String>,
    /// Output file
    pub output: Option<PathBuf>,
    /// Threshold overrides file
    pub thresholds: Option<PathBuf>,
    /// Return an error when the overall status is critical
    pub fail_on_critical: bool,
}

pub fn handle_review(options: ReviewOptions, config: &Config) -> Result<()> {
    let format = resolve_format(options.format.as_deref(), config)?;
    let topology = resolve_topology(options.topology.as_deref())?;
    let request = load_request(&options.request)?;

    let service = ReviewService::new()
        .with_thresholds(resolve_thresholds(options.thresholds.as_deref(), config))
        .with_ignored_rules(&config.review.ignore_rules);

    let response = if options.auto {
        service.auto_review(&request)?
    } else if let Some(topology) = topology {
        service.review_as(&request, topology)?
    } else {
        service.review(&request)?
    };

    emit(&response, format, options.output.as_deref())?;

    if options.fail_on_critical && response.overall_status.is_critical() {
        return Err(ReviewError::CriticalStatus {
            cluster: response.cluster_name,
        });
    }
    Ok(())
}
