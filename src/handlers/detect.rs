//! Handler for the `detect` command.

use std::path::Path;

use super::common::{emit, load_request, resolve_format};
use crate::analyzer::orchestrator::detect_topology_with_indicators;
use crate::config::types::Config;
use crate::error::Result;

pub fn handle_detect(request: &Path, format: Option<&str>, config: &Config) -> Result<()> {
    let format = resolve_format(format, config)?;
    let request = load_request(request)?;
    let detection = detect_topology_with_indicators(&request);
    log::info!(
        "Detected {} for '{}' ({} confidence)",
        detection.topology,
        request.cluster_name,
        detection.confidence
    );
    emit(&detection, format, None)
}
