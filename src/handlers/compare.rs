//! Handlers for the `compare` and `sizing` advisories.

use std::path::PathBuf;

use super::common::{emit, load_request, resolve_format, resolve_topology};
use crate::analyzer::comparison::compare_topologies;
use crate::analyzer::sizing::analyze_sizing;
use crate::config::types::Config;
use crate::error::Result;

/// Options shared by the advisory commands
pub struct AdvisoryOptions {
    pub request: PathBuf,
    /// Topology to assume instead of the declared one
    pub topology: Option<String>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
}

pub fn handle_compare(options: AdvisoryOptions, config: &Config) -> Result<()> {
    let format = resolve_format(options.format.as_deref(), config)?;
    let topology = resolve_topology(options.topology.as_deref())?;
    let request = load_request(&options.request)?;
    request.validate()?;

    let report = compare_topologies(&request, topology.unwrap_or(request.topology_type));
    emit(&report, format, options.output.as_deref())
}

pub fn handle_sizing(options: AdvisoryOptions, config: &Config) -> Result<()> {
    let format = resolve_format(options.format.as_deref(), config)?;
    let topology = resolve_topology(options.topology.as_deref())?;
    let request = load_request(&options.request)?;
    request.validate()?;

    let report = analyze_sizing(&request, topology.unwrap_or(request.topology_type));
    emit(&report, format, options.output.as_deref())
}
