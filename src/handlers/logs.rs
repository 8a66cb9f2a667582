//! Handler for the `logs` command.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::common::{emit, load_request, resolve_format};
use crate::analyzer::logs::{LogAnalysisInput, analyze_logs};
use crate::config::types::Config;
use crate::error::{Result, ReviewError};

/// Configuration for the logs command
pub struct LogsOptions {
    /// Server error logs as `NODE=PATH`
    pub mariadb: Vec<String>,
    /// Proxy logs as `NODE=PATH`
    pub proxy: Vec<String>,
    /// Slow query logs as `NODE=PATH`
    pub slow_query: Vec<String>,
    /// Review request with embedded logs
    pub request: Option<PathBuf>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
}

pub fn handle_logs(options: LogsOptions, config: &Config) -> Result<()> {
    let format = resolve_format(options.format.as_deref(), config)?;

    let mut input = match &options.request {
        Some(path) => LogAnalysisInput::from_request(&load_request(path)?),
        None => LogAnalysisInput::new(),
    };
    read_sources(&options.mariadb, &mut input.mariadb_logs)?;
    read_sources(&options.proxy, &mut input.proxy_logs)?;
    read_sources(&options.slow_query, &mut input.slow_query_logs)?;

    if input.is_empty() {
        return Err(ReviewError::InvalidRequest(
            "no logs given; use --mariadb, --proxy, --slow-query or --request".to_string(),
        ));
    }

    let result = analyze_logs(&input);
    emit(&result, format, options.output.as_deref())
}

/// Split a `NODE=PATH` argument.
pub fn parse_node_path(arg: &str) -> Result<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((node, path)) if !node.trim().is_empty() && !path.is_empty() => {
            Ok((node.trim().to_string(), PathBuf::from(path)))
        }
        _ => Err(ReviewError::InvalidRequest(format!(
            "expected NODE=PATH, got '{}'",
            arg
        ))),
    }
}

fn read_sources(args: &[String], target: &mut BTreeMap<String, String>) -> Result<()> {
    for arg in args {
        let (node, path) = parse_node_path(arg)?;
        let text = read_log(&path)?;
        log::debug!("Read {} bytes of log for {}", text.len(), node);
        target.insert(node, text);
    }
    Ok(())
}

// Logs are not always valid UTF-8; keep what can be decoded.
fn read_log(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
