//! Handler for the `thresholds` command.

use std::path::Path;

use super::common::resolve_thresholds;
use crate::config::types::Config;
use crate::error::Result;

/// Print the effective threshold document.
pub fn handle_thresholds(file: Option<&Path>, config: &Config) -> Result<()> {
    let thresholds = resolve_thresholds(file, config);
    print!("{}", thresholds.to_yaml());
    Ok(())
}
