//! Application configuration (`.mdb-review.toml`).
//!
//! An explicit `--config` file must load. Otherwise the current directory is
//! checked first, then the home directory; unreadable or malformed files
//! there are logged and skipped.

pub mod types;

use crate::error::{Result, ReviewError};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".mdb-review.toml";

/// Get the global config file path (~/.mdb-review.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (./.mdb-review.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Parse a config document.
pub fn parse_config(content: &str) -> Result<types::Config> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from an explicit file, or search the usual locations.
pub fn load_config(explicit: Option<&Path>) -> Result<types::Config> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path).map_err(|e| {
            ReviewError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        return parse_config(&content);
    }

    let local = std::env::current_dir().ok().map(|d| local_config_path(&d));
    for candidate in local.into_iter().chain(global_config_path()) {
        if !candidate.exists() {
            continue;
        }
        match fs::read_to_string(&candidate).map_err(ReviewError::from).and_then(|c| parse_config(&c)) {
            Ok(config) => {
                log::debug!("Loaded configuration from {}", candidate.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring {}: {}", candidate.display(), e),
        }
    }

    Ok(types::Config::default())
}
