//! Error types for the review engine and CLI.
//!
//! Malformed metric values never reach this type: the accessors in
//! [`crate::analyzer::input`] fall back to defaults. Only invalid request
//! shapes and outer-surface failures (files, parsing, config) surface here.

use thiserror::Error;

/// Errors produced while loading inputs or running a review.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Topology name not recognised by the orchestrator
    #[error("Unsupported topology type: {0}")]
    UnsupportedTopology(String),

    /// Request failed shape validation before dispatch
    #[error("Invalid review request: {0}")]
    InvalidRequest(String),

    /// Input document could not be parsed
    #[error("Failed to parse {format} input: {message}")]
    Parse {
        /// Input format (json, yaml, toml)
        format: &'static str,
        /// Underlying parser message
        message: String,
    },

    /// Application configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Review finished with a critical overall status and the caller asked to fail on it
    #[error("Review of '{cluster}' finished with critical status")]
    CriticalStatus {
        /// Cluster name from the request
        cluster: String,
    },
}

impl From<serde_json::Error> for ReviewError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            format: "json",
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ReviewError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse {
            format: "yaml",
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ReviewError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse {
            format: "toml",
            message: err.to_string(),
        }
    }
}

/// Result type alias for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_parse() {
        let err: ReviewError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        match err {
            ReviewError::Parse { format, .. } => assert_eq!(format, "json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = ReviewError::UnsupportedTopology("ring".to_string());
        assert_eq!(err.to_string(), "Unsupported topology type: ring");
    }
}
