//! Output formatters for review, log, comparison and sizing reports.
//!
//! - **Table**: colored terminal output with boxed sections
//! - **JSON** / **YAML**: the serialized report
//! - **Summary**: a short plain-text digest

mod summary;
mod table;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::comparison::ComparisonReport;
use super::logs::CombinedLogResult;
use super::orchestrator::TopologyDetection;
use super::sizing::SizingReport;
use super::types::ClusterReviewResponse;
use crate::error::{Result, ReviewError};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    Summary,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" | "tty" | "terminal" => Some(Self::Table),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Summary => "summary",
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "json", "yaml", "summary"]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            ReviewError::Config(format!(
                "unknown output format '{}' (expected one of: {})",
                s,
                Self::all_names().join(", ")
            ))
        })
    }
}

/// A report with human-readable renderings.
pub trait Report: Serialize {
    fn render_table(&self) -> String;
    fn render_summary(&self) -> String;
}

/// Render `report` in the requested format.
pub fn render<R: Report>(report: &R, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(report.render_table()),
        OutputFormat::Summary => Ok(report.render_summary()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    }
}

impl Report for ClusterReviewResponse {
    fn render_table(&self) -> String {
        table::review(self)
    }

    fn render_summary(&self) -> String {
        summary::review(self)
    }
}

impl Report for CombinedLogResult {
    fn render_table(&self) -> String {
        table::logs(self)
    }

    fn render_summary(&self) -> String {
        summary::logs(self)
    }
}

impl Report for ComparisonReport {
    fn render_table(&self) -> String {
        table::comparison(self)
    }

    fn render_summary(&self) -> String {
        summary::comparison(self)
    }
}

impl Report for SizingReport {
    fn render_table(&self) -> String {
        table::sizing(self)
    }

    fn render_summary(&self) -> String {
        summary::sizing(self)
    }
}

impl Report for TopologyDetection {
    fn render_table(&self) -> String {
        table::detection(self)
    }

    fn render_summary(&self) -> String {
        summary::detection(self)
    }
}
