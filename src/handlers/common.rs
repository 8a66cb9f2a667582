//! Helpers shared by the command handlers.

use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::formatter::{OutputFormat, Report, render};
use crate::analyzer::input::{ClusterReviewRequest, TopologyType};
use crate::analyzer::thresholds::Thresholds;
use crate::config::types::Config;
use crate::error::{Result, ReviewError};

/// Read a review request. `.yaml`/`.yml` files are YAML, anything else JSON.
pub fn load_request(path: &Path) -> Result<ClusterReviewRequest> {
    let content = fs::read_to_string(path).map_err(|e| {
        ReviewError::InvalidRequest(format!("cannot read {}: {}", path.display(), e))
    })?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let request = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    log::debug!("Loaded review request from {}", path.display());
    Ok(request)
}

/// CLI value first, then the config file.
pub fn resolve_format(cli: Option<&str>, config: &Config) -> Result<OutputFormat> {
    cli.unwrap_or(&config.output.format).parse()
}

pub fn resolve_topology(cli: Option<&str>) -> Result<Option<TopologyType>> {
    cli.map(str::parse).transpose()
}

/// Thresholds from the CLI path, else the configured path, else defaults.
pub fn resolve_thresholds(cli: Option<&Path>, config: &Config) -> Thresholds {
    let path: Option<PathBuf> = cli
        .map(Path::to_path_buf)
        .or_else(|| config.review.thresholds_file.clone());
    Thresholds::load_or_default(path.as_deref())
}

/// Render a report and print it or write it to `output`.
pub fn emit<R: Report>(report: &R, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    if output.is_some() {
        colored::control::set_override(false);
    }
    let rendered = render(report, format)?;
    match output {
        Some(path) => {
            fs::write(path, &rendered)?;
            eprintln!("Report saved to: {}", path.display());
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REQUEST_JSON: &str = r#"{
        "cluster_name": "shop",
        "topology_type": "standalone",
        "nodes": [{"hostname": "db1", "role": "standalone"}]
    }"#;

    #[test]
    fn test_load_request_json_and_yaml() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json.write_all(REQUEST_JSON.as_bytes()).unwrap();
        let request = load_request(json.path()).unwrap();
        assert_eq!(request.cluster_name, "shop");

        let mut yaml = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            yaml,
            "cluster_name: shop\ntopology_type: galera\nnodes:\n  - hostname: g1\n    role: galera_node"
        )
        .unwrap();
        let request = load_request(yaml.path()).unwrap();
        assert_eq!(request.topology_type, TopologyType::Galera);
    }

    #[test]
    fn test_load_request_reports_parse_errors() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json.write_all(b"{\"cluster_name\": 1").unwrap();
        assert!(matches!(
            load_request(json.path()).unwrap_err(),
            ReviewError::Parse { format: "json", .. }
        ));
    }

    #[test]
    fn test_cli_format_overrides_config() {
        let mut config = Config::default();
        config.output.format = "yaml".to_string();
        assert_eq!(resolve_format(None, &config).unwrap(), OutputFormat::Yaml);
        assert_eq!(
            resolve_format(Some("json"), &config).unwrap(),
            OutputFormat::Json
        );
        assert!(resolve_format(Some("xml"), &config).is_err());
    }

    #[test]
    fn test_unknown_topology_is_rejected() {
        assert!(matches!(
            resolve_topology(Some("ring")).unwrap_err(),
            ReviewError::UnsupportedTopology(_)
        ));
        assert_eq!(resolve_topology(None).unwrap(), None);
    }
}
