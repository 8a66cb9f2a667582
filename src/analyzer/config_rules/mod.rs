//! Configuration rules.
//!
//! Stateless checks over each node's configuration variables. Every rule has
//! a stable code so it can be switched off from the application config.
//!
//! # Rule Groups
//!
//! - **MDB-CFG-001..003**: InnoDB settings
//! - **MDB-CFG-004..005**: connection settings
//! - **MDB-CFG-006..010**: Galera settings, only run for Galera clusters

pub mod connections;
pub mod galera;
pub mod innodb;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analyzer::input::{ClusterReviewRequest, NodeSnapshot, TopologyType};
use crate::analyzer::types::ReviewFindings;

/// Context handed to each rule for one node.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub node: &'a NodeSnapshot,
    pub topology: TopologyType,
}

impl<'a> RuleContext<'a> {
    pub fn new(node: &'a NodeSnapshot, topology: TopologyType) -> Self {
        Self { node, topology }
    }

    pub fn is_galera(&self) -> bool {
        self.topology == TopologyType::Galera
    }
}

/// A configuration rule evaluated once per node.
pub trait ConfigRule: Send + Sync {
    /// Stable rule code (e.g. "MDB-CFG-002").
    fn code(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Rules that only make sense on Galera clusters.
    fn galera_only(&self) -> bool {
        false
    }

    /// Run the rule, appending findings and recommendations to `output`.
    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings);
}

/// Get all available rules, in code order.
pub fn all_rules() -> Vec<Box<dyn ConfigRule>> {
    let mut rules: Vec<Box<dyn ConfigRule>> = Vec::new();
    rules.extend(innodb::rules());
    rules.extend(connections::rules());
    rules.extend(galera::rules());
    rules
}

/// Get a rule by code.
pub fn get_rule(code: &str) -> Option<Box<dyn ConfigRule>> {
    all_rules().into_iter().find(|r| r.code().eq_ignore_ascii_case(code))
}

/// Result of running the configuration rules over a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigReport {
    /// Codes of the rules that produced output.
    pub triggered_rules: BTreeSet<String>,
    #[serde(flatten)]
    pub output: ReviewFindings,
}

/// Runs every enabled rule against every node.
pub struct ConfigAnalyzer {
    rules: Vec<Box<dyn ConfigRule>>,
}

impl Default for ConfigAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigAnalyzer {
    pub fn new() -> Self {
        Self { rules: all_rules() }
    }

    /// Drop the rules whose codes appear in `ignored` (case-insensitive).
    pub fn with_ignored<I, S>(mut self, ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ignored: BTreeSet<String> = ignored
            .into_iter()
            .map(|code| code.as_ref().trim().to_uppercase())
            .collect();
        self.rules.retain(|rule| !ignored.contains(rule.code()));
        self
    }

    pub fn rule_codes(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.code()).collect()
    }

    pub fn analyze(&self, request: &ClusterReviewRequest, topology: TopologyType) -> ConfigReport {
        let mut report = ConfigReport::default();
        for node in &request.nodes {
            let ctx = RuleContext::new(node, topology);
            for rule in &self.rules {
                if rule.galera_only() && !ctx.is_galera() {
                    continue;
                }
                let mut hits = ReviewFindings::new();
                rule.check(&ctx, &mut hits);
                if !hits.findings.is_empty() || !hits.recommendations.is_empty() {
                    log::debug!("{} triggered on {}", rule.code(), node.hostname);
                    report.triggered_rules.insert(rule.code().to_string());
                    report.output.extend(hits);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_codes_unique_and_ordered() {
        let codes: Vec<&str> = all_rules().iter().map(|r| r.code()).collect();
        assert_eq!(codes.len(), 10);
        let unique: HashSet<&str> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_get_rule_case_insensitive() {
        let rule = get_rule("mdb-cfg-005").unwrap();
        assert_eq!(rule.name(), "long-wait-timeout");
        assert!(get_rule("MDB-CFG-999").is_none());
    }

    #[test]
    fn test_ignored_rules_are_removed() {
        let analyzer = ConfigAnalyzer::new().with_ignored(["mdb-cfg-005", " MDB-CFG-008 "]);
        let codes = analyzer.rule_codes();
        assert!(!codes.contains(&"MDB-CFG-005"));
        assert!(!codes.contains(&"MDB-CFG-008"));
        assert_eq!(codes.len(), 8);
    }

    #[test]
    fn test_galera_rules_gated_on_topology() {
        let mut node = NodeSnapshot::new("db1", crate::analyzer::input::NodeRole::Master);
        node.global_variables.insert("binlog_format", "MIXED");
        node.global_variables.insert("wait_timeout", 600);
        let request = ClusterReviewRequest::new("c", TopologyType::MasterReplica, vec![node]);

        let report = ConfigAnalyzer::new().analyze(&request, TopologyType::MasterReplica);
        assert!(!report.triggered_rules.contains("MDB-CFG-008"));

        let report = ConfigAnalyzer::new().analyze(&request, TopologyType::Galera);
        assert!(report.triggered_rules.contains("MDB-CFG-008"));
    }
}
