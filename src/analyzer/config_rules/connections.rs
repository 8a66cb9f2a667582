//! MDB-CFG-004..005 - connection settings.

use crate::analyzer::config_rules::{ConfigRule, RuleContext};
use crate::analyzer::types::{Category, Effort, Finding, Recommendation, ReviewFindings, Severity};

pub fn rules() -> Vec<Box<dyn ConfigRule>> {
    vec![Box::new(ConnectionHeadroom), Box::new(WaitTimeout)]
}

/// MDB-CFG-004: peak connections close to, or far below, `max_connections`.
pub struct ConnectionHeadroom;

impl ConfigRule for ConnectionHeadroom {
    fn code(&self) -> &'static str {
        "MDB-CFG-004"
    }

    fn name(&self) -> &'static str {
        "connection-headroom"
    }

    fn description(&self) -> &'static str {
        "Peak connection usage should sit between 20% and 80% of max_connections"
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let node = ctx.node;
        let max_connections = node.variable_int("max_connections", 151);
        let max_used = node.status_int("Max_used_connections", 0);
        if max_used <= 0 || max_connections <= 0 {
            return;
        }

        let utilization = max_used as f64 / max_connections as f64 * 100.0;
        if utilization > 80.0 {
            output.finding(
                Finding::new(
                    Severity::Warning,
                    Category::Capacity,
                    format!("High connection utilization on {}", node.hostname),
                    format!(
                        "Peak connections ({max_used}) is {utilization:.1}% of max_connections ({max_connections})"
                    ),
                )
                .with_details("Consider increasing max_connections or implementing connection pooling")
                .with_metric("connection_utilization", utilization)
                .with_threshold(80.0)
                .with_node(&node.hostname),
            );
        } else if utilization < 20.0 && max_connections >= 500 {
            output.recommend(
                Recommendation::new(
                    4,
                    Category::Configuration,
                    format!("Reduce max_connections on {}", node.hostname),
                    format!(
                        "max_connections={max_connections} but peak usage is only {max_used} ({utilization:.1}%)"
                    ),
                )
                .with_action(format!(
                    "Consider reducing to {} to free memory",
                    max_used.saturating_mul(2).max(200)
                ))
                .with_impact("Minor memory savings")
                .with_effort(Effort::Low),
            );
        }
    }
}

/// MDB-CFG-005: idle connections kept open for more than an hour.
pub struct WaitTimeout;

impl ConfigRule for WaitTimeout {
    fn code(&self) -> &'static str {
        "MDB-CFG-005"
    }

    fn name(&self) -> &'static str {
        "long-wait-timeout"
    }

    fn description(&self) -> &'static str {
        "wait_timeout above one hour keeps idle connections around"
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let wait_timeout = ctx.node.variable_int("wait_timeout", 28_800);
        if wait_timeout > 3600 {
            output.recommend(
                Recommendation::new(
                    4,
                    Category::Configuration,
                    format!("Review wait_timeout on {}", ctx.node.hostname),
                    format!(
                        "wait_timeout={}s ({:.1} hours) may keep idle connections too long",
                        wait_timeout,
                        wait_timeout as f64 / 3600.0
                    ),
                )
                .with_action("Consider reducing to 300-900 seconds for web applications")
                .with_impact("Better connection management")
                .with_effort(Effort::Low),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::{NodeRole, NodeSnapshot, TopologyType};

    fn run(rule: &dyn ConfigRule, node: &NodeSnapshot) -> ReviewFindings {
        let mut out = ReviewFindings::new();
        rule.check(&RuleContext::new(node, TopologyType::Standalone), &mut out);
        out
    }

    fn node(max_connections: i64, max_used: i64) -> NodeSnapshot {
        let mut node = NodeSnapshot::new("db1", NodeRole::Standalone);
        node.global_variables.insert("max_connections", max_connections);
        node.global_status.insert("Max_used_connections", max_used);
        node
    }

    #[test]
    fn test_high_connection_utilization() {
        let out = run(&ConnectionHeadroom, &node(100, 90));
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].category, Category::Capacity);
        assert_eq!(
            out.findings[0].description,
            "Peak connections (90) is 90.0% of max_connections (100)"
        );
    }

    #[test]
    fn test_oversized_max_connections() {
        let out = run(&ConnectionHeadroom, &node(1000, 50));
        assert_eq!(out.recommendations.len(), 1);
        assert_eq!(
            out.recommendations[0].action,
            "Consider reducing to 200 to free memory"
        );

        let out = run(&ConnectionHeadroom, &node(1000, 150));
        assert_eq!(
            out.recommendations[0].action,
            "Consider reducing to 300 to free memory"
        );

        // Small pools are left alone even when mostly idle.
        assert!(run(&ConnectionHeadroom, &node(151, 5)).recommendations.is_empty());
    }

    #[test]
    fn test_wait_timeout_default_flagged() {
        let out = run(&WaitTimeout, &NodeSnapshot::new("db1", NodeRole::Standalone));
        assert_eq!(
            out.recommendations[0].description,
            "wait_timeout=28800s (8.0 hours) may keep idle connections too long"
        );

        let mut short = NodeSnapshot::new("db1", NodeRole::Standalone);
        short.global_variables.insert("wait_timeout", 600);
        assert!(run(&WaitTimeout, &short).recommendations.is_empty());
    }
}
