//! MDB-CFG-001..003 - InnoDB settings.

use crate::analyzer::config_rules::{ConfigRule, RuleContext};
use crate::analyzer::types::{Category, Effort, Finding, Recommendation, ReviewFindings, Severity};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn rules() -> Vec<Box<dyn ConfigRule>> {
    vec![
        Box::new(BufferPoolRatio),
        Box::new(FlushLogAtCommit),
        Box::new(AutoincLockMode),
    ]
}

/// MDB-CFG-001: buffer pool below half of RAM.
pub struct BufferPoolRatio;

impl ConfigRule for BufferPoolRatio {
    fn code(&self) -> &'static str {
        "MDB-CFG-001"
    }

    fn name(&self) -> &'static str {
        "small-buffer-pool"
    }

    fn description(&self) -> &'static str {
        "innodb_buffer_pool_size should be at least 50% of RAM on a dedicated server"
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let Some(resources) = ctx.node.system_resources.as_ref() else {
            return;
        };
        if !(resources.ram_gb.is_finite() && resources.ram_gb > 0.0) {
            return;
        }

        let pool = ctx.node.variable_int("innodb_buffer_pool_size", 0).max(0) as f64;
        let pct = pool / (resources.ram_gb * GIB) * 100.0;
        if pct < 50.0 {
            output.recommend(
                Recommendation::new(
                    3,
                    Category::Performance,
                    format!("Increase buffer pool on {}", ctx.node.hostname),
                    format!(
                        "Buffer pool is only {:.1}% of RAM ({:.1}GB of {}GB)",
                        pct,
                        pool / GIB,
                        resources.ram_gb
                    ),
                )
                .with_action(
                    "Consider setting innodb_buffer_pool_size to 60-70% of RAM for dedicated DB servers",
                )
                .with_impact("Better cache hit ratio")
                .with_effort(Effort::Low),
            );
        }
    }
}

/// MDB-CFG-002: `innodb_flush_log_at_trx_commit=0`.
pub struct FlushLogAtCommit;

impl ConfigRule for FlushLogAtCommit {
    fn code(&self) -> &'static str {
        "MDB-CFG-002"
    }

    fn name(&self) -> &'static str {
        "relaxed-durability"
    }

    fn description(&self) -> &'static str {
        "innodb_flush_log_at_trx_commit=0 can lose committed transactions on crash"
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let setting = ctx
            .node
            .variable_str("innodb_flush_log_at_trx_commit")
            .unwrap_or_else(|| "1".to_string());
        if setting.trim() == "0" {
            output.finding(
                Finding::new(
                    Severity::Warning,
                    Category::Configuration,
                    format!("Durability risk on {}", ctx.node.hostname),
                    "innodb_flush_log_at_trx_commit=0 can lose up to 1 second of transactions on crash",
                )
                .with_details(
                    "For Galera, this is often acceptable as other nodes have the data, but consider =2 for better durability",
                )
                .with_node(&ctx.node.hostname),
            );
        }
    }
}

/// MDB-CFG-003: auto-increment lock mode other than interleaved on Galera.
pub struct AutoincLockMode;

impl ConfigRule for AutoincLockMode {
    fn code(&self) -> &'static str {
        "MDB-CFG-003"
    }

    fn name(&self) -> &'static str {
        "autoinc-lock-mode"
    }

    fn description(&self) -> &'static str {
        "Galera needs innodb_autoinc_lock_mode=2 to avoid deadlocks"
    }

    fn galera_only(&self) -> bool {
        true
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let mode = ctx
            .node
            .variable_str("innodb_autoinc_lock_mode")
            .unwrap_or_else(|| "1".to_string());
        if mode.trim() != "2" {
            output.finding(
                Finding::new(
                    Severity::Warning,
                    Category::Configuration,
                    format!("Auto-increment lock mode on {}", ctx.node.hostname),
                    format!("innodb_autoinc_lock_mode={mode}, should be 2 for Galera"),
                )
                .with_details("Mode 2 (interleaved) is required for Galera to avoid deadlocks")
                .with_node(&ctx.node.hostname),
            );
        }
    }
}
