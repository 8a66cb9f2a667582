//! MDB-CFG-006..010 - Galera settings.
//!
//! All rules here are skipped for non-Galera topologies. gcache settings
//! are read out of the `wsrep_provider_options` string.

use std::sync::LazyLock;

use regex::Regex;

use crate::analyzer::config_rules::{ConfigRule, RuleContext};
use crate::analyzer::input::{NodeSnapshot, parse_size_bytes};
use crate::analyzer::types::{Category, Effort, Finding, Recommendation, ReviewFindings, Severity};

static GCACHE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)gcache\.size\s*=\s*(\d+(?:\.\d+)?[GMK]?)").expect("valid regex")
});

static GCACHE_KEEP_PAGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)gcache\.keep_pages_size\s*=\s*(\d+(?:\.\d+)?[GMK]?)").expect("valid regex")
});

pub fn rules() -> Vec<Box<dyn ConfigRule>> {
    vec![
        Box::new(SlaveThreads),
        Box::new(SyncWait),
        Box::new(BinlogFormat),
        Box::new(GcacheDisabled),
        Box::new(GcacheKeepPages),
    ]
}

/// Raw value of a provider option, e.g. `1G` for `gcache.size`.
fn provider_option(node: &NodeSnapshot, pattern: &Regex) -> Option<String> {
    let options = node.variable_str("wsrep_provider_options")?;
    pattern
        .captures(&options)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// MDB-CFG-006: fewer applier threads than the certification dependency distance.
pub struct SlaveThreads;

impl ConfigRule for SlaveThreads {
    fn code(&self) -> &'static str {
        "MDB-CFG-006"
    }

    fn name(&self) -> &'static str {
        "applier-threads"
    }

    fn description(&self) -> &'static str {
        "wsrep_slave_threads should cover wsrep_cert_deps_distance"
    }

    fn galera_only(&self) -> bool {
        true
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let threads = ctx.node.variable_int("wsrep_slave_threads", 1);
        let distance = ctx.node.wsrep_float("wsrep_cert_deps_distance", 0.0);
        if distance > 0.0 && (threads as f64) < distance {
            output.recommend(
                Recommendation::new(
                    3,
                    Category::Performance,
                    format!("Increase wsrep_slave_threads on {}", ctx.node.hostname),
                    format!(
                        "wsrep_slave_threads={threads} but cert_deps_distance={distance:.1}"
                    ),
                )
                .with_action(format!(
                    "Consider setting wsrep_slave_threads to {}",
                    (distance as i64).min(16)
                ))
                .with_impact("Better parallel apply performance")
                .with_effort(Effort::Low),
            );
        }
    }
}

/// MDB-CFG-007: causal reads enabled.
pub struct SyncWait;

impl ConfigRule for SyncWait {
    fn code(&self) -> &'static str {
        "MDB-CFG-007"
    }

    fn name(&self) -> &'static str {
        "causal-reads"
    }

    fn description(&self) -> &'static str {
        "wsrep_sync_wait adds latency to reads"
    }

    fn galera_only(&self) -> bool {
        true
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let Some(sync_wait) = ctx.node.variable_str("wsrep_sync_wait") else {
            return;
        };
        if sync_wait.trim() != "0" {
            output.finding(
                Finding::new(
                    Severity::Info,
                    Category::Configuration,
                    format!("Causal reads enabled on {}", ctx.node.hostname),
                    format!("wsrep_sync_wait={sync_wait} ensures read-your-writes consistency"),
                )
                .with_details("This adds latency but guarantees consistency. Disable if not needed.")
                .with_node(&ctx.node.hostname),
            );
        }
    }
}

/// MDB-CFG-008: binlog format other than ROW.
pub struct BinlogFormat;

impl ConfigRule for BinlogFormat {
    fn code(&self) -> &'static str {
        "MDB-CFG-008"
    }

    fn name(&self) -> &'static str {
        "binlog-format"
    }

    fn description(&self) -> &'static str {
        "Galera certification requires binlog_format=ROW"
    }

    fn galera_only(&self) -> bool {
        true
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let format = ctx
            .node
            .variable_str("binlog_format")
            .unwrap_or_else(|| "STATEMENT".to_string());
        if !format.trim().eq_ignore_ascii_case("ROW") {
            output.finding(
                Finding::new(
                    Severity::Warning,
                    Category::Configuration,
                    format!("Wrong binlog format on {}", ctx.node.hostname),
                    format!("binlog_format={format}, should be ROW for Galera"),
                )
                .with_details("ROW-based replication is required for Galera certification")
                .with_node(&ctx.node.hostname),
            );
        }
    }
}

/// MDB-CFG-009: `gcache.size=0`.
pub struct GcacheDisabled;

impl ConfigRule for GcacheDisabled {
    fn code(&self) -> &'static str {
        "MDB-CFG-009"
    }

    fn name(&self) -> &'static str {
        "gcache-disabled"
    }

    fn description(&self) -> &'static str {
        "A zero gcache makes incremental state transfer impossible"
    }

    fn galera_only(&self) -> bool {
        true
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let Some(size) = provider_option(ctx.node, &GCACHE_SIZE) else {
            return;
        };
        if parse_size_bytes(&size) != Some(0) {
            return;
        }

        let host = &ctx.node.hostname;
        output.finding(
            Finding::new(
                Severity::Warning,
                Category::Configuration,
                format!("gcache disabled on {host}"),
                "gcache.size=0 means IST (Incremental State Transfer) is not possible",
            )
            .with_details("Node recovery will always require full SST which is much slower")
            .with_node(host),
        );
        output.recommend(
            Recommendation::new(
                2,
                Category::Availability,
                format!("Enable gcache on {host}"),
                "gcache.size=0 disables IST recovery",
            )
            .with_action("Set gcache.size=1G or larger based on write volume")
            .with_impact("Faster node recovery after short outages")
            .with_effort(Effort::Medium)
            .with_related(format!("gcache disabled on {host}")),
        );
    }
}

/// MDB-CFG-010: page-file IST fallback configured.
pub struct GcacheKeepPages;

impl ConfigRule for GcacheKeepPages {
    fn code(&self) -> &'static str {
        "MDB-CFG-010"
    }

    fn name(&self) -> &'static str {
        "gcache-keep-pages"
    }

    fn description(&self) -> &'static str {
        "gcache.keep_pages_size provides IST through page files"
    }

    fn galera_only(&self) -> bool {
        true
    }

    fn check(&self, ctx: &RuleContext<'_>, output: &mut ReviewFindings) {
        let Some(keep_pages) = provider_option(ctx.node, &GCACHE_KEEP_PAGES) else {
            return;
        };
        if parse_size_bytes(&keep_pages).unwrap_or(0) == 0 {
            return;
        }
        output.finding(
            Finding::new(
                Severity::Info,
                Category::Configuration,
                format!("gcache.keep_pages_size on {}", ctx.node.hostname),
                format!("gcache.keep_pages_size={keep_pages} provides IST capability via page files"),
            )
            .with_details("This is a fallback mechanism when gcache.size=0")
            .with_node(&ctx.node.hostname),
        );
    }
}
