use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mdb-review")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Review MariaDB deployments from captured status snapshots and logs")]
#[command(
    long_about = "Rule-based review of standalone, replication, semi-sync and Galera MariaDB deployments. Reads a review request (JSON or YAML) holding per-node status and configuration snapshots and reports architecture, capacity, load, findings and prioritized recommendations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full review of a cluster
    Review {
        /// Review request file (JSON or YAML)
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Review as this topology instead of the declared one
        /// (standalone, master_replica, semi_sync, galera)
        #[arg(short, long, conflicts_with = "auto")]
        topology: Option<String>,

        /// Detect the topology from the snapshots, then review
        #[arg(long)]
        auto: bool,

        /// Output format (table, json, yaml, summary)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// YAML threshold overrides
        #[arg(long, value_name = "FILE")]
        thresholds: Option<PathBuf>,

        /// Exit with an error when the overall status is critical
        #[arg(long)]
        fail_on_critical: bool,
    },

    /// Detect the topology of a cluster from its snapshots
    Detect {
        /// Review request file (JSON or YAML)
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Output format (table, json, yaml, summary)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Classify server, proxy and slow query logs
    Logs {
        /// Server error log as NODE=PATH (repeatable)
        #[arg(long, value_name = "NODE=PATH")]
        mariadb: Vec<String>,

        /// Proxy log as NODE=PATH (repeatable)
        #[arg(long, value_name = "NODE=PATH")]
        proxy: Vec<String>,

        /// Slow query log as NODE=PATH (repeatable)
        #[arg(long, value_name = "NODE=PATH")]
        slow_query: Vec<String>,

        /// Also classify logs embedded in this review request
        #[arg(long, value_name = "FILE")]
        request: Option<PathBuf>,

        /// Output format (table, json, yaml, summary)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Score candidate topologies for the observed workload
    Compare {
        /// Review request file (JSON or YAML)
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Treat the cluster as this topology
        #[arg(short, long)]
        topology: Option<String>,

        /// Output format (table, json, yaml, summary)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Per-node sizing and rightsizing options
    Sizing {
        /// Review request file (JSON or YAML)
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Treat the cluster as this topology
        #[arg(short, long)]
        topology: Option<String>,

        /// Output format (table, json, yaml, summary)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the effective threshold document as YAML
    Thresholds {
        /// YAML threshold overrides to apply
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_review_flags() {
        let cli = Cli::parse_from([
            "mdb-review",
            "-vv",
            "review",
            "req.json",
            "--topology",
            "galera",
            "--format",
            "json",
            "--fail-on-critical",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Review {
                request,
                topology,
                format,
                fail_on_critical,
                auto,
                ..
            } => {
                assert_eq!(request, PathBuf::from("req.json"));
                assert_eq!(topology.as_deref(), Some("galera"));
                assert_eq!(format.as_deref(), Some("json"));
                assert!(fail_on_critical);
                assert!(!auto);
            }
            _ => panic!("expected review command"),
        }
    }

    #[test]
    fn test_topology_conflicts_with_auto() {
        let result = Cli::try_parse_from([
            "mdb-review",
            "review",
            "req.json",
            "--auto",
            "--topology",
            "galera",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_repeatable_log_sources() {
        let cli = Cli::parse_from([
            "mdb-review",
            "logs",
            "--mariadb",
            "db1=a.log",
            "--mariadb",
            "db2=b.log",
            "--slow-query",
            "db1=slow.log",
        ]);
        match cli.command {
            Commands::Logs {
                mariadb, slow_query, ..
            } => {
                assert_eq!(mariadb, vec!["db1=a.log", "db2=b.log"]);
                assert_eq!(slow_query, vec!["db1=slow.log"]);
            }
            _ => panic!("expected logs command"),
        }
    }
}
