use clap::Parser;
use mariadb_review::{
    cli::{Cli, Commands},
    config,
    handlers::{
        AdvisoryOptions, LogsOptions, ReviewOptions, handle_compare, handle_detect, handle_logs,
        handle_review, handle_sizing, handle_thresholds,
    },
};
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> mariadb_review::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let config = config::load_config(cli.config.as_deref())?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    // Execute command
    match cli.command {
        Commands::Review {
            request,
            topology,
            auto,
            format,
            output,
            thresholds,
            fail_on_critical,
        } => handle_review(
            ReviewOptions {
                request,
                topology,
                auto,
                format,
                output,
                thresholds,
                fail_on_critical,
            },
            &config,
        ),
        Commands::Detect { request, format } => {
            handle_detect(&request, format.as_deref(), &config)
        }
        Commands::Logs {
            mariadb,
            proxy,
            slow_query,
            request,
            format,
            output,
        } => handle_logs(
            LogsOptions {
                mariadb,
                proxy,
                slow_query,
                request,
                format,
                output,
            },
            &config,
        ),
        Commands::Compare {
            request,
            topology,
            format,
            output,
        } => handle_compare(
            AdvisoryOptions {
                request,
                topology,
                format,
                output,
            },
            &config,
        ),
        Commands::Sizing {
            request,
            topology,
            format,
            output,
        } => handle_sizing(
            AdvisoryOptions {
                request,
                topology,
                format,
                output,
            },
            &config,
        ),
        Commands::Thresholds { file } => handle_thresholds(file.as_deref(), &config),
    }
}
