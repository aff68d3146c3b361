//! yarn-gcp-build - cache-aware yarn build step
//!
//! CLI entry point: acts as the host that invokes detect or build.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use yarn_gcp_build::cli::{Cli, Commands};
use yarn_gcp_build::config::{Config, ConfigManager};
use yarn_gcp_build::error::BuildResult;

/// Exit status for "this step does not apply"
const EXIT_OPT_OUT: u8 = 100;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BuildResult<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    // Dispatch to command
    match cli.command {
        Commands::Detect(args) => {
            let result = yarn_gcp_build::cli::commands::detect(args, &config).await?;
            if result.is_opt_in() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_OPT_OUT))
            }
        }
        Commands::Build(args) => {
            yarn_gcp_build::cli::commands::build(args, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 0 = info (cache status, subprocess output), 1 = debug, 2+ = trace
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("yarn_gcp_build=info"),
        1 => EnvFilter::new("yarn_gcp_build=debug"),
        _ => EnvFilter::new("yarn_gcp_build=trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
