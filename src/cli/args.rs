//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Cache-aware yarn gcp-build step for layered application builds
///
/// Installs dependencies into a fingerprint-keyed layer and runs the
/// project's gcp-build script.
#[derive(Parser, Debug)]
#[command(name = "yarn-gcp-build")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "YARN_GCP_BUILD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the build step applies (exit 0 = yes, 100 = no)
    Detect(DetectArgs),

    /// Install dependencies through the layer cache and run the build script
    Build(BuildArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Application source directory
    #[arg(short, long, default_value = ".", env = "YARN_GCP_BUILD_APP")]
    pub app: PathBuf,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application source directory
    #[arg(short, long, default_value = ".", env = "YARN_GCP_BUILD_APP")]
    pub app: PathBuf,

    /// Directory where layers persist between builds
    #[arg(short, long, env = "YARN_GCP_BUILD_LAYERS")]
    pub layers: PathBuf,

    /// Override NODE_ENV for the install (part of the cache fingerprint)
    #[arg(long)]
    pub node_env: Option<String>,
}
