//! Build command - install dependencies through the layer cache and build

use crate::buildpack::{BuildContext, Buildpack};
use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::BuildResult;
use console::style;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> BuildResult<()> {
    let mut config = config.clone();
    if let Some(node_env) = args.node_env {
        config.build.node_env = node_env;
    }
    debug!(
        "Building {} with layers in {}",
        args.app.display(),
        args.layers.display()
    );

    let script = config.build.script.clone();
    let ctx = BuildContext::new(args.app, args.layers);
    super::yarn_gcp_build(config).build(&ctx).await?;

    println!(
        "{} {} script finished",
        style("✓").green(),
        style(script).cyan()
    );
    Ok(())
}
