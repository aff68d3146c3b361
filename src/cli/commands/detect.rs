//! Detect command - decide whether the build step applies

use crate::buildpack::{BuildContext, Buildpack, DetectResult};
use crate::cli::args::DetectArgs;
use crate::config::Config;
use crate::error::BuildResult;
use console::style;

/// Execute the detect command
pub async fn execute(args: DetectArgs, config: &Config) -> BuildResult<DetectResult> {
    let step = super::yarn_gcp_build(config.clone());
    // Detect never touches layers.
    let ctx = BuildContext::new(&args.app, &args.app);

    let result = step.detect(&ctx).await?;
    match result {
        DetectResult::OptIn(ref reason) => {
            println!("{} {}", style("Opt in:").green().bold(), reason)
        }
        DetectResult::OptOut(ref reason) => {
            println!("{} {}", style("Opt out:").yellow().bold(), reason)
        }
    }
    Ok(result)
}
