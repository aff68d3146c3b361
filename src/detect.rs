//! Applicability check
//!
//! The step applies when the app has a yarn.lock and a package.json that
//! defines the build script. A missing file or script is an opt-out; a
//! package.json that exists but does not parse is an error.

use crate::buildpack::DetectResult;
use crate::cache::YARN_LOCK;
use crate::error::BuildResult;
use crate::manifest::{PackageJson, PACKAGE_JSON};
use std::path::Path;
use tracing::debug;

/// Decide whether the yarn build script step applies to `app_root`
pub async fn detect(app_root: &Path, script: &str) -> BuildResult<DetectResult> {
    if !file_exists(&app_root.join(YARN_LOCK)).await {
        return Ok(DetectResult::opt_out_file_not_found(YARN_LOCK));
    }
    if !file_exists(&app_root.join(PACKAGE_JSON)).await {
        return Ok(DetectResult::opt_out_file_not_found(PACKAGE_JSON));
    }

    let manifest = PackageJson::read(app_root).await?;
    match manifest.script(script)? {
        None => Ok(DetectResult::opt_out(format!(
            "{} script not found in {}",
            script, PACKAGE_JSON
        ))),
        Some(body) => {
            debug!("Found {} script: {}", script, body);
            Ok(DetectResult::opt_in(format!(
                "found {} and {} with a {} script",
                YARN_LOCK, PACKAGE_JSON, script
            )))
        }
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
