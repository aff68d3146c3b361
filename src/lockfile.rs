//! Lockfile flag selection for `yarn install`
//!
//! Yarn 1 spells "fail instead of rewriting yarn.lock" as `--frozen-lockfile`;
//! Yarn 2+ (berry) spells it `--immutable`. The installed yarn is asked for
//! its version to pick the right one.

use crate::config::LockfileMode;
use crate::error::BuildResult;
use crate::exec::{CommandRunner, CommandSpec};
use semver::Version;
use std::path::Path;
use tracing::{debug, warn};

/// Yarn 1 frozen-lockfile flag
pub const FROZEN_LOCKFILE_FLAG: &str = "--frozen-lockfile";

/// Yarn 2+ frozen-lockfile flag
pub const IMMUTABLE_FLAG: &str = "--immutable";

/// Choose the lockfile flag for `yarn install`, if any.
///
/// - `None` never passes a flag and runs nothing.
/// - `Frozen` always passes one; Yarn 1 is assumed when the version is unknown.
/// - `Auto` passes one only when the yarn version can be determined.
pub async fn lockfile_flag(
    runner: &dyn CommandRunner,
    package_tool: &str,
    mode: LockfileMode,
    app_root: &Path,
) -> BuildResult<Option<&'static str>> {
    if mode == LockfileMode::None {
        return Ok(None);
    }

    let flag = match yarn_version(runner, package_tool, app_root).await? {
        Some(version) => {
            debug!("Detected yarn {}", version);
            Some(flag_for(&version))
        }
        None if mode == LockfileMode::Frozen => Some(FROZEN_LOCKFILE_FLAG),
        None => {
            warn!("Could not determine yarn version; installing without a frozen lockfile");
            None
        }
    };
    Ok(flag)
}

fn flag_for(version: &Version) -> &'static str {
    if version.major >= 2 {
        IMMUTABLE_FLAG
    } else {
        FROZEN_LOCKFILE_FLAG
    }
}

/// Ask the package tool for its version; `None` if it exits non-zero or
/// prints something that is not a version
async fn yarn_version(
    runner: &dyn CommandRunner,
    package_tool: &str,
    app_root: &Path,
) -> BuildResult<Option<Version>> {
    let spec = CommandSpec::new(package_tool)
        .arg("--version")
        .current_dir(app_root);
    let output = runner.run(&spec).await?;
    if !output.success() {
        return Ok(None);
    }
    Ok(parse_version(&output.lines))
}

/// The last non-empty line is the version; yarn may print warnings first
fn parse_version(lines: &[String]) -> Option<Version> {
    let line = lines.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty())?;
    Version::parse(line.trim_start_matches('v')).ok()
}
