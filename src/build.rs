//! Cache-aware yarn build step
//!
//! `build` walks a fixed sequence of states:
//!
//! ```text
//! Entry -> Fingerprint -> Compare -+-> Hit  (restore node_modules from layer) -+-> Converge -> Exit
//!                                  +-> Miss (clear layer, install, archive)   -+
//! ```
//!
//! Entry and Exit both remove the app's `node_modules`: it exists only while
//! the build script runs and never ends up in the application image. The
//! layer keeps its own copy for the next build.

use crate::buildpack::{BuildContext, Buildpack, DetectResult};
use crate::cache::{
    dependency_fingerprint, CacheDecision, Fingerprint, Layer, LayerMetadata, MissReason,
    NODE_MODULES,
};
use crate::config::Config;
use crate::detect;
use crate::error::{BuildError, BuildResult};
use crate::events::{names, EventLog};
use crate::exec::{CommandRunner, CommandSpec, ExecEnv};
use crate::lockfile::lockfile_flag;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Runs the project's yarn build script with a fingerprint-cached node_modules
pub struct YarnGcpBuild {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    events: EventLog,
}

impl YarnGcpBuild {
    /// Create the build step
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>, events: EventLog) -> Self {
        Self {
            config,
            runner,
            events,
        }
    }

    /// Everything between Entry and Exit
    async fn reconcile_and_build(&self, ctx: &BuildContext, layer: &Layer) -> BuildResult<()> {
        let fingerprint = dependency_fingerprint(&ctx.app_root, &self.config.build.node_env)?;

        let stored = layer.read_metadata().await?;
        let decision = CacheDecision::decide(
            self.config.cache.enabled,
            &fingerprint,
            &stored,
            layer.has_node_modules().await,
        );
        debug!("Layer {}: cache {}", layer.name(), decision);

        match decision {
            CacheDecision::Hit => self.restore(ctx, layer).await?,
            CacheDecision::Miss(reason) => self.install(ctx, layer, &fingerprint, reason).await?,
        }

        self.run_build_script(ctx).await
    }

    /// Hit: copy the layer's node_modules into the app
    async fn restore(&self, ctx: &BuildContext, layer: &Layer) -> BuildResult<()> {
        self.events.cache_hit(&self.config.cache.tag).await;
        info!(
            "Due to cache hit, package.json scripts will not be run. To run the scripts, disable caching."
        );

        self.archive_copy(ctx, &layer.node_modules(), &ctx.app_root.join(NODE_MODULES))
            .await
    }

    /// Miss: reinstall from scratch and replace the layer
    async fn install(
        &self,
        ctx: &BuildContext,
        layer: &Layer,
        fingerprint: &Fingerprint,
        reason: MissReason,
    ) -> BuildResult<()> {
        self.events
            .cache_miss(&self.config.cache.tag, &reason.to_string())
            .await;

        // Cleared before installing so a failed install leaves nothing to restore.
        layer.clear().await?;

        let build = &self.config.build;
        let flag = lockfile_flag(&*self.runner, &build.package_tool, build.lockfile, &ctx.app_root)
            .await?;
        let spec = CommandSpec::new(&build.package_tool)
            .args(["install", "--non-interactive"])
            .args(flag)
            .env(ExecEnv::with_node_env(&build.node_env))
            .current_dir(&ctx.app_root);
        info!("Installing dependencies: {}", spec);
        self.runner.run_checked(&spec).await?;

        // A project without dependencies still gets an (empty) node_modules.
        let working = ctx.app_root.join(NODE_MODULES);
        fs::create_dir_all(&working)
            .await
            .map_err(|e| BuildError::io(format!("creating {}", working.display()), e))?;

        if reason == MissReason::Disabled {
            return Ok(());
        }

        self.archive_copy(ctx, &working, &layer.node_modules()).await?;
        layer
            .write_metadata(&LayerMetadata {
                dependency_hash: Some(fingerprint.to_string()),
                created_at: Some(Utc::now()),
            })
            .await
    }

    /// Converge: `yarn run <script>`
    async fn run_build_script(&self, ctx: &BuildContext) -> BuildResult<()> {
        let build = &self.config.build;
        let spec = CommandSpec::new(&build.package_tool)
            .args(["run", build.script.as_str()])
            .current_dir(&ctx.app_root);
        info!("Running {} script", build.script);
        self.runner.run_checked(&spec).await?;
        Ok(())
    }

    /// `cp --archive`, preserving ownership, modes and timestamps
    async fn archive_copy(&self, ctx: &BuildContext, from: &Path, to: &Path) -> BuildResult<()> {
        debug!("Copying {} to {}", from.display(), to.display());
        let spec = CommandSpec::new("cp")
            .arg("--archive")
            .arg(from.to_string_lossy())
            .arg(to.to_string_lossy())
            .current_dir(&ctx.app_root);
        self.runner.run_checked(&spec).await?;
        Ok(())
    }
}

#[async_trait]
impl Buildpack for YarnGcpBuild {
    async fn detect(&self, ctx: &BuildContext) -> BuildResult<DetectResult> {
        let result = detect::detect(&ctx.app_root, &self.config.build.script).await?;

        let event = if result.is_opt_in() {
            names::DETECT_OPT_IN
        } else {
            names::DETECT_OPT_OUT
        };
        info!("{}", result);
        self.events
            .log(event, &json!({ "reason": result.reason() }))
            .await;

        Ok(result)
    }

    async fn build(&self, ctx: &BuildContext) -> BuildResult<()> {
        let working = ctx.app_root.join(NODE_MODULES);
        remove_all(&working).await?;

        let layer = Layer::new(&ctx.layers_dir, &self.config.cache.layer);
        layer.ensure().await?;

        let result = self.reconcile_and_build(ctx, &layer).await;

        match (result, remove_all(&working).await) {
            (Ok(()), cleanup) => cleanup,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!("Also failed to clean up after the error: {}", cleanup);
                Err(e)
            }
        }
    }
}

/// Remove `path` whatever it is: directory tree, file or (dangling) symlink
async fn remove_all(path: &Path) -> BuildResult<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(BuildError::io(format!("inspecting {}", path.display()), e)),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(format!("removing {}", path.display()), e)),
    }
}
