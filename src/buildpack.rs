//! Host-facing build step interface
//!
//! The host decides when to call `detect` and `build`; implementations only
//! act on the `BuildContext` they are handed.

use crate::error::BuildResult;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Directories a build step operates on
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Application source tree (also the working directory for commands)
    pub app_root: PathBuf,
    /// Root under which the host persists layers between builds
    pub layers_dir: PathBuf,
}

impl BuildContext {
    /// Create a context for `app_root` with layers under `layers_dir`
    pub fn new(app_root: impl Into<PathBuf>, layers_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            layers_dir: layers_dir.into(),
        }
    }
}

/// Whether a build step applies to a source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectResult {
    /// The step applies
    OptIn(String),
    /// The step does not apply; not an error
    OptOut(String),
}

impl DetectResult {
    /// Opt in with a reason
    pub fn opt_in(reason: impl Into<String>) -> Self {
        Self::OptIn(reason.into())
    }

    /// Opt out with a reason
    pub fn opt_out(reason: impl Into<String>) -> Self {
        Self::OptOut(reason.into())
    }

    /// Opt out because a required file is absent
    pub fn opt_out_file_not_found(file: &str) -> Self {
        Self::OptOut(format!("{} not found", file))
    }

    /// Whether the step applies
    pub fn is_opt_in(&self) -> bool {
        matches!(self, Self::OptIn(_))
    }

    /// Human-readable reason for the decision
    pub fn reason(&self) -> &str {
        match self {
            Self::OptIn(reason) | Self::OptOut(reason) => reason,
        }
    }
}

impl fmt::Display for DetectResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptIn(reason) => write!(f, "opt-in: {}", reason),
            Self::OptOut(reason) => write!(f, "opt-out: {}", reason),
        }
    }
}

/// A build step invoked by the host
#[async_trait]
pub trait Buildpack: Send + Sync {
    /// Decide whether this step applies. Must not modify anything.
    async fn detect(&self, ctx: &BuildContext) -> BuildResult<DetectResult>;

    /// Run the step. Only called after `detect` opted in.
    async fn build(&self, ctx: &BuildContext) -> BuildResult<()>;
}
