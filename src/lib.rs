//! yarn-gcp-build - Cache-aware yarn build step
//!
//! Detects apps with a yarn.lock and a `gcp-build` script, restores or
//! installs `node_modules` through a fingerprint-keyed dependency layer, and
//! runs the script.

pub mod build;
pub mod buildpack;
pub mod cache;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod events;
pub mod exec;
pub mod lockfile;
pub mod manifest;

pub use build::YarnGcpBuild;
pub use buildpack::{BuildContext, Buildpack, DetectResult};
pub use error::{BuildError, BuildResult};
