//! Configuration schema for yarn-gcp-build
//!
//! Configuration is stored at `~/.config/yarn-gcp-build/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Dependency install and build script settings
    pub build: BuildConfig,

    /// Dependency layer cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append build events (detect decisions, cache hits/misses) as JSON lines
    pub events_log: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            events_log: None,
        }
    }
}

/// How the frozen-lockfile flag is chosen for `yarn install`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockfileMode {
    /// Inspect the yarn version and lockfile state
    #[default]
    Auto,
    /// Always pass the frozen-lockfile flag
    Frozen,
    /// Never pass a lockfile flag
    None,
}

/// Dependency install and build script settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Package manager executable
    pub package_tool: String,

    /// `NODE_ENV` used for the install; also part of the cache fingerprint
    pub node_env: String,

    /// package.json script run after dependencies are in place
    pub script: String,

    /// Lockfile flag selection
    pub lockfile: LockfileMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            package_tool: "yarn".to_string(),
            node_env: "development".to_string(),
            script: "gcp-build".to_string(),
            lockfile: LockfileMode::Auto,
        }
    }
}

/// Dependency layer cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Restore node_modules from the layer when the fingerprint matches
    pub enabled: bool,

    /// Name of the dependency layer under the layers directory
    pub layer: String,

    /// Category label attached to cache hit/miss events
    pub tag: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            layer: "yarn".to_string(),
            tag: "dev dependencies".to_string(),
        }
    }
}
