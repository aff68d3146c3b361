//! Persistent dependency layer
//!
//! A layer is a directory under the layers root plus a sibling metadata file:
//!
//! ```text
//! <layers>/yarn/node_modules/   cached dependency tree
//! <layers>/yarn.toml            [metadata] dependency_hash, created_at
//! ```
//!
//! The layer is only mutated on a cache miss, and then always fully replaced.

use crate::error::{BuildError, BuildResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the dependency directory, both in the app and inside the layer
pub const NODE_MODULES: &str = "node_modules";

/// Metadata persisted alongside the layer content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// Fingerprint of the dependency inputs the content was installed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_hash: Option<String>,

    /// When the content was installed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// On-disk layout of `<layers>/<name>.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerToml {
    /// Layer is restored by the host on the next build
    #[serde(default)]
    cache: bool,

    #[serde(default)]
    metadata: LayerMetadata,
}

/// A named, host-persisted dependency layer
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    path: PathBuf,
    metadata_path: PathBuf,
}

impl Layer {
    /// Layer `name` under `layers_dir`
    pub fn new(layers_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: layers_dir.join(name),
            metadata_path: layers_dir.join(format!("{}.toml", name)),
        }
    }

    /// Layer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content directory
    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached dependency tree inside the layer
    pub fn node_modules(&self) -> PathBuf {
        self.path.join(NODE_MODULES)
    }

    /// Whether the layer holds a dependency tree
    pub async fn has_node_modules(&self) -> bool {
        fs::metadata(self.node_modules())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the content directory if it is missing
    pub async fn ensure(&self) -> BuildResult<()> {
        fs::create_dir_all(&self.path).await.map_err(|e| {
            BuildError::io(format!("creating layer directory {}", self.path.display()), e)
        })
    }

    /// Read stored metadata; a layer that was never written has none
    pub async fn read_metadata(&self) -> BuildResult<LayerMetadata> {
        let content = match fs::read_to_string(&self.metadata_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No metadata for layer {}", self.name);
                return Ok(LayerMetadata::default());
            }
            Err(e) => {
                return Err(BuildError::io(
                    format!("reading layer metadata {}", self.metadata_path.display()),
                    e,
                ))
            }
        };

        let parsed: LayerToml =
            toml::from_str(&content).map_err(|e| BuildError::LayerMetadata {
                path: self.metadata_path.clone(),
                reason: e.to_string(),
            })?;
        Ok(parsed.metadata)
    }

    /// Persist metadata and mark the layer as cached
    pub async fn write_metadata(&self, metadata: &LayerMetadata) -> BuildResult<()> {
        let doc = LayerToml {
            cache: true,
            metadata: metadata.clone(),
        };
        let content = toml::to_string_pretty(&doc)?;
        fs::write(&self.metadata_path, content).await.map_err(|e| {
            BuildError::io(
                format!("writing layer metadata {}", self.metadata_path.display()),
                e,
            )
        })
    }

    /// Remove all content and metadata, leaving an empty content directory
    pub async fn clear(&self) -> BuildResult<()> {
        let clear_err = |source: std::io::Error| BuildError::LayerClear {
            name: self.name.clone(),
            source,
        };

        match fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(clear_err(e)),
        }
        match fs::remove_file(&self.metadata_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(clear_err(e)),
        }
        fs::create_dir_all(&self.path).await.map_err(clear_err)?;

        debug!("Cleared layer {}", self.name);
        Ok(())
    }
}
