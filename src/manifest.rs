//! package.json parsing
//!
//! Only the `scripts` mapping is interpreted. Every other field is ignored.
//! A `null` scripts section or script counts as absent; a script that is
//! present but not a string makes the manifest invalid.

use crate::error::{BuildError, BuildResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the project manifest at the application root
pub const PACKAGE_JSON: &str = "package.json";

/// Parsed project manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    /// Named scripts (`"scripts": { "gcp-build": "tsc" }`)
    #[serde(default)]
    scripts: Option<HashMap<String, serde_json::Value>>,

    #[serde(skip)]
    path: PathBuf,
}

impl PackageJson {
    /// Read and parse `package.json` from the application root
    pub async fn read(app_root: &Path) -> BuildResult<Self> {
        let path = app_root.join(PACKAGE_JSON);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::io(format!("reading {}", path.display()), e))?;

        Self::parse_at(&content, path)
    }

    /// Parse a manifest from a JSON string
    #[cfg(test)]
    pub fn parse(content: &str) -> BuildResult<Self> {
        Self::parse_at(content, PathBuf::from(PACKAGE_JSON))
    }

    fn parse_at(content: &str, path: PathBuf) -> BuildResult<Self> {
        let mut manifest: Self =
            serde_json::from_str(content).map_err(|e| BuildError::ManifestParse {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        manifest.path = path;
        Ok(manifest)
    }

    /// Body of a named script, `None` when absent, null or empty
    pub fn script(&self, name: &str) -> BuildResult<Option<&str>> {
        let value = match self.scripts.as_ref().and_then(|scripts| scripts.get(name)) {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(value) => value,
        };

        match value.as_str() {
            Some(body) => Ok(Some(body).filter(|body| !body.is_empty())),
            None => Err(BuildError::ManifestParse {
                path: self.path.clone(),
                reason: format!("scripts.{} must be a string, found {}", name, value),
            }),
        }
    }
}
