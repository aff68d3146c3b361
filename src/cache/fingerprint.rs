//! Cache fingerprint computation
//!
//! The dependency layer is keyed by a SHA256 digest over the install mode and
//! the contents of package.json and yarn.lock. Same inputs = same fingerprint;
//! any changed byte, in any input, produces a different one.

use crate::error::{BuildError, BuildResult};
use crate::manifest::PACKAGE_JSON;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the yarn lockfile at the application root
pub const YARN_LOCK: &str = "yarn.lock";

// Component tags keep a string and a file with identical bytes distinct.
const TAG_STRING: u8 = b's';
const TAG_FILE: u8 = b'f';

/// Hex-encoded SHA256 fingerprint of the dependency inputs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Start a new fingerprint
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder::default()
    }

    /// The 64-char lowercase hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a stored digest refers to this fingerprint
    pub fn matches(&self, stored: &str) -> bool {
        self.0 == stored
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accumulates fingerprint components in order
#[derive(Default)]
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    /// Add a string component
    pub fn with_string(mut self, value: &str) -> Self {
        self.component(TAG_STRING, value.as_bytes());
        self
    }

    /// Add the contents of a file
    pub fn with_file(mut self, path: &Path) -> BuildResult<Self> {
        let contents = fs::read(path).map_err(|e| BuildError::Fingerprint {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.component(TAG_FILE, &contents);
        Ok(self)
    }

    /// Finish hashing
    pub fn finish(self) -> Fingerprint {
        Fingerprint(hex::encode(self.hasher.finalize()))
    }

    // Length-prefix every component so bytes cannot shift between them.
    fn component(&mut self, tag: u8, bytes: &[u8]) {
        self.hasher.update([tag]);
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }
}

/// Fingerprint of the dependency set: install mode, package.json, yarn.lock
pub fn dependency_fingerprint(app_root: &Path, node_env: &str) -> BuildResult<Fingerprint> {
    let fingerprint = Fingerprint::builder()
        .with_string(node_env)
        .with_file(&app_root.join(PACKAGE_JSON))?
        .with_file(&app_root.join(YARN_LOCK))?
        .finish();

    debug!("Dependency fingerprint: {}", fingerprint);
    Ok(fingerprint)
}
