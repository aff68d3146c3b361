//! Fingerprint-keyed dependency layer cache
//!
//! The layer stores one dependency tree and the fingerprint it was installed
//! from. A build compares that stored fingerprint with a fresh one:
//!
//! | Decision | Layer | Working directory |
//! |----------|-------|-------------------|
//! | Hit | untouched | restored from layer |
//! | Miss | cleared, then refilled | installed, then archived to layer |
//!
//! Either way the working `node_modules` ends up reflecting the current
//! package.json and yarn.lock.

pub mod fingerprint;
pub mod layer;

pub use fingerprint::{dependency_fingerprint, Fingerprint, YARN_LOCK};
pub use layer::{Layer, LayerMetadata, NODE_MODULES};

use std::fmt;

/// Why a build cannot restore from the layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// Caching turned off in config
    Disabled,
    /// No fingerprint stored (first build, or a cleared layer)
    NoMetadata,
    /// Inputs changed since the layer was written
    FingerprintChanged,
    /// Fingerprint matches but the dependency tree is gone
    ContentMissing,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "caching disabled"),
            Self::NoMetadata => write!(f, "no previous fingerprint"),
            Self::FingerprintChanged => write!(f, "dependencies changed"),
            Self::ContentMissing => write!(f, "cached node_modules missing"),
        }
    }
}

/// Outcome of comparing the fresh fingerprint with the layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// Restore node_modules from the layer
    Hit,
    /// Reinstall and replace the layer
    Miss(MissReason),
}

impl CacheDecision {
    /// Decide hit or miss from the fresh fingerprint and the layer's state
    pub fn decide(
        enabled: bool,
        current: &Fingerprint,
        stored: &LayerMetadata,
        content_present: bool,
    ) -> Self {
        if !enabled {
            return Self::Miss(MissReason::Disabled);
        }
        match stored.dependency_hash.as_deref() {
            None => Self::Miss(MissReason::NoMetadata),
            Some(hash) if !current.matches(hash) => Self::Miss(MissReason::FingerprintChanged),
            Some(_) if !content_present => Self::Miss(MissReason::ContentMissing),
            Some(_) => Self::Hit,
        }
    }
}

impl fmt::Display for CacheDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "hit"),
            Self::Miss(reason) => write!(f, "miss ({})", reason),
        }
    }
}
