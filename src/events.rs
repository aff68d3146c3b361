//! Build event reporting
//!
//! Detect decisions and cache hits/misses are always logged through
//! `tracing`. When `general.events_log` is set they are also appended as JSON
//! lines, one object per event with `timestamp`, `event` and `data`.

use crate::config::Config;
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Event names
pub mod names {
    pub const DETECT_OPT_IN: &str = "detect.opt_in";
    pub const DETECT_OPT_OUT: &str = "detect.opt_out";
    pub const CACHE_HIT: &str = "cache.hit";
    pub const CACHE_MISS: &str = "cache.miss";
}

/// Event sink for host-visible build signals
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    /// Create an event log from config
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.general.events_log.clone(),
        }
    }

    /// Event log that only emits tracing output
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Event log appending to `path`
    #[cfg(test)]
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Cache hit for the given category
    pub async fn cache_hit(&self, tag: &str) {
        info!("Cache hit: {}", tag);
        self.log(names::CACHE_HIT, &json!({ "tag": tag })).await;
    }

    /// Cache miss for the given category
    pub async fn cache_miss(&self, tag: &str, reason: &str) {
        info!("Cache miss: {} ({})", tag, reason);
        self.log(names::CACHE_MISS, &json!({ "tag": tag, "reason": reason }))
            .await;
    }

    /// Append an event as a JSON line
    ///
    /// Write failures are logged and dropped; event reporting never fails a
    /// build.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        let Some(ref path) = self.path else {
            return;
        };

        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize build event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = append(path, &line).await {
            warn!("Failed to write events log {}: {}", path.display(), e);
        }
    }
}

async fn append(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
