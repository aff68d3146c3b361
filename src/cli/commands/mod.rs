//! CLI command implementations

pub mod build;
pub mod detect;

pub use build::execute as build;
pub use detect::execute as detect;

use crate::build::YarnGcpBuild;
use crate::config::Config;
use crate::events::EventLog;
use crate::exec::SystemRunner;
use std::sync::Arc;

/// Build step wired to real subprocesses
fn yarn_gcp_build(config: Config) -> YarnGcpBuild {
    let events = EventLog::new(&config);
    YarnGcpBuild::new(config, Arc::new(SystemRunner::new()), events)
}
