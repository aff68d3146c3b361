//! Process execution capability
//!
//! The builder never spawns processes directly. It goes through a
//! `CommandRunner`, which the host supplies: `SystemRunner` in production,
//! a recording fake in tests.

use crate::error::{BuildError, BuildResult};
use crate::exec::command::{CommandOutput, CommandSpec};
use crate::exec::{build_error_output, stream_child_output};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Abstract subprocess runner
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and return its exit status and output.
    ///
    /// A non-zero exit is not an error at this level; only a failure to
    /// start the process is.
    async fn run(&self, spec: &CommandSpec) -> BuildResult<CommandOutput>;

    /// Run a command and turn a non-zero exit into `BuildError::CommandExit`
    /// carrying the tail of its output
    async fn run_checked(&self, spec: &CommandSpec) -> BuildResult<CommandOutput> {
        let output = self.run(spec).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(BuildError::command_exit(
                spec.to_string(),
                output.code,
                build_error_output(&output.lines),
            ))
        }
    }
}

/// Runs commands on the host with `tokio::process`, streaming output to the log
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> BuildResult<CommandOutput> {
        debug!("Executing: {}", spec);

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref cwd) = spec.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| BuildError::command_failed(spec.to_string(), e))?;

        let lines = stream_child_output(&mut child, &|line: &str| info!("{}", line)).await;

        let status = child
            .wait()
            .await
            .map_err(|e| BuildError::command_failed(spec.to_string(), e))?;

        debug!("{} finished with {}", spec.program, status);
        Ok(CommandOutput {
            code: status.code(),
            lines,
        })
    }
}
