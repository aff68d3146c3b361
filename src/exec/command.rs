//! Subprocess invocation descriptors
//!
//! A `CommandSpec` carries everything a runner needs to start a process.
//! Environment overrides are enumerated in `ExecEnv` rather than inherited
//! implicitly, so every variable a step sets is visible at the call site.

use std::fmt;
use std::path::PathBuf;

/// Environment overrides recognized by the build step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecEnv {
    /// `NODE_ENV` for the dependency install
    pub node_env: Option<String>,
}

impl ExecEnv {
    /// Overrides with `NODE_ENV` set
    pub fn with_node_env(node_env: impl Into<String>) -> Self {
        Self {
            node_env: Some(node_env.into()),
        }
    }

    /// Variables to set on the child process
    pub fn vars(&self) -> Vec<(&'static str, &str)> {
        let mut vars = Vec::new();
        if let Some(ref node_env) = self.node_env {
            vars.push(("NODE_ENV", node_env.as_str()));
        }
        vars
    }
}

/// A single subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments, excluding the program
    pub args: Vec<String>,
    /// Environment overrides
    pub env: ExecEnv,
    /// Working directory (inherits the caller's when `None`)
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Start a spec for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: ExecEnv::default(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set environment overrides
    pub fn env(mut self, env: ExecEnv) -> Self {
        self.env = env;
        self
    }

    /// Run in `dir`
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.env.vars() {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Combined stdout and stderr lines in arrival order
    pub lines: Vec<String>,
}

impl CommandOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout and stderr joined as text
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}
