//! Error types for yarn-gcp-build
//!
//! All modules use `BuildResult<T>` as their return type. Inapplicability is
//! not an error: the detector reports it as an opt-out instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build step operations
pub type BuildResult<T> = Result<T, BuildError>;

/// All errors that can abort a detect or build invocation
#[derive(Error, Debug)]
pub enum BuildError {
    // Input errors
    #[error("Failed to parse {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Failed to compute cache fingerprint: cannot read {path}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Layer errors
    #[error("Invalid layer metadata at {path}: {reason}")]
    LayerMetadata { path: PathBuf, reason: String },

    #[error("Failed to clear layer {name}: {source}")]
    LayerClear {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {}{}", exit_label(.code), output_suffix(.output))]
    CommandExit {
        command: String,
        code: Option<i32>,
        output: String,
    },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(":\n{}", output)
    }
}

impl BuildError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an error for a command that ran but exited unsuccessfully
    pub fn command_exit(command: impl Into<String>, code: Option<i32>, output: impl Into<String>) -> Self {
        Self::CommandExit {
            command: command.into(),
            code,
            output: output.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestParse { .. } => Some("Fix the JSON syntax in package.json"),
            Self::CommandFailed { .. } => Some("Make sure yarn and cp are installed and on PATH"),
            Self::LayerMetadata { .. } => {
                Some("Delete the layer metadata file to force a clean dependency install")
            }
            _ => None,
        }
    }
}
