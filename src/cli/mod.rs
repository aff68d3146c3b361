//! Command-line host for the build step

pub mod args;
pub mod commands;

pub use args::{BuildArgs, Cli, Commands, DetectArgs};
