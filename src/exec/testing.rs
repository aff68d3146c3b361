//! Recording command runner for tests
//!
//! `cp` runs for real so layer round-trips can be checked on disk. `yarn
//! install` is simulated by writing the configured packages into
//! `node_modules` of the working directory. Everything else succeeds with
//! scripted or empty output.

use crate::error::BuildResult;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

type Hook = Box<dyn Fn(&CommandSpec) + Send + Sync>;

#[derive(Default)]
pub(crate) struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    snapshots: Mutex<Vec<Option<Vec<String>>>>,
    responses: HashMap<String, CommandOutput>,
    hooks: HashMap<String, Hook>,
    packages: Vec<(String, String)>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `yarn install` creates `node_modules/<name>/index.js` with `body`
    pub(crate) fn with_package(mut self, name: &str, body: &str) -> Self {
        self.packages.push((name.to_string(), body.to_string()));
        self
    }

    /// Reply to the exact argv `command` with `code` and `stdout`
    pub(crate) fn respond(mut self, command: &str, code: i32, stdout: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            CommandOutput {
                code: Some(code),
                lines: stdout.lines().map(String::from).collect(),
            },
        );
        self
    }

    /// Run `hook` when the exact argv `command` starts, before its response
    pub(crate) fn on(
        mut self,
        command: &str,
        hook: impl Fn(&CommandSpec) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.insert(command.to_string(), Box::new(hook));
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Sorted entries of `<cwd>/node_modules` when `command` started, `None`
    /// if the directory did not exist or `command` never ran
    pub(crate) fn node_modules_at(&self, command: &str) -> Option<Vec<String>> {
        let index = self.commands().iter().position(|c| c == command)?;
        self.snapshots.lock().unwrap()[index].clone()
    }

    /// Recorded argv strings, in call order
    pub(crate) fn commands(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.argv().join(" ")).collect()
    }

    fn install(&self, spec: &CommandSpec) {
        let root = spec.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        for (name, body) in &self.packages {
            let dir = root.join("node_modules").join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("index.js"), body).unwrap();
        }
    }
}

fn snapshot(spec: &CommandSpec) -> Option<Vec<String>> {
    let root = spec.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut entries: Vec<String> = std::fs::read_dir(root.join("node_modules"))
        .ok()?
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    Some(entries)
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> BuildResult<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        self.snapshots.lock().unwrap().push(snapshot(spec));

        let argv = spec.argv().join(" ");
        if let Some(hook) = self.hooks.get(&argv) {
            hook(spec);
        }
        if let Some(output) = self.responses.get(&argv) {
            return Ok(output.clone());
        }
        if spec.program == "cp" {
            return SystemRunner::new().run(spec).await;
        }
        if spec.args.first().map(String::as_str) == Some("install") {
            self.install(spec);
        }
        Ok(CommandOutput {
            code: Some(0),
            lines: Vec::new(),
        })
    }
}
