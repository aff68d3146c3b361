//! Integration tests for yarn-gcp-build

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn yarn_gcp_build() -> Command {
        cargo_bin_cmd!("yarn-gcp-build")
    }

    #[test]
    fn help_displays() {
        yarn_gcp_build()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache-aware yarn gcp-build step"));
    }

    #[test]
    fn version_displays() {
        yarn_gcp_build()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("yarn-gcp-build"));
    }

    #[test]
    fn build_help() {
        yarn_gcp_build()
            .args(["build", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--layers"));
    }
}

#[cfg(unix)]
mod pipeline_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
  "name": "app",
  "dependencies": { "left-pad": "^1.3.0" },
  "scripts": { "gcp-build": "tsc" }
}"#;

    /// App dir, layers dir, and a stub `yarn` that logs its calls
    struct Pipeline {
        root: TempDir,
    }

    impl Pipeline {
        fn new() -> Self {
            let pipeline = Self {
                root: TempDir::new().unwrap(),
            };
            fs::create_dir_all(pipeline.app()).unwrap();
            fs::create_dir_all(pipeline.layers()).unwrap();
            pipeline.write_stub();
            pipeline.set_deps(&["left-pad"]);
            pipeline
        }

        fn app(&self) -> PathBuf {
            self.root.path().join("app")
        }

        fn layers(&self) -> PathBuf {
            self.root.path().join("layers")
        }

        fn calls_log(&self) -> PathBuf {
            self.root.path().join("calls.log")
        }

        fn events_log(&self) -> PathBuf {
            self.root.path().join("events.jsonl")
        }

        fn write(&self, name: &str, content: &str) {
            fs::write(self.app().join(name), content).unwrap();
        }

        /// Packages the stub installs on `yarn install`
        fn set_deps(&self, deps: &[&str]) {
            let mut content = String::new();
            for dep in deps {
                content.push_str(dep);
                content.push('\n');
            }
            fs::write(self.root.path().join("deps"), content).unwrap();
        }

        fn write_stub(&self) {
            let root = self.root.path().display();
            let stub = format!(
                r#"#!/bin/sh
set -e
echo "$*" >> "{root}/calls.log"
case "$1" in
  install)
    echo "NODE_ENV=$NODE_ENV" >> "{root}/calls.log"
    mkdir -p node_modules
    while read -r dep; do
      mkdir -p "node_modules/$dep"
      echo "$dep" > "node_modules/$dep/index.js"
    done < "{root}/deps"
    ;;
  run)
    echo "saw: $(ls node_modules | tr '\n' ' ')" >> "{root}/calls.log"
    ;;
esac
"#
            );
            let path = self.root.path().join("yarn");
            fs::write(&path, stub).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

            let config = format!(
                "[general]\nevents_log = \"{root}/events.jsonl\"\n\n[build]\npackage_tool = \"{root}/yarn\"\nlockfile = \"none\"\n"
            );
            fs::write(self.root.path().join("config.toml"), config).unwrap();
        }

        fn command(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("yarn-gcp-build");
            cmd.arg("--config").arg(self.root.path().join("config.toml"));
            cmd
        }

        fn detect(&self) -> Command {
            let mut cmd = self.command();
            cmd.arg("detect").arg("--app").arg(self.app());
            cmd
        }

        fn build(&self) -> Command {
            let mut cmd = self.command();
            cmd.arg("build")
                .arg("--app")
                .arg(self.app())
                .arg("--layers")
                .arg(self.layers());
            cmd
        }

        /// Calls logged since the last time this was called
        fn take_calls(&self) -> Vec<String> {
            let calls = fs::read_to_string(self.calls_log()).unwrap_or_default();
            let _ = fs::remove_file(self.calls_log());
            calls.lines().map(String::from).collect()
        }

        fn stored_hash(&self) -> Option<String> {
            let raw = fs::read_to_string(self.layers().join("yarn.toml")).ok()?;
            let doc: toml::Value = toml::from_str(&raw).unwrap();
            doc.get("metadata")?
                .get("dependency_hash")?
                .as_str()
                .map(String::from)
        }

        fn layer_packages(&self) -> Vec<String> {
            list(&self.layers().join("yarn/node_modules"))
        }
    }

    fn list(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn detect_opts_out_without_lockfile() {
        let p = Pipeline::new();
        p.write("package.json", MANIFEST);

        p.detect()
            .assert()
            .code(100)
            .stdout(predicate::str::contains("yarn.lock not found"));
        assert!(p.take_calls().is_empty());
    }

    #[test]
    fn detect_opts_out_without_build_script() {
        let p = Pipeline::new();
        p.write("yarn.lock", "");
        p.write("package.json", r#"{"scripts": {"start": "node ."}}"#);

        p.detect()
            .assert()
            .code(100)
            .stdout(predicate::str::contains(
                "gcp-build script not found in package.json",
            ));
    }

    #[test]
    fn detect_fails_on_malformed_manifest() {
        let p = Pipeline::new();
        p.write("yarn.lock", "");
        p.write("package.json", "{\"scripts\":");

        p.detect()
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Failed to parse"));
    }

    #[test]
    fn detect_opts_in() {
        let p = Pipeline::new();
        p.write("yarn.lock", "");
        p.write("package.json", MANIFEST);

        for _ in 0..2 {
            p.detect().assert().success().stdout(predicate::str::contains(
                "found yarn.lock and package.json with a gcp-build script",
            ));
        }
    }

    #[test]
    fn miss_hit_then_miss_after_manifest_change() {
        let p = Pipeline::new();
        p.write("yarn.lock", "left-pad@^1.3.0:\n  version \"1.3.0\"\n");
        p.write("package.json", MANIFEST);

        // First build: nothing cached yet.
        p.build()
            .assert()
            .success()
            .stderr(predicate::str::contains("Cache miss: dev dependencies"));
        assert_eq!(
            p.take_calls(),
            vec![
                "install --non-interactive",
                "NODE_ENV=development",
                "run gcp-build",
                "saw: left-pad ",
            ]
        );
        let f1 = p.stored_hash().expect("fingerprint stored after miss");
        assert_eq!(p.layer_packages(), vec!["left-pad"]);
        assert!(!p.app().join("node_modules").exists());

        // Second build: same inputs, restored from the layer.
        p.build()
            .assert()
            .success()
            .stderr(predicate::str::contains("Cache hit: dev dependencies"))
            .stderr(predicate::str::contains("package.json scripts will not be run"));
        assert_eq!(p.take_calls(), vec!["run gcp-build", "saw: left-pad "]);
        assert_eq!(p.stored_hash(), Some(f1.clone()));
        assert!(!p.app().join("node_modules").exists());

        // Third build: dependency list edited.
        p.write(
            "package.json",
            r#"{"dependencies": {"right-pad": "^1.0.0"}, "scripts": {"gcp-build": "tsc"}}"#,
        );
        p.set_deps(&["right-pad"]);
        p.build()
            .assert()
            .success()
            .stderr(predicate::str::contains("Cache miss"));
        let calls = p.take_calls();
        assert_eq!(calls[0], "install --non-interactive");
        assert_eq!(calls.last().unwrap(), "saw: right-pad ");
        let f2 = p.stored_hash().unwrap();
        assert_ne!(f1, f2);
        assert_eq!(p.layer_packages(), vec!["right-pad"]);

        let events = fs::read_to_string(p.events_log()).unwrap();
        let kinds: Vec<String> = events
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                v["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(kinds, vec!["cache.miss", "cache.hit", "cache.miss"]);
    }

    #[test]
    fn node_env_override_invalidates_cache() {
        let p = Pipeline::new();
        p.write("yarn.lock", "");
        p.write("package.json", MANIFEST);

        p.build().assert().success();
        p.take_calls();

        p.build()
            .args(["--node-env", "production"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Cache miss"));
        let calls = p.take_calls();
        assert_eq!(calls[1], "NODE_ENV=production");
    }

    #[test]
    fn failing_build_script_fails_build() {
        let p = Pipeline::new();
        p.write("yarn.lock", "");
        p.write("package.json", MANIFEST);
        let failing = p.root.path().join("yarn");
        let stub = fs::read_to_string(&failing)
            .unwrap()
            .replace("  run)\n", "  run)\n    echo 'tsc: compilation failed' >&2\n    exit 2\n");
        fs::write(&failing, stub).unwrap();

        p.build()
            .assert()
            .code(1)
            .stderr(predicate::str::contains("exited with exit code 2"))
            .stderr(predicate::str::contains("tsc: compilation failed"));
        assert!(!p.app().join("node_modules").exists());
    }
}
