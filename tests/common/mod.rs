//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests. External
//! tools (rattler-build, pixi, bv_maker, ctest) are replaced by shell
//! scripts placed first in `PATH`.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// File receiving one line per fake tool invocation
pub const CALLS_LOG: &str = "calls.log";

/// Fake tool script appending its name and arguments to [`CALLS_LOG`]
pub const LOGGING_TOOL: &str = r#"echo "$(basename "$0") $*" >> "$PIXI_PROJECT_ROOT/calls.log""#;

/// Sample pixi manifest for testing
pub const SAMPLE_MANIFEST: &str = r#"# BrainVISA development environment
[project]
name = "brainvisa"
channels = ["conda-forge"]  # upstream first
platforms = ["linux-64"]

[dependencies]
python = ">=3.10"
cmake = ">=3.18"
"#;

/// Test project context
///
/// Creates a temporary project root and a directory for fake tools.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Directory holding fake tools, first in `PATH`
    pub bin: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            bin: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write `recipes/<name>/recipe.yaml` with run requirements and a build script
    pub fn add_recipe(&self, name: &str, run: &[&str], script: &str) {
        let mut yaml = format!("package:\n  name: {name}\n  version: \"1.0.0\"\nrequirements:\n  run:\n");
        for requirement in run {
            yaml.push_str(&format!("    - {requirement}\n"));
        }
        yaml.push_str("build:\n  script: |\n");
        for line in script.lines() {
            yaml.push_str(&format!("    {line}\n"));
        }
        self.create_file(&format!("recipes/{name}/recipe.yaml"), &yaml);
    }

    /// Write a recipe that packages the in-tree build
    pub fn add_in_tree_recipe(&self, name: &str, run: &[&str]) {
        self.add_recipe(name, run, "cp -a $BRAINVISA_INSTALL_PREFIX/. $PREFIX");
    }

    /// Register already built packages in the forge channel
    pub fn add_artifacts(&self, names: &[&str]) {
        let entries: Vec<String> = names
            .iter()
            .map(|name| {
                format!(r#""{name}-1.0.0-0.conda": {{"name": "{name}", "version": "1.0.0", "build": "0"}}"#)
            })
            .collect();
        self.create_file(
            "forge/noarch/repodata.json",
            &format!(r#"{{"packages": {{}}, "packages.conda": {{{}}}}}"#, entries.join(", ")),
        );
    }

    /// Install a fake tool running `body` as a shell script
    #[cfg(unix)]
    pub fn fake_tool(&self, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.bin.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake tool executable");
    }

    /// Invocations recorded by fake tools using [`LOGGING_TOOL`]
    pub fn calls(&self) -> Vec<String> {
        if !self.file_exists(CALLS_LOG) {
            return Vec::new();
        }
        self.read_file(CALLS_LOG).lines().map(String::from).collect()
    }

    /// Run soma-forge on this project
    pub fn run(&self, args: &[&str]) -> Output {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let mut paths = vec![self.bin.path().to_path_buf()];
        paths.extend(std::env::split_paths(&path));

        Command::new(env!("CARGO_BIN_EXE_soma-forge"))
            .current_dir(self.dir.path())
            .env("PATH", std::env::join_paths(paths).expect("Invalid PATH"))
            .env("PIXI_PROJECT_ROOT", self.dir.path())
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute soma-forge")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard output of a run, as text
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Standard error of a run, as text
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
