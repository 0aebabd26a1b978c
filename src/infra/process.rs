//! External tool invocation
//!
//! Every tool soma-forge drives (rattler-build, pixi, bv_maker, ctest) runs
//! through [`ToolCommand`]. Programs are looked up in `PATH` first so that a
//! missing tool is reported as such instead of as a spawn failure.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::ToolError;

/// Captured result of a tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Check whether the tool exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A command line to run an external tool
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Start a command for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the tool
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run the tool in `dir`
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Quoted command line, for diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .map(|part| format!("'{part}'"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn prepare(&self) -> Result<Command, ToolError> {
        let path = which::which(&self.program).map_err(|_| ToolError::NotFound {
            program: self.program.clone(),
        })?;

        let mut command = Command::new(path);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        Ok(command)
    }

    /// Run the tool with inherited stdio, failing on a non-zero exit
    pub async fn status(&self) -> Result<(), ToolError> {
        tracing::debug!("$ {}", self.command_line());
        let status = self
            .prepare()?
            .status()
            .await
            .map_err(|e| ToolError::Spawn {
                command: self.command_line(),
                error: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Failed {
                command: self.command_line(),
                code: status.code(),
            })
        }
    }

    /// Run the tool and capture its output, whatever its exit status
    pub async fn output(&self) -> Result<ToolOutput, ToolError> {
        tracing::debug!("$ {}", self.command_line());
        let output = self
            .prepare()?
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::Spawn {
                command: self.command_line(),
                error: e.to_string(),
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the tool and capture its output, failing on a non-zero exit
    pub async fn checked_output(&self) -> Result<ToolOutput, ToolError> {
        let output = self.output().await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ToolError::Failed {
                command: self.command_line(),
                code: output.code,
            })
        }
    }
}
