//! Test command extraction from ctest
//!
//! `ctest -V` prints, for each test, a `<n>: Test command: ...` line
//! followed by lines carrying the same `<n>: ` prefix. With
//! `BRAINVISA_TEST_REMOTE_COMMAND=echo` the last of those lines is the
//! actual command a test would run, which is what is collected here.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::defaults::ENV_TEST_REMOTE_COMMAND;
use crate::error::ToolError;
use crate::infra::process::ToolCommand;

/// label -> commands to run for it
pub type TestCommands = BTreeMap<String, Vec<String>>;

fn test_command_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^:]*): Test command: .*$").expect("Invalid test command pattern")
    })
}

/// Labels listed by `ctest --print-labels`
///
/// The first two lines are a header.
pub fn parse_labels(output: &str) -> Vec<String> {
    output
        .split('\n')
        .skip(2)
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(String::from)
        .collect()
}

/// Commands found in the output of `ctest -V`
pub fn parse_test_commands(output: &str) -> Vec<String> {
    let lines: Vec<&str> = output.split('\n').collect();
    let mut commands = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if let Some(captures) = test_command_line().captures(lines[i]) {
            let prefix = format!("{}: ", &captures[1]);
            let mut command = None;
            i += 1;
            while i < lines.len() {
                let Some(rest) = lines[i].strip_prefix(&prefix) else {
                    break;
                };
                command = Some(rest);
                i += 1;
            }
            if let Some(command) = command.filter(|c| !c.is_empty()) {
                commands.push(command.to_string());
            }
        }
        i += 1;
    }

    commands
}

/// Ask ctest, run in `build_dir`, for the commands of every labelled test
pub async fn collect_test_commands(build_dir: &Path) -> Result<TestCommands, ToolError> {
    let listing = ToolCommand::new("ctest")
        .arg("--print-labels")
        .current_dir(build_dir)
        .checked_output()
        .await?;
    let labels = parse_labels(&listing.stdout);
    tracing::debug!("ctest labels: {labels:?}");

    let mut tests = TestCommands::new();
    for label in labels {
        let command = ToolCommand::new("ctest")
            .args(["-V", "-L"])
            .arg(format!("^{label}$"))
            .env(ENV_TEST_REMOTE_COMMAND, "echo")
            .current_dir(build_dir);
        let output = command.output().await?;
        if !output.success() {
            // ctest reports "No tests were found" on stderr with status 0
            eprint!("{}", output.stderr);
            return Err(ToolError::Failed {
                command: command.command_line(),
                code: output.code,
            });
        }

        let commands = parse_test_commands(&output.stdout);
        if !commands.is_empty() {
            tests.insert(label, commands);
        }
    }

    Ok(tests)
}
