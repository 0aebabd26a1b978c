//! Output formatting
//!
//! Log verbosity selection, status prefixes and error reporting.

use crate::error::{ForgeError, ToolError};

/// Verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Only report errors
    pub quiet: bool,
    /// Number of `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration
    pub fn new(quiet: bool, verbose: u8) -> Self {
        Self { quiet, verbose }
    }

    /// Maximum level of log events shown when `RUST_LOG` does not say otherwise
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Log filter for the tracing subscriber
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive(self.log_level().into())
            .from_env_lossy()
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";
}

/// Print an error and its causes to stderr
pub fn display_error(err: &anyhow::Error) {
    let mut printed: Vec<String> = Vec::new();
    for cause in err.chain() {
        let message = cause.to_string();
        // thiserror wrappers repeat their source in their own message
        if printed.iter().any(|previous| previous.contains(&message)) {
            continue;
        }
        if printed.is_empty() {
            eprintln!("{} {message}", status::ERROR);
        } else {
            eprintln!("  caused by: {message}");
        }
        printed.push(message);
    }
}

/// Process exit status for a failed command
///
/// The exit code of the failing external tool if there is one, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ForgeError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<ToolError>() {
            return e.exit_code();
        }
    }
    1
}
