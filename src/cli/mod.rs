//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::defaults::ENV_PROJECT_ROOT;
use crate::config::ProjectLayout;
use commands::Commands;

/// soma-forge - Recipe-driven conda package forge
///
/// Builds the packages of a BrainVISA pixi project from its recipes, in
/// dependency order, into a local conda channel.
#[derive(Parser, Debug)]
#[command(name = "soma-forge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project root directory (defaults to the current directory)
    #[arg(long, global = true, env = ENV_PROJECT_ROOT)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Locations of the project the command operates on
    pub fn layout(&self) -> Result<ProjectLayout> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        Ok(ProjectLayout::new(root))
    }

    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let layout = self.layout()?;
        tracing::debug!("Project root: {}", layout.root().display());

        if let Some(cmd) = self.command {
            cmd.run(&layout).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
