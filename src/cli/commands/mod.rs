//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod forge;
pub mod setup;
pub mod test_commands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::defaults::DEFAULT_BUILD_JOBS;
use crate::config::ProjectLayout;
use crate::core::forge::ForgeOptions;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up the environment: forge external packages and sync pixi dependencies
    Setup,

    /// Get sources, compile and build brainvisa-cmake components
    Build,

    /// Create conda packages
    Forge {
        /// Select packages using their names or Unix shell-like patterns
        packages: Vec<String>,

        /// Build selected packages even if they exist
        #[arg(short, long)]
        force: bool,

        /// Do not build packages, only show the ones that are selected
        #[arg(short, long)]
        show: bool,

        /// Number of packages built concurrently
        #[arg(short, long, default_value_t = DEFAULT_BUILD_JOBS)]
        jobs: usize,
    },

    /// Print the commands run by each ctest label as JSON
    TestCommands {
        /// Build directory to run ctest in (defaults to <root>/build)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, layout: &ProjectLayout) -> Result<()> {
        match self {
            Self::Setup => setup::execute(layout).await,
            Self::Build => build::execute(layout).await,
            Self::Forge {
                packages,
                force,
                show,
                jobs,
            } => {
                let options = ForgeOptions { force, show, jobs };
                forge::execute(layout, &packages, options).await
            }
            Self::TestCommands { dir } => {
                let build_dir = dir.unwrap_or_else(|| layout.build_dir());
                test_commands::execute(&build_dir).await
            }
        }
    }
}
