//! Build command implementation
//!
//! Implements `soma-forge build`: compiles the in-tree sources with
//! `bv_maker` and records success with a stamp file.

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::config::ProjectLayout;
use crate::infra::filesystem;
use crate::infra::process::ToolCommand;

/// Execute the build command
pub async fn execute(layout: &ProjectLayout) -> Result<()> {
    let stamp = layout.success_stamp();
    filesystem::remove_file(&stamp)?;

    tracing::info!("Compiling in-tree sources in {}", layout.root().display());
    ToolCommand::new("bv_maker")
        .current_dir(layout.root())
        .status()
        .await
        .context("In-tree build failed")?;

    filesystem::write_file(&stamp, "")
        .with_context(|| format!("Failed to write {}", stamp.display()))?;
    println!("{} In-tree build succeeded", status::SUCCESS);
    Ok(())
}
