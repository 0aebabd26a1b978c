//! Setup command implementation
//!
//! Implements `soma-forge setup`: forges the external recipes, registers the
//! forge channel, fetches brainvisa-cmake and brings the pixi dependencies in
//! line with the recipes.

use anyhow::{Context, Result};

use crate::cli::commands::forge::forge_packages;
use crate::cli::output::status;
use crate::config::urls::{BRAINVISA_CMAKE_DIR, BRAINVISA_CMAKE_REPO};
use crate::config::ProjectLayout;
use crate::core::artifact::ArtifactIndex;
use crate::core::forge::ForgeOptions;
use crate::core::manifest::ProjectManifest;
use crate::core::recipe::RecipeStore;
use crate::core::setup::RecipePartition;
use crate::infra::filesystem;
use crate::infra::git::GitOperations;
use crate::infra::process::ToolCommand;

/// Execute the setup command
pub async fn execute(layout: &ProjectLayout) -> Result<()> {
    let recipes = RecipeStore::from_layout(layout)
        .load_indexed()
        .context("Failed to load recipes")?;
    let partition = RecipePartition::new(&recipes);

    // External packages must exist before bv_maker can run
    let index = ArtifactIndex::from_layout(layout);
    let mut missing = Vec::new();
    for name in partition.external_names() {
        if !index.contains(&name)? {
            missing.push(glob::Pattern::escape(&name));
        }
    }
    if missing.is_empty() {
        tracing::info!("All external packages are already forged");
    } else {
        tracing::info!("Forging {} external package(s)", missing.len());
        forge_packages(layout, &missing, ForgeOptions::default()).await?;
    }

    let mut manifest = ProjectManifest::load(&layout.manifest_path())?;
    let channel = layout.forge_channel();
    if manifest.add_channel(&channel)? {
        manifest.save()?;
        println!("{} Added channel {channel}", status::SUCCESS);
    }

    let sources = layout.sources_dir();
    filesystem::create_dir_all(&sources)?;
    let git = GitOperations::new(sources);
    if !git.is_cloned(BRAINVISA_CMAKE_DIR) {
        tokio::task::spawn_blocking(move || git.clone_repo(BRAINVISA_CMAKE_REPO, BRAINVISA_CMAKE_DIR))
            .await
            .context("brainvisa-cmake clone was interrupted")??;
    }

    let diff = manifest.diff_dependencies(&partition.environment_requirements());
    if diff.is_empty() {
        tracing::info!("Project dependencies are up to date");
    }
    if !diff.remove.is_empty() {
        ToolCommand::new("pixi")
            .arg("remove")
            .args(&diff.remove)
            .current_dir(layout.root())
            .status()
            .await?;
    }
    if !diff.add.is_empty() {
        ToolCommand::new("pixi")
            .arg("add")
            .args(&diff.add)
            .current_dir(layout.root())
            .status()
            .await?;
    }

    println!("{} Environment is set up", status::SUCCESS);
    Ok(())
}
