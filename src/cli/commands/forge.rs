//! Forge command implementation
//!
//! Implements `soma-forge forge [packages...]` to build conda packages from
//! the project recipes into the local forge channel.

use anyhow::{Context, Result};

use crate::cli::commands::build;
use crate::cli::output::status;
use crate::config::ProjectLayout;
use crate::core::artifact::ArtifactIndex;
use crate::core::forge::{Forge, ForgeOptions, ForgeReport};
use crate::core::manifest::ProjectManifest;
use crate::core::recipe::RecipeStore;
use crate::core::selector::PackageSelector;
use crate::infra::rattler::RattlerBuilder;

/// Execute the forge command
pub async fn execute(layout: &ProjectLayout, packages: &[String], options: ForgeOptions) -> Result<()> {
    if !options.show && !layout.success_stamp().exists() {
        tracing::info!("No successful in-tree build, running bv_maker first");
        build::execute(layout).await?;
    }

    let report = forge_packages(layout, packages, options).await?;

    if options.show {
        for package in &report.selected {
            println!("{package}");
        }
    } else if report.built.is_empty() {
        println!("{} Nothing to build", status::SUCCESS);
    } else {
        println!(
            "{} Built {} package(s), {} already present",
            status::SUCCESS,
            report.built.len(),
            report.skipped.len()
        );
    }
    Ok(())
}

/// Forge the recipes matched by `patterns` into the project's channel
///
/// No in-tree build check is done here.
pub async fn forge_packages<S: AsRef<str>>(
    layout: &ProjectLayout,
    patterns: &[S],
    options: ForgeOptions,
) -> Result<ForgeReport> {
    let recipes = RecipeStore::from_layout(layout)
        .load_indexed()
        .context("Failed to load recipes")?;
    let selector = PackageSelector::new(patterns)?;
    let index = ArtifactIndex::from_layout(layout);

    let channels = if options.show {
        Vec::new()
    } else {
        ProjectManifest::load(&layout.manifest_path())?
            .channels()
            .to_vec()
    };
    let builder = RattlerBuilder::new(layout.clone(), &channels);

    let report = Forge::new(&recipes, &index)
        .with_selector(selector)
        .with_options(options)
        .run(&builder)
        .await?;
    Ok(report)
}
