//! Package forging
//!
//! Walks the build order, keeps the packages chosen by the selector, skips
//! the ones already present in the local channel and hands the rest to a
//! [`PackageBuilder`]. The first build failure stops the run.

use futures::stream::{FuturesUnordered, StreamExt};

use crate::config::defaults::DEFAULT_BUILD_JOBS;
use crate::core::artifact::ArtifactIndex;
use crate::core::graph::DependencyGraph;
use crate::core::recipe::RecipeSet;
use crate::core::scheduler::{Schedule, ScheduledPackage};
use crate::core::selector::PackageSelector;
use crate::error::ForgeError;

/// Something able to turn a recipe into a package in the local channel
#[allow(async_fn_in_trait)]
pub trait PackageBuilder {
    /// Build one package, resolving once the build has finished
    async fn build(&self, package: &ScheduledPackage) -> Result<(), ForgeError>;
}

/// Forge run options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgeOptions {
    /// Build selected packages even if they already exist
    pub force: bool,
    /// Only report the selection, build nothing
    pub show: bool,
    /// Maximum number of concurrent builds
    pub jobs: usize,
}

impl Default for ForgeOptions {
    fn default() -> Self {
        Self {
            force: false,
            show: false,
            jobs: DEFAULT_BUILD_JOBS,
        }
    }
}

/// Outcome of a forge run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForgeReport {
    /// Selected packages that were (or, with `show`, would be) built, in order
    pub selected: Vec<String>,
    /// Packages actually built, in completion order
    pub built: Vec<String>,
    /// Selected packages skipped because an artifact exists
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Unselected,
    Existing,
    Build,
}

/// Selection and skip filter over the build order of a recipe set
#[derive(Debug)]
pub struct Forge<'a> {
    recipes: &'a RecipeSet,
    index: &'a ArtifactIndex,
    selector: PackageSelector,
    options: ForgeOptions,
}

impl<'a> Forge<'a> {
    /// Forge every package of `recipes`, checking artifacts in `index`
    pub fn new(recipes: &'a RecipeSet, index: &'a ArtifactIndex) -> Self {
        Self {
            recipes,
            index,
            selector: PackageSelector::all(),
            options: ForgeOptions::default(),
        }
    }

    /// Restrict the run to packages matched by `selector`
    #[must_use]
    pub fn with_selector(mut self, selector: PackageSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Set run options
    #[must_use]
    pub fn with_options(mut self, options: ForgeOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the forge
    pub async fn run<B: PackageBuilder>(&self, builder: &B) -> Result<ForgeReport, ForgeError> {
        if self.options.show || self.options.jobs <= 1 {
            self.run_sequential(builder).await
        } else {
            self.run_pooled(builder).await
        }
    }

    fn decide(&self, package: &str) -> Result<Decision, ForgeError> {
        if !self.selector.matches(package) {
            return Ok(Decision::Unselected);
        }
        // Queried per package: another process may have built it meanwhile
        if !self.options.force && self.index.contains(package)? {
            tracing::info!("Skip existing package {package}");
            return Ok(Decision::Existing);
        }
        tracing::info!("Build {package}");
        Ok(Decision::Build)
    }

    async fn run_sequential<B: PackageBuilder>(
        &self,
        builder: &B,
    ) -> Result<ForgeReport, ForgeError> {
        let mut report = ForgeReport::default();

        for scheduled in Schedule::new(self.recipes) {
            let package = scheduled?;
            match self.decide(&package.name)? {
                Decision::Unselected => {}
                Decision::Existing => report.skipped.push(package.name),
                Decision::Build => {
                    report.selected.push(package.name.clone());
                    if !self.options.show {
                        builder.build(&package).await?;
                        report.built.push(package.name);
                    }
                }
            }
        }

        Ok(report)
    }

    async fn run_pooled<B: PackageBuilder>(&self, builder: &B) -> Result<ForgeReport, ForgeError> {
        let mut report = ForgeReport::default();
        let mut frontier = DependencyGraph::build(self.recipes).into_frontier();
        let mut running = FuturesUnordered::new();
        let mut failure: Option<ForgeError> = None;

        tracing::info!("Forging with up to {} concurrent builds", self.options.jobs);

        loop {
            while failure.is_none() && running.len() < self.options.jobs {
                let Some(name) = frontier.start() else {
                    break;
                };
                match self.decide(&name) {
                    Ok(Decision::Build) => {
                        report.selected.push(name.clone());
                        let package = ScheduledPackage {
                            recipe_dir: self
                                .recipes
                                .get(&name)
                                .map(|recipe| recipe.recipe_dir().to_path_buf())
                                .unwrap_or_default(),
                            name,
                        };
                        running.push(async move {
                            let result = builder.build(&package).await;
                            (package.name, result)
                        });
                    }
                    Ok(decision) => {
                        if decision == Decision::Existing {
                            report.skipped.push(name.clone());
                        }
                        frontier.complete(&name)?;
                    }
                    Err(e) => failure = Some(e),
                }
            }

            let Some((name, result)) = running.next().await else {
                break;
            };
            match result {
                Ok(()) => {
                    frontier.complete(&name)?;
                    report.built.push(name);
                }
                Err(e) => {
                    tracing::error!("Build of {name} failed, waiting for running builds");
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        if let Some(e) = frontier.stalled() {
            return Err(e.into());
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::REPODATA_FILE;
    use crate::core::recipe::{index_recipes, Recipe};
    use crate::error::{ResolverError, ToolError};
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Records build calls; fails for one package name if asked to
    #[derive(Default)]
    struct RecordingBuilder {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl PackageBuilder for RecordingBuilder {
        async fn build(&self, package: &ScheduledPackage) -> Result<(), ForgeError> {
            tokio::task::yield_now().await;
            self.calls.borrow_mut().push(package.name.clone());
            if self.fail_on == Some(package.name.as_str()) {
                return Err(ToolError::Failed {
                    command: format!("'rattler-build' 'build' '-r' '{}'", package.recipe_dir.display()),
                    code: Some(2),
                }
                .into());
            }
            Ok(())
        }
    }

    fn recipes(specs: &[(&str, &[&str])]) -> RecipeSet {
        index_recipes(specs.iter().map(|(name, requires)| {
            let mut yaml = format!("package:\n  name: {name}\nrequirements:\n  run:\n");
            for requirement in *requires {
                yaml.push_str(&format!("    - {requirement}\n"));
            }
            Recipe::from_yaml(&yaml, format!("/recipes/{name}")).unwrap()
        }))
        .unwrap()
    }

    fn forge_with(dir: &Path, built: &[&str]) -> ArtifactIndex {
        let channel = dir.join("linux-64");
        fs::create_dir_all(&channel).unwrap();
        let entries: Vec<String> = built
            .iter()
            .map(|name| format!(r#""{name}-1.0-0.conda": {{"name": "{name}"}}"#))
            .collect();
        fs::write(
            channel.join(REPODATA_FILE),
            format!(r#"{{"packages.conda": {{{}}}}}"#, entries.join(",")),
        )
        .unwrap();
        ArtifactIndex::new(dir)
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|p| p == name).unwrap()
    }

    #[tokio::test]
    async fn test_builds_in_dependency_order() {
        let dir = TempDir::new().unwrap();
        let index = ArtifactIndex::new(dir.path());
        let recipes = recipes(&[("axon", &["capsul", "python"]), ("capsul", &["soma-base"]), ("soma-base", &[])]);
        let builder = RecordingBuilder::default();

        let report = Forge::new(&recipes, &index).run(&builder).await.unwrap();

        let calls = builder.calls.borrow();
        assert_eq!(*calls, vec!["soma-base", "capsul", "axon"]);
        assert_eq!(report.built, *calls);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_existing_artifact_is_skipped() {
        let dir = TempDir::new().unwrap();
        let index = forge_with(dir.path(), &["soma-base"]);
        let recipes = recipes(&[("capsul", &["soma-base"]), ("soma-base", &[])]);
        let builder = RecordingBuilder::default();

        let report = Forge::new(&recipes, &index).run(&builder).await.unwrap();

        assert_eq!(*builder.calls.borrow(), vec!["capsul"]);
        assert_eq!(report.skipped, vec!["soma-base"]);
    }

    #[tokio::test]
    async fn test_force_rebuilds_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let index = forge_with(dir.path(), &["soma-base"]);
        let recipes = recipes(&[("soma-base", &[])]);
        let builder = RecordingBuilder::default();
        let options = ForgeOptions {
            force: true,
            ..ForgeOptions::default()
        };

        let report = Forge::new(&recipes, &index)
            .with_options(options)
            .run(&builder)
            .await
            .unwrap();

        assert_eq!(*builder.calls.borrow(), vec!["soma-base"]);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_selector_limits_builds() {
        let dir = TempDir::new().unwrap();
        let index = ArtifactIndex::new(dir.path());
        let recipes = recipes(&[("libfoo", &[]), ("libbar", &[]), ("tool", &["libfoo"])]);
        let builder = RecordingBuilder::default();

        let report = Forge::new(&recipes, &index)
            .with_selector(PackageSelector::new(&["lib*"]).unwrap())
            .run(&builder)
            .await
            .unwrap();

        assert_eq!(report.selected, vec!["libbar", "libfoo"]);
        assert!(!builder.calls.borrow().contains(&"tool".to_string()));
    }

    #[tokio::test]
    async fn test_show_builds_nothing() {
        let dir = TempDir::new().unwrap();
        let index = forge_with(dir.path(), &["b"]);
        let recipes = recipes(&[("a", &["b"]), ("b", &[]), ("c", &[])]);
        let builder = RecordingBuilder::default();
        let options = ForgeOptions {
            show: true,
            jobs: 4,
            ..ForgeOptions::default()
        };

        let report = Forge::new(&recipes, &index)
            .with_options(options)
            .run(&builder)
            .await
            .unwrap();

        assert!(builder.calls.borrow().is_empty());
        assert!(report.built.is_empty());
        assert_eq!(report.selected, vec!["a", "c"]);
        assert_eq!(report.skipped, vec!["b"]);
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let index = ArtifactIndex::new(dir.path());
        let recipes = recipes(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        let builder = RecordingBuilder {
            fail_on: Some("b"),
            ..RecordingBuilder::default()
        };

        let err = Forge::new(&recipes, &index).run(&builder).await.unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("/recipes/b"));
        assert_eq!(*builder.calls.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_cycle_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let index = ArtifactIndex::new(dir.path());
        let recipes = recipes(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        let builder = RecordingBuilder::default();

        let err = Forge::new(&recipes, &index).run(&builder).await.unwrap_err();

        match err {
            ForgeError::Resolver(ResolverError::CyclicDependency { packages }) => {
                assert_eq!(packages, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*builder.calls.borrow(), vec!["c"]);
    }

    #[tokio::test]
    async fn test_pooled_run_respects_dependencies() {
        let dir = TempDir::new().unwrap();
        let index = forge_with(dir.path(), &["d"]);
        let recipes = recipes(&[
            ("a", &[]),
            ("b", &[]),
            ("c", &["a", "b"]),
            ("d", &["a"]),
            ("e", &["c", "d"]),
        ]);
        let builder = RecordingBuilder::default();
        let options = ForgeOptions {
            jobs: 3,
            ..ForgeOptions::default()
        };

        let report = Forge::new(&recipes, &index)
            .with_options(options)
            .run(&builder)
            .await
            .unwrap();

        let calls = builder.calls.borrow();
        assert_eq!(calls.len(), 4);
        assert!(position(&calls, "a") < position(&calls, "c"));
        assert!(position(&calls, "b") < position(&calls, "c"));
        assert!(position(&calls, "c") < position(&calls, "e"));
        assert_eq!(report.skipped, vec!["d"]);
        assert_eq!(report.built.len(), 4);
    }

    #[tokio::test]
    async fn test_pooled_run_stops_starting_after_failure() {
        let dir = TempDir::new().unwrap();
        let index = ArtifactIndex::new(dir.path());
        let recipes = recipes(&[("a", &[]), ("b", &[]), ("c", &["a"]), ("d", &["b"])]);
        let builder = RecordingBuilder {
            fail_on: Some("a"),
            ..RecordingBuilder::default()
        };
        let options = ForgeOptions {
            jobs: 2,
            ..ForgeOptions::default()
        };

        let err = Forge::new(&recipes, &index)
            .with_options(options)
            .run(&builder)
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        let calls = builder.calls.borrow();
        // b was already running next to a and is allowed to finish
        assert!(calls.contains(&"b".to_string()));
        assert!(!calls.contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn test_pooled_run_reports_cycle() {
        let dir = TempDir::new().unwrap();
        let index = ArtifactIndex::new(dir.path());
        let recipes = recipes(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        let builder = RecordingBuilder::default();
        let options = ForgeOptions {
            jobs: 2,
            ..ForgeOptions::default()
        };

        let err = Forge::new(&recipes, &index)
            .with_options(options)
            .run(&builder)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ForgeError::Resolver(ResolverError::CyclicDependency { .. })
        ));
    }
}
