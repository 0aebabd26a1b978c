//! Dependency graph between recipes
//!
//! Only requirements naming another recipe of the same set become edges.
//! Everything else (compilers, system libraries, packages from conda-forge)
//! is already satisfiable and plays no part in the build order.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::recipe::RecipeSet;
use crate::core::scheduler::Frontier;

/// Requirement graph restricted to in-set dependencies
///
/// Packages without in-set dependencies start `ready`, the others start
/// `waiting`. Ordered collections keep the build order reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Packages with no in-set dependency
    pub(crate) ready: BTreeSet<String>,
    /// Packages with at least one in-set dependency
    pub(crate) waiting: BTreeSet<String>,
    /// package -> in-set dependencies
    pub(crate) depends: BTreeMap<String, BTreeSet<String>>,
    /// dependency -> packages depending on it
    pub(crate) dependent: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Build the graph of a recipe set
    pub fn build(recipes: &RecipeSet) -> Self {
        Self::from_requirements(
            recipes
                .iter()
                .map(|(name, recipe)| (name.as_str(), recipe.requirement_names())),
        )
    }

    /// Build the graph from package names and the names they require
    ///
    /// Required names that are not themselves listed packages are dropped.
    pub fn from_requirements<'a, I, R>(packages: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, R)>,
        R: IntoIterator<Item = &'a str>,
    {
        let packages: Vec<(&str, R)> = packages.into_iter().collect();
        let mut graph = Self {
            ready: packages.iter().map(|(name, _)| (*name).to_string()).collect(),
            ..Self::default()
        };

        for (package, requirements) in packages {
            for dependency in requirements {
                if !graph.contains(dependency) {
                    continue;
                }
                if graph.ready.remove(package) {
                    graph.waiting.insert(package.to_string());
                }
                graph
                    .depends
                    .entry(package.to_string())
                    .or_default()
                    .insert(dependency.to_string());
                graph
                    .dependent
                    .entry(dependency.to_string())
                    .or_default()
                    .insert(package.to_string());
            }
        }

        graph
    }

    /// Check whether `name` is a node
    pub fn contains(&self, name: &str) -> bool {
        self.ready.contains(name) || self.waiting.contains(name)
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.ready.len() + self.waiting.len()
    }

    /// Check if the graph has no package
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packages that can be built right away
    pub fn ready(&self) -> &BTreeSet<String> {
        &self.ready
    }

    /// Packages with at least one in-set dependency
    pub fn waiting(&self) -> &BTreeSet<String> {
        &self.waiting
    }

    /// In-set dependencies of `package`
    pub fn dependencies_of(&self, package: &str) -> impl Iterator<Item = &str> {
        self.depends
            .get(package)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Packages depending on `package`
    pub fn dependents_of(&self, package: &str) -> impl Iterator<Item = &str> {
        self.dependent
            .get(package)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Start a scheduling pass over this graph
    pub fn into_frontier(self) -> Frontier {
        Frontier::new(self)
    }
}
