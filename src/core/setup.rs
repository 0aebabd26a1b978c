//! Environment setup logic
//!
//! Recipes come in two flavors. In-tree recipes package the result of the
//! `bv_maker` compilation (their build script copies from
//! `$BRAINVISA_INSTALL_PREFIX`). External recipes build third-party
//! software from its own sources and must exist before `bv_maker` can run.

use std::collections::BTreeSet;

use crate::config::defaults::IN_TREE_SCRIPT_MARKER;
use crate::core::manifest::{collect_requirements, Constraints};
use crate::core::recipe::{Recipe, RecipeSet};

/// Recipes split by how they are built
#[derive(Debug, Default)]
pub struct RecipePartition<'a> {
    /// Recipes building third-party software
    pub external: Vec<&'a Recipe>,
    /// Recipes packaging the in-tree `bv_maker` build
    pub in_tree: Vec<&'a Recipe>,
}

impl<'a> RecipePartition<'a> {
    /// Partition a recipe set
    pub fn new(recipes: &'a RecipeSet) -> Self {
        let (in_tree, external) = recipes
            .values()
            .partition(|recipe| recipe.script_contains(IN_TREE_SCRIPT_MARKER));
        Self { external, in_tree }
    }

    /// Names of the in-tree packages
    pub fn in_tree_names(&self) -> BTreeSet<String> {
        self.in_tree
            .iter()
            .map(|recipe| recipe.name().to_string())
            .collect()
    }

    /// Names of the external packages
    pub fn external_names(&self) -> Vec<String> {
        self.external
            .iter()
            .map(|recipe| recipe.name().to_string())
            .collect()
    }

    /// Run and build requirements the project environment must provide
    ///
    /// In-tree packages are produced by the forge itself and never become
    /// project dependencies.
    pub fn environment_requirements(&self) -> Constraints {
        collect_requirements(
            self.external.iter().chain(&self.in_tree).copied(),
            &self.in_tree_names(),
        )
    }
}
