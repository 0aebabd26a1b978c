//! Recipe documents and the recipe store
//!
//! A recipe is the `recipe.yaml` consumed by rattler-build. Only the fields
//! the forge needs are modeled: package identity, requirement buckets and the
//! build script. Everything else in the document is ignored.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::defaults::RECIPE_FILE;
use crate::config::ProjectLayout;
use crate::error::RecipeError;

/// Recipes keyed by package name
pub type RecipeSet = BTreeMap<String, Recipe>;

/// A package recipe
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Recipe {
    /// Package identity
    pub package: PackageIdentity,

    /// Requirement buckets (`build`, `host`, `run`, ...)
    #[serde(default, deserialize_with = "requirement_buckets")]
    pub requirements: BTreeMap<String, Vec<Requirement>>,

    /// Build section
    #[serde(default)]
    pub build: BuildSection,

    /// Directory the recipe was loaded from
    #[serde(skip)]
    recipe_dir: PathBuf,
}

/// Package name and version
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PackageIdentity {
    /// Package name
    pub name: String,

    /// Package version (numbers in YAML are kept as written)
    #[serde(default, deserialize_with = "optional_scalar")]
    pub version: Option<String>,
}

/// Build section of a recipe
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BuildSection {
    /// Build script, either a single text block or a list of lines
    #[serde(default)]
    pub script: Option<BuildScript>,
}

/// Build script forms accepted by rattler-build
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BuildScript {
    /// Script as one block of text
    Text(String),
    /// Script as a list of lines
    Lines(Vec<String>),
    /// Any other form (file reference, platform conditionals, ...)
    Other(serde_yaml::Value),
}

impl BuildScript {
    /// Check whether the script text contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Self::Text(text) => text.contains(needle),
            Self::Lines(lines) => lines.iter().any(|line| line.contains(needle)),
            Self::Other(_) => false,
        }
    }
}

/// One entry of a requirement bucket
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Requirement {
    /// `"name [constraint]"`
    Spec(String),
    /// Conditional or otherwise structured requirement, ignored for ordering
    Other(serde_yaml::Value),
}

impl Requirement {
    /// Requirement string, if this entry is a plain string
    pub fn as_spec(&self) -> Option<&str> {
        match self {
            Self::Spec(spec) => Some(spec),
            Self::Other(_) => None,
        }
    }

    /// Referenced package name (first whitespace-delimited token)
    pub fn package_name(&self) -> Option<&str> {
        self.split().map(|(name, _)| name)
    }

    /// Split into package name and optional version constraint
    pub fn split(&self) -> Option<(&str, Option<&str>)> {
        let spec = self.as_spec()?.trim_start();
        let mut parts = spec.splitn(2, char::is_whitespace);
        let name = parts.next().filter(|name| !name.is_empty())?;
        let constraint = parts.next().map(str::trim).filter(|c| !c.is_empty());
        Some((name, constraint))
    }
}

impl Recipe {
    /// Parse a recipe document and attach the directory it came from
    pub fn from_yaml(content: &str, recipe_dir: impl Into<PathBuf>) -> Result<Self, RecipeError> {
        let recipe_dir = recipe_dir.into();
        let mut recipe: Self =
            serde_yaml::from_str(content).map_err(|e| RecipeError::Malformed {
                path: recipe_dir.join(RECIPE_FILE),
                error: e.to_string(),
            })?;

        if recipe.package.name.trim().is_empty() {
            return Err(RecipeError::Malformed {
                path: recipe_dir.join(RECIPE_FILE),
                error: "package.name is empty".to_string(),
            });
        }

        recipe.recipe_dir = recipe_dir;
        Ok(recipe)
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// Directory containing `recipe.yaml`
    pub fn recipe_dir(&self) -> &Path {
        &self.recipe_dir
    }

    /// Entries of one requirement bucket (empty if absent)
    pub fn requirements_of(&self, kind: &str) -> &[Requirement] {
        self.requirements.get(kind).map_or(&[], Vec::as_slice)
    }

    /// Names referenced by string requirements in every bucket
    pub fn requirement_names(&self) -> impl Iterator<Item = &str> {
        self.requirements
            .values()
            .flatten()
            .filter_map(Requirement::package_name)
    }

    /// Check whether the build script mentions `needle`
    pub fn script_contains(&self, needle: &str) -> bool {
        self.build
            .script
            .as_ref()
            .is_some_and(|script| script.contains(needle))
    }
}

/// Loads recipes from `<recipes_dir>/*/recipe.yaml`
#[derive(Debug, Clone)]
pub struct RecipeStore {
    recipes_dir: PathBuf,
}

impl RecipeStore {
    /// Create a store reading from `recipes_dir`
    pub fn new(recipes_dir: impl Into<PathBuf>) -> Self {
        Self {
            recipes_dir: recipes_dir.into(),
        }
    }

    /// Create a store for the project's recipes directory
    pub fn from_layout(layout: &ProjectLayout) -> Self {
        Self::new(layout.recipes_dir())
    }

    /// Directory scanned by this store
    pub fn recipes_dir(&self) -> &Path {
        &self.recipes_dir
    }

    /// Load every recipe found one level below the recipes directory
    pub fn load_all(&self) -> Result<Vec<Recipe>, RecipeError> {
        if !self.recipes_dir.is_dir() {
            tracing::warn!(
                "Recipes directory {} does not exist",
                self.recipes_dir.display()
            );
            return Ok(Vec::new());
        }

        let mut recipes = Vec::new();
        for entry in WalkDir::new(&self.recipes_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| RecipeError::IoError {
                path: e
                    .path()
                    .map_or_else(|| self.recipes_dir.clone(), Path::to_path_buf),
                error: e.to_string(),
            })?;

            if entry.file_name() != RECIPE_FILE || !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let recipe_dir = path.parent().unwrap_or(&self.recipes_dir);
            let content = fs::read_to_string(path).map_err(|e| RecipeError::IoError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

            let recipe = Recipe::from_yaml(&content, recipe_dir)?;
            tracing::debug!(
                "Loaded recipe {} {} from {}",
                recipe.name(),
                recipe.package.version.as_deref().unwrap_or("?"),
                recipe_dir.display()
            );
            recipes.push(recipe);
        }

        Ok(recipes)
    }

    /// Load every recipe and key it by package name
    pub fn load_indexed(&self) -> Result<RecipeSet, RecipeError> {
        index_recipes(self.load_all()?)
    }
}

/// Key recipes by package name, rejecting duplicate names
pub fn index_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Result<RecipeSet, RecipeError> {
    let mut set = RecipeSet::new();
    for recipe in recipes {
        if let Some(existing) = set.get(recipe.name()) {
            return Err(RecipeError::Duplicate {
                name: recipe.name().to_string(),
                first: existing.recipe_dir().to_path_buf(),
                second: recipe.recipe_dir().to_path_buf(),
            });
        }
        set.insert(recipe.name().to_string(), recipe);
    }
    Ok(set)
}

fn requirement_buckets<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<Requirement>>, D::Error>
where
    D: Deserializer<'de>,
{
    // `run:` with nothing under it is null in YAML. Mapping buckets such as
    // `run_exports: {weak: [...]}` list no requirements of their own.
    let raw: Option<BTreeMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    let mut buckets = BTreeMap::new();
    for (kind, value) in raw.unwrap_or_default() {
        let entries = match value {
            serde_yaml::Value::Sequence(_) => {
                Vec::<Requirement>::deserialize(value).map_err(D::Error::custom)?
            }
            _ => Vec::new(),
        };
        buckets.insert(kind, entries);
    }
    Ok(buckets)
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOMA_BASE: &str = r#"
package:
  name: soma-base
  version: 5.2.0

requirements:
  build:
    - cmake
    - ${{ compiler('cxx') }}
  host:
    - libsigcpp >=2.10
    - if: linux
      then: libgl
  run:
    - python >=3.10,<3.13
    - numpy

build:
  script: |
    cmake -DCMAKE_INSTALL_PREFIX=$PREFIX .
"#;

    fn write_recipe(root: &Path, dir: &str, content: &str) {
        let recipe_dir = root.join(dir);
        fs::create_dir_all(&recipe_dir).unwrap();
        fs::write(recipe_dir.join(RECIPE_FILE), content).unwrap();
    }

    #[test]
    fn test_parse_recipe() {
        let recipe = Recipe::from_yaml(SOMA_BASE, "/recipes/soma-base").unwrap();
        assert_eq!(recipe.name(), "soma-base");
        assert_eq!(recipe.package.version.as_deref(), Some("5.2.0"));
        assert_eq!(recipe.recipe_dir(), Path::new("/recipes/soma-base"));
        assert_eq!(recipe.requirements_of("host").len(), 2);
        assert!(recipe.requirements_of("test").is_empty());
    }

    #[test]
    fn test_structured_requirements_are_not_names() {
        let recipe = Recipe::from_yaml(SOMA_BASE, "/recipes/soma-base").unwrap();
        let host = recipe.requirements_of("host");
        assert_eq!(host[0].split(), Some(("libsigcpp", Some(">=2.10"))));
        assert_eq!(host[1].package_name(), None);

        let names: Vec<&str> = recipe.requirement_names().collect();
        assert!(names.contains(&"cmake"));
        assert!(names.contains(&"numpy"));
        assert!(!names.contains(&"libgl"));
    }

    #[test]
    fn test_mapping_buckets_are_not_requirements() {
        let recipe = Recipe::from_yaml(
            r#"
package:
  name: soma-base
requirements:
  host:
    - libsigcpp
  run_exports:
    weak:
      - soma-base
  ignore_run_exports:
    from_package:
      - libsigcpp
"#,
            "/recipes/soma-base",
        )
        .unwrap();

        assert!(recipe.requirements_of("run_exports").is_empty());
        assert!(recipe.requirements_of("ignore_run_exports").is_empty());
        let names: Vec<&str> = recipe.requirement_names().collect();
        assert_eq!(names, vec!["libsigcpp"]);
    }

    #[test]
    fn test_numeric_version_and_null_bucket() {
        let recipe = Recipe::from_yaml(
            "package:\n  name: anatomist\n  version: 5.2\nrequirements:\n  run:\n",
            "/r/anatomist",
        )
        .unwrap();
        assert_eq!(recipe.package.version.as_deref(), Some("5.2"));
        assert!(recipe.requirements_of("run").is_empty());
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let err = Recipe::from_yaml("package:\n  version: 1.0\n", "/r/x").unwrap_err();
        assert!(matches!(err, RecipeError::Malformed { .. }));

        let err = Recipe::from_yaml("package: [", "/r/x").unwrap_err();
        assert!(matches!(err, RecipeError::Malformed { .. }));
    }

    #[test]
    fn test_script_contains() {
        let recipe = Recipe::from_yaml(
            "package:\n  name: axon\nbuild:\n  script:\n    - cp -r $BRAINVISA_INSTALL_PREFIX/bin $PREFIX\n",
            "/r/axon",
        )
        .unwrap();
        assert!(recipe.script_contains("BRAINVISA_INSTALL_PREFIX"));

        let recipe = Recipe::from_yaml(SOMA_BASE, "/r/soma-base").unwrap();
        assert!(!recipe.script_contains("BRAINVISA_INSTALL_PREFIX"));
    }

    #[test]
    fn test_store_loads_each_subdirectory() {
        let dir = TempDir::new().unwrap();
        write_recipe(dir.path(), "soma-base", SOMA_BASE);
        write_recipe(dir.path(), "axon", "package:\n  name: axon\n  version: 1.0\n");
        fs::create_dir_all(dir.path().join("no-recipe-here")).unwrap();
        fs::write(dir.path().join(RECIPE_FILE), "package:\n  name: top-level\n").unwrap();

        let store = RecipeStore::new(dir.path());
        let recipes = store.load_indexed().unwrap();

        assert_eq!(recipes.len(), 2);
        assert_eq!(
            recipes["axon"].recipe_dir(),
            dir.path().join("axon").as_path()
        );
        assert!(recipes.contains_key("soma-base"));
    }

    #[test]
    fn test_store_rejects_duplicate_names() {
        let dir = TempDir::new().unwrap();
        write_recipe(dir.path(), "a", "package:\n  name: same\n");
        write_recipe(dir.path(), "b", "package:\n  name: same\n");

        let err = RecipeStore::new(dir.path()).load_indexed().unwrap_err();
        match err {
            RecipeError::Duplicate { name, .. } => assert_eq!(name, "same"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_store_propagates_malformed_recipe() {
        let dir = TempDir::new().unwrap();
        write_recipe(dir.path(), "broken", "requirements: {}\n");

        let err = RecipeStore::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(err, RecipeError::Malformed { .. }));
    }

    #[test]
    fn test_missing_recipes_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = RecipeStore::new(dir.path().join("recipes"));
        assert!(store.load_all().unwrap().is_empty());
    }
}
