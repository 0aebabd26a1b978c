//! Project manifest (pixi.toml) handling
//!
//! The manifest is read into a typed view with `toml` and edited through a
//! `toml_edit` document, so that rewriting it keeps comments, ordering and
//! every table soma-forge does not care about.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item};

use crate::core::recipe::Recipe;
use crate::error::ManifestError;

/// Requirement kinds that end up in the project environment
const ENVIRONMENT_REQUIREMENT_KINDS: [&str; 2] = ["run", "build"];

/// package name -> version constraints
pub type Constraints = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Default, Deserialize)]
struct ManifestView {
    #[serde(default)]
    project: Option<ChannelsSection>,
    /// Newer pixi releases name the project table `[workspace]`
    #[serde(default)]
    workspace: Option<ChannelsSection>,
    #[serde(default)]
    dependencies: BTreeMap<String, DependencySpec>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelsSection {
    #[serde(default)]
    channels: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Version(String),
    Detailed {
        #[serde(default)]
        version: Option<String>,
    },
}

impl DependencySpec {
    fn version(&self) -> &str {
        match self {
            Self::Version(version) => version,
            Self::Detailed { version } => version.as_deref().unwrap_or("*"),
        }
    }
}

/// Changes needed to bring `[dependencies]` in line with the recipes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyDiff {
    /// Packages whose declared constraints differ (removed before re-adding)
    pub remove: Vec<String>,
    /// Match specs to add, `name c1,c2` or `name =*`
    pub add: Vec<String>,
}

impl DependencyDiff {
    /// Check whether the manifest is already up to date
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// A loaded pixi.toml
#[derive(Debug)]
pub struct ProjectManifest {
    path: PathBuf,
    document: DocumentMut,
    view: ManifestView,
}

impl ProjectManifest {
    /// Load the manifest at `path`
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// Parse manifest `content` that lives (or will live) at `path`
    pub fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        let document = content
            .parse::<DocumentMut>()
            .map_err(|e| ManifestError::ParseError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
        let view: ManifestView = toml::from_str(content).map_err(|e| ManifestError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            document,
            view,
        })
    }

    /// Manifest location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Channels of the project, in priority order
    pub fn channels(&self) -> &[String] {
        self.view
            .project
            .as_ref()
            .or(self.view.workspace.as_ref())
            .map_or(&[], |section| section.channels.as_slice())
    }

    /// Constraint string declared for `package` in `[dependencies]`
    pub fn dependency(&self, package: &str) -> Option<&str> {
        self.view.dependencies.get(package).map(DependencySpec::version)
    }

    /// Append `channel` to the project channels if missing
    ///
    /// Returns whether the manifest changed.
    pub fn add_channel(&mut self, channel: &str) -> Result<bool, ManifestError> {
        if self.channels().iter().any(|c| c == channel) {
            return Ok(false);
        }

        let table_name = if self.document.contains_key("project") || !self.document.contains_key("workspace") {
            "project"
        } else {
            "workspace"
        };
        let channels = self
            .document
            .get_mut(table_name)
            .and_then(Item::as_table_like_mut)
            .and_then(|table| table.get_mut("channels"))
            .and_then(Item::as_array_mut)
            .ok_or_else(|| ManifestError::InvalidField {
                path: self.path.clone(),
                field: format!("{table_name}.channels"),
                error: "expected an array of channels".to_string(),
            })?;
        channels.push(channel);

        let section = match table_name {
            "project" => &mut self.view.project,
            _ => &mut self.view.workspace,
        };
        section
            .get_or_insert_with(ChannelsSection::default)
            .channels
            .push(channel.to_string());

        Ok(true)
    }

    /// Compare `[dependencies]` with the constraints required by the recipes
    pub fn diff_dependencies(&self, required: &Constraints) -> DependencyDiff {
        let mut diff = DependencyDiff::default();

        for (package, constraints) in required {
            if let Some(declared) = self.dependency(package) {
                if normalize_constraints([declared]) == *constraints {
                    continue;
                }
                diff.remove.push(package.clone());
            }

            if constraints.is_empty() {
                diff.add.push(format!("{package} =*"));
            } else {
                let joined: Vec<&str> = constraints.iter().map(String::as_str).collect();
                diff.add.push(format!("{package} {}", joined.join(",")));
            }
        }

        diff
    }

    /// Serialize the manifest, preserving formatting and comments
    pub fn to_toml(&self) -> String {
        self.document.to_string()
    }

    /// Write the manifest back to its path
    pub fn save(&self) -> Result<(), ManifestError> {
        fs::write(&self.path, self.to_toml()).map_err(|e| ManifestError::IoError {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }
}

/// Split comma-separated constraints into a set; `*` means no constraint
pub fn normalize_constraints<'a>(constraints: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    constraints
        .into_iter()
        .flat_map(|constraint| constraint.split(','))
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "*")
        .map(String::from)
        .collect()
}

/// Collect the run and build requirements of `recipes` into constraints
///
/// Template expressions (`${{ compiler('c') }}`) and packages listed in
/// `exclude` are left out.
pub fn collect_requirements<'a>(
    recipes: impl IntoIterator<Item = &'a Recipe>,
    exclude: &BTreeSet<String>,
) -> Constraints {
    let mut required = Constraints::new();

    for recipe in recipes {
        for kind in ENVIRONMENT_REQUIREMENT_KINDS {
            for requirement in recipe.requirements_of(kind) {
                let Some(spec) = requirement.as_spec() else {
                    continue;
                };
                if spec.starts_with('$') {
                    continue;
                }
                let Some((package, constraint)) = requirement.split() else {
                    continue;
                };
                if exclude.contains(package) {
                    continue;
                }
                required
                    .entry(package.to_string())
                    .or_default()
                    .extend(normalize_constraints(constraint));
            }
        }
    }

    required
}
