//! Configuration and constants
//!
//! Every location soma-forge touches is derived from a single project root.
//! The root is resolved once by the CLI and handed to components as a
//! [`ProjectLayout`] value.
//!
//! - [`defaults`] - File and directory names, environment variables
//! - [`urls`] - Source repository URLs

pub mod defaults;
pub mod urls;

use std::path::{Path, PathBuf};

use defaults::{
    BUILD_DIR, BUILD_WORK_DIR, BUILD_WORK_PREFIX, FORGE_DIR, MANIFEST_FILE, RECIPES_DIR,
    SOURCES_DIR, SUCCESS_STAMP,
};

/// Locations of a forge project, all relative to its root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory containing one subdirectory per recipe
    pub fn recipes_dir(&self) -> PathBuf {
        self.root.join(RECIPES_DIR)
    }

    /// Local channel receiving built packages
    pub fn forge_dir(&self) -> PathBuf {
        self.root.join(FORGE_DIR)
    }

    /// `file://` URL of the local channel
    pub fn forge_channel(&self) -> String {
        format!("file://{}", self.forge_dir().display())
    }

    /// rattler-build work directory for `package`
    pub fn package_work_dir(&self, package: &str) -> PathBuf {
        self.forge_dir()
            .join(BUILD_WORK_DIR)
            .join(format!("{BUILD_WORK_PREFIX}{package}"))
    }

    /// Project manifest (`pixi.toml`)
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Source checkout directory
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join(SOURCES_DIR)
    }

    /// In-tree compilation directory
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Stamp marking a successful in-tree compilation
    pub fn success_stamp(&self) -> PathBuf {
        self.build_dir().join(SUCCESS_STAMP)
    }
}
