//! Built artifact index
//!
//! Reads the `repodata.json` documents of the local channel to tell which
//! packages have already been built. Nothing is cached: every query scans
//! the channel again, so artifacts produced by another process in the
//! meantime are seen.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::defaults::REPODATA_FILE;
use crate::config::ProjectLayout;
use crate::error::ArtifactError;

/// A package present in the local channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// Package name
    pub name: String,
    /// Package version
    pub version: Option<String>,
    /// Build string
    pub build: Option<String>,
    /// Channel subdirectory (`linux-64`, `noarch`, ...)
    pub subdir: String,
    /// Artifact file name
    pub file_name: String,
    /// Absolute path of the artifact file
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RepoData {
    /// Legacy `.tar.bz2` packages
    #[serde(default)]
    packages: BTreeMap<String, PackageRecord>,

    #[serde(default, rename = "packages.conda")]
    conda_packages: BTreeMap<String, PackageRecord>,
}

#[derive(Debug, Deserialize)]
struct PackageRecord {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    build: Option<String>,
}

/// Index over the `*/repodata.json` documents of a channel directory
#[derive(Debug, Clone)]
pub struct ArtifactIndex {
    forge_dir: PathBuf,
}

impl ArtifactIndex {
    /// Create an index over `forge_dir`
    pub fn new(forge_dir: impl Into<PathBuf>) -> Self {
        Self {
            forge_dir: forge_dir.into(),
        }
    }

    /// Create an index over the project's forge channel
    pub fn from_layout(layout: &ProjectLayout) -> Self {
        Self::new(layout.forge_dir())
    }

    /// Every artifact of the channel, one repodata document at a time
    pub fn records(&self) -> impl Iterator<Item = Result<ArtifactRecord, ArtifactError>> + '_ {
        self.repodata_files().flat_map(|file| match file.and_then(|path| read_records(&path)) {
            Ok(records) => records.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
    }

    /// Artifacts whose package name matches `pattern`
    pub fn find<'a>(
        &'a self,
        pattern: &'a Regex,
    ) -> impl Iterator<Item = Result<ArtifactRecord, ArtifactError>> + 'a {
        self.records().filter(move |record| match record {
            Ok(record) => pattern.is_match(&record.name),
            Err(_) => true,
        })
    }

    /// Check whether an artifact named exactly `name` exists
    pub fn contains(&self, name: &str) -> Result<bool, ArtifactError> {
        let pattern = Regex::new(&format!("^{}$", regex::escape(name)))
            .expect("Escaped package name is a valid pattern");
        let found = match self.find(&pattern).next() {
            Some(record) => record.map(|_| true),
            None => Ok(false),
        };
        found
    }

    fn repodata_files(&self) -> impl Iterator<Item = Result<PathBuf, ArtifactError>> + '_ {
        let walker = self.forge_dir.is_dir().then(|| {
            WalkDir::new(&self.forge_dir)
                .min_depth(2)
                .max_depth(2)
                .sort_by_file_name()
        });

        walker
            .into_iter()
            .flatten()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_name() == REPODATA_FILE && entry.file_type().is_file() => {
                    Some(Ok(entry.into_path()))
                }
                Ok(_) => None,
                Err(e) => Some(Err(ArtifactError::ReadError {
                    path: e
                        .path()
                        .map_or_else(|| self.forge_dir.clone(), Path::to_path_buf),
                    error: e.to_string(),
                })),
            })
    }
}

fn read_records(repodata_path: &Path) -> Result<Vec<ArtifactRecord>, ArtifactError> {
    let content = fs::read_to_string(repodata_path).map_err(|e| ArtifactError::ReadError {
        path: repodata_path.to_path_buf(),
        error: e.to_string(),
    })?;
    let repodata: RepoData =
        serde_json::from_str(&content).map_err(|e| ArtifactError::ParseError {
            path: repodata_path.to_path_buf(),
            error: e.to_string(),
        })?;

    let channel_dir = repodata_path.parent().unwrap_or(Path::new(""));
    let subdir = channel_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(
        "Scanned {}: {} packages",
        repodata_path.display(),
        repodata.packages.len() + repodata.conda_packages.len()
    );

    Ok(repodata
        .conda_packages
        .into_iter()
        .chain(repodata.packages)
        .map(|(file_name, record)| ArtifactRecord {
            name: record.name,
            version: record.version,
            build: record.build,
            subdir: subdir.clone(),
            path: channel_dir.join(&file_name),
            file_name,
        })
        .collect())
}
