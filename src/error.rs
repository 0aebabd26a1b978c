//! Error types for soma-forge
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Recipe loading errors
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Recipe document could not be parsed or lacks its identity fields
    #[error("Malformed recipe '{path}': {error}")]
    Malformed { path: PathBuf, error: String },

    /// Two recipes declare the same package name
    #[error("Package '{name}' is declared by both '{first}' and '{second}'")]
    Duplicate {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// IO error while scanning the recipes directory
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Dependency resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Packages left waiting on each other once nothing else is ready
    #[error("Cyclic dependency between packages: {}", .packages.join(", "))]
    CyclicDependency { packages: Vec<String> },

    /// A package was completed that the frontier never handed out
    #[error("Package '{name}' is not in flight")]
    NotInFlight { name: String },
}

/// Repository index (repodata) errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Failed to read a repodata document
    #[error("Failed to read '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Repodata document is not valid JSON of the expected shape
    #[error("Failed to parse repository index '{path}': {error}")]
    ParseError { path: PathBuf, error: String },
}

/// Package selector errors
#[derive(Error, Debug)]
pub enum SelectorError {
    /// Pattern is not a valid shell-style glob
    #[error("Invalid package pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },
}

/// Project manifest (pixi.toml) errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'")]
    NotFound { path: PathBuf },

    /// Failed to read or write the manifest
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Manifest is not valid TOML
    #[error("Failed to parse manifest '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Manifest is valid TOML but has an unexpected layout
    #[error("Manifest '{path}' has invalid '{field}': {error}")]
    InvalidField {
        path: PathBuf,
        field: String,
        error: String,
    },
}

/// External tool invocation errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool is not installed or not in PATH
    #[error("Command '{program}' not found in PATH")]
    NotFound { program: String },

    /// Tool could not be started
    #[error("Failed to run {command}: {error}")]
    Spawn { command: String, error: String },

    /// Tool ran and exited with a failure status
    #[error("Command failed{}: {command}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    Failed { command: String, code: Option<i32> },
}

impl ToolError {
    /// Exit status to propagate to the caller of soma-forge
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },
}

/// Source checkout errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to clone repository
    #[error("Failed to clone '{url}': {error}")]
    CloneFailed { url: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Top-level soma-forge error type
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Recipe error
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Artifact index error
    #[error("Artifact index error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Selector error
    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// External tool error
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

impl ForgeError {
    /// Exit status to propagate to the caller of soma-forge
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Tool(e) => e.exit_code(),
            _ => 1,
        }
    }
}
