//! Git operations
//!
//! Clones source repositories using the gix crate.

use std::path::{Path, PathBuf};

use crate::error::GitError;

/// Clones repositories into a sources directory
#[derive(Debug)]
pub struct GitOperations {
    /// Directory receiving the clones
    work_dir: PathBuf,
}

impl GitOperations {
    /// Create a new git operations handler
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Get the working directory
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Whether `dest_name` has already been cloned
    pub fn is_cloned(&self, dest_name: &str) -> bool {
        self.work_dir.join(dest_name).exists()
    }

    /// Clone `url` into `<work_dir>/<dest_name>` with its default branch
    /// checked out
    ///
    /// An existing destination is left untouched.
    pub fn clone_repo(&self, url: &str, dest_name: &str) -> Result<PathBuf, GitError> {
        let dest_path = self.work_dir.join(dest_name);
        if dest_path.exists() {
            tracing::debug!("{} already cloned", dest_path.display());
            return Ok(dest_path);
        }

        std::fs::create_dir_all(&self.work_dir).map_err(|e| GitError::IoError {
            path: self.work_dir.clone(),
            error: e.to_string(),
        })?;

        tracing::info!("Cloning {url} into {}", dest_path.display());
        if let Err(e) = clone_internal(url, &dest_path) {
            // A partial checkout would count as cloned on the next run
            let _ = std::fs::remove_dir_all(&dest_path);
            return Err(e);
        }

        Ok(dest_path)
    }
}

fn clone_internal(url: &str, dest: &Path) -> Result<(), GitError> {
    let clone_failed = |e: &dyn std::fmt::Display| GitError::CloneFailed {
        url: url.to_string(),
        error: e.to_string(),
    };

    let mut prepare = gix::prepare_clone(url, dest).map_err(|e| clone_failed(&e))?;

    let (mut checkout, _outcome) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| clone_failed(&e))?;

    checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| clone_failed(&e))?;

    Ok(())
}
