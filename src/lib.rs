//! soma-forge - Recipe-driven conda package forge
//!
//! This library provides the functionality behind the `soma-forge` command:
//! reading package recipes, ordering them by their dependencies, and building
//! the missing ones into a local conda channel with rattler-build.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Recipes, dependency ordering, selection and setup logic
//! - [`infra`] - Infrastructure layer (filesystem, git, external tools)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
