//! Core business logic module
//!
//! Recipe loading, dependency ordering and package selection. Running
//! external tools is left to [`crate::infra`].
//!
//! # Submodules
//!
//! - [`recipe`] - Recipe (recipe.yaml) parsing and loading
//! - [`graph`] - Dependency graph over a recipe set
//! - [`scheduler`] - Topological build order
//! - [`artifact`] - Index of the packages present in the forge channel
//! - [`selector`] - Glob-based package selection
//! - [`forge`] - Selection, skip and build orchestration
//! - [`manifest`] - Project manifest (pixi.toml) handling
//! - [`setup`] - Recipe partitioning for environment setup
//! - [`ctest`] - Test command extraction from ctest

pub mod artifact;
pub mod ctest;
pub mod forge;
pub mod graph;
pub mod manifest;
pub mod recipe;
pub mod scheduler;
pub mod selector;
pub mod setup;
