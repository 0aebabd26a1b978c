//! Infrastructure layer
//!
//! Handles all I/O with the outside world: filesystem, git, and the external
//! tools soma-forge drives.

pub mod filesystem;
pub mod git;
pub mod process;
pub mod rattler;
