//! Source repository URLs

/// brainvisa-cmake sources, providing `bv_maker`
pub const BRAINVISA_CMAKE_REPO: &str = "https://github.com/brainvisa/brainvisa-cmake";

/// Checkout directory name of [`BRAINVISA_CMAKE_REPO`] under the sources directory
pub const BRAINVISA_CMAKE_DIR: &str = "brainvisa-cmake";
