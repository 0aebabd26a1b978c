//! Default configuration values

/// Environment variable holding the project root when `--root` is not given
pub const ENV_PROJECT_ROOT: &str = "PIXI_PROJECT_ROOT";

/// Directory holding one subdirectory per recipe
pub const RECIPES_DIR: &str = "recipes";

/// Recipe document name inside each recipe directory
pub const RECIPE_FILE: &str = "recipe.yaml";

/// Local conda channel receiving built packages
pub const FORGE_DIR: &str = "forge";

/// Repository index document name inside each channel subdir
pub const REPODATA_FILE: &str = "repodata.json";

/// Work directory used by rattler-build inside the forge
pub const BUILD_WORK_DIR: &str = "bld";

/// Prefix of the per-package rattler-build work directory
pub const BUILD_WORK_PREFIX: &str = "rattler-build_";

/// Project manifest maintained by pixi
pub const MANIFEST_FILE: &str = "pixi.toml";

/// Source checkout directory
pub const SOURCES_DIR: &str = "src";

/// In-tree compilation directory
pub const BUILD_DIR: &str = "build";

/// Stamp written after a successful in-tree compilation
pub const SUCCESS_STAMP: &str = "success";

/// Marker identifying recipes packaged from the in-tree bv_maker build
pub const IN_TREE_SCRIPT_MARKER: &str = "BRAINVISA_INSTALL_PREFIX";

/// Environment variable making BrainVISA tests print remote commands
pub const ENV_TEST_REMOTE_COMMAND: &str = "BRAINVISA_TEST_REMOTE_COMMAND";

/// Default number of concurrent package builds
pub const DEFAULT_BUILD_JOBS: usize = 1;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
