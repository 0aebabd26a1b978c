//! Test commands implementation
//!
//! Implements `soma-forge test-commands`, printing as JSON the commands
//! ctest would run for each test label.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::ctest::collect_test_commands;

/// Execute the test-commands command in `build_dir`
pub async fn execute(build_dir: &Path) -> Result<()> {
    let tests = collect_test_commands(build_dir)
        .await
        .with_context(|| format!("Failed to list tests in {}", build_dir.display()))?;
    println!("{}", serde_json::to_string_pretty(&tests)?);
    Ok(())
}
