//! Package selection from shell-style patterns
//!
//! `forge axon 'soma-*'` selects packages by name or glob. No pattern at all
//! selects every package.

use glob::Pattern;

use crate::error::SelectorError;

/// Matcher built from a list of glob patterns
#[derive(Debug, Clone, Default)]
pub struct PackageSelector {
    /// Empty means every package
    patterns: Vec<Pattern>,
}

impl PackageSelector {
    /// Compile `patterns`; an empty list selects everything
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SelectorError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|e| SelectorError::InvalidPattern {
                    pattern: pattern.to_string(),
                    error: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Selector matching every package
    pub fn all() -> Self {
        Self::default()
    }

    /// Check whether `package` is selected
    pub fn matches(&self, package: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(package))
    }
}
