//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;
    use proptest::sample::Index;

    /// Generate a valid package name (lowercase alphanumeric with hyphens)
    pub fn package_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,30}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate an acyclic set of packages and the names they require
    ///
    /// Package `pkgN` may only require packages `pkgM` with `M < N`, plus
    /// the occasional requirement on a package outside the set.
    pub fn acyclic_requirements(
        max_packages: usize,
    ) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
        (1..=max_packages).prop_flat_map(|count| {
            proptest::collection::vec(
                (proptest::collection::vec(any::<Index>(), 0..4), any::<bool>()),
                count,
            )
            .prop_map(|packages| {
                packages
                    .into_iter()
                    .enumerate()
                    .map(|(position, (picks, external))| {
                        let mut requires: Vec<String> = if position == 0 {
                            Vec::new()
                        } else {
                            picks
                                .iter()
                                .map(|pick| format!("pkg{}", pick.index(position)))
                                .collect()
                        };
                        if external {
                            requires.push("python".to_string());
                        }
                        (format!("pkg{position}"), requires)
                    })
                    .collect()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_package_name_generator(name in package_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_acyclic_requirements_only_point_backwards(packages in acyclic_requirements(10)) {
            prop_assert!(!packages.is_empty() && packages.len() <= 10);
            for (position, (name, requires)) in packages.iter().enumerate() {
                prop_assert_eq!(name, &format!("pkg{position}"));
                for required in requires.iter().filter(|r| r.starts_with("pkg")) {
                    let index: usize = required["pkg".len()..].parse().unwrap();
                    prop_assert!(index < position);
                }
            }
        }
    }
}
