//! Topological build scheduling
//!
//! Kahn-style scheduling over a ready/waiting frontier. A [`Frontier`] is
//! created for a single pass and consumed by it. [`Schedule`] wraps it as a
//! lazy iterator for sequential consumers; concurrent consumers drive the
//! frontier directly with [`Frontier::start`] and [`Frontier::complete`].
//!
//! When packages remain waiting while nothing is ready or in flight, they
//! depend on each other. This is reported as
//! [`ResolverError::CyclicDependency`] instead of ending the schedule early.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::core::graph::DependencyGraph;
use crate::core::recipe::RecipeSet;
use crate::error::ResolverError;

/// Mutable scheduling state of one pass
#[derive(Debug)]
pub struct Frontier {
    ready: BTreeSet<String>,
    waiting: BTreeSet<String>,
    in_flight: BTreeSet<String>,
    done: BTreeSet<String>,
    /// package -> in-set dependencies not yet done
    depends: BTreeMap<String, BTreeSet<String>>,
    dependent: BTreeMap<String, BTreeSet<String>>,
}

impl Frontier {
    /// Start a pass over `graph`
    pub fn new(graph: DependencyGraph) -> Self {
        Self {
            ready: graph.ready,
            waiting: graph.waiting,
            in_flight: BTreeSet::new(),
            done: BTreeSet::new(),
            depends: graph.depends,
            dependent: graph.dependent,
        }
    }

    /// Check whether a package can be started now
    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Take the next ready package (smallest name first)
    ///
    /// The package stays in flight until [`Frontier::complete`] is called for
    /// it; its dependents are not released before that.
    pub fn start(&mut self) -> Option<String> {
        let name = self.ready.pop_first()?;
        self.in_flight.insert(name.clone());
        Some(name)
    }

    /// Mark an in-flight package as done
    ///
    /// Returns the dependents that became ready, in name order.
    pub fn complete(&mut self, name: &str) -> Result<Vec<String>, ResolverError> {
        if !self.in_flight.remove(name) {
            return Err(ResolverError::NotInFlight {
                name: name.to_string(),
            });
        }
        Ok(self.release(name))
    }

    fn release(&mut self, name: &str) -> Vec<String> {
        self.done.insert(name.to_string());

        let mut released = Vec::new();
        for dependent in self.dependent.get(name).into_iter().flatten() {
            let Some(remaining) = self.depends.get_mut(dependent) else {
                continue;
            };
            remaining.remove(name);
            if remaining.is_empty() && self.waiting.remove(dependent) {
                self.ready.insert(dependent.clone());
                released.push(dependent.clone());
            }
        }
        released
    }

    /// Number of started but not completed packages
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Check whether `name` was completed in this pass
    pub fn is_done(&self, name: &str) -> bool {
        self.done.contains(name)
    }

    /// Check whether nothing can be started or is still running
    pub fn is_exhausted(&self) -> bool {
        self.ready.is_empty() && self.in_flight.is_empty()
    }

    /// Cycle error if the pass is exhausted with packages still waiting
    pub fn stalled(&self) -> Option<ResolverError> {
        if self.is_exhausted() && !self.waiting.is_empty() {
            Some(ResolverError::CyclicDependency {
                packages: self.waiting.iter().cloned().collect(),
            })
        } else {
            None
        }
    }
}

/// A package handed out by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPackage {
    /// Package name
    pub name: String,
    /// Directory of its recipe
    pub recipe_dir: PathBuf,
}

/// Lazy build order over a recipe set
///
/// Yields every package after all of its in-set dependencies. If a cycle
/// blocks the remaining packages, yields one error and then ends. Not
/// restartable: build a new schedule for a new pass.
#[derive(Debug)]
pub struct Schedule {
    frontier: Frontier,
    recipe_dirs: BTreeMap<String, PathBuf>,
    cycle_reported: bool,
}

impl Schedule {
    /// Schedule every recipe of `recipes`
    pub fn new(recipes: &RecipeSet) -> Self {
        Self {
            frontier: DependencyGraph::build(recipes).into_frontier(),
            recipe_dirs: recipes
                .iter()
                .map(|(name, recipe)| (name.clone(), recipe.recipe_dir().to_path_buf()))
                .collect(),
            cycle_reported: false,
        }
    }

    /// Check whether [`Iterator::next`] will yield something
    pub fn has_next(&self) -> bool {
        self.frontier.has_ready() || (!self.cycle_reported && self.frontier.stalled().is_some())
    }

    /// Check whether the schedule is finished
    pub fn is_exhausted(&self) -> bool {
        !self.has_next()
    }
}

impl Iterator for Schedule {
    type Item = Result<ScheduledPackage, ResolverError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(name) = self.frontier.start() {
            self.frontier.in_flight.remove(&name);
            self.frontier.release(&name);
            let recipe_dir = self.recipe_dirs.get(&name).cloned().unwrap_or_default();
            return Some(Ok(ScheduledPackage { name, recipe_dir }));
        }

        if self.cycle_reported {
            return None;
        }
        let stalled = self.frontier.stalled()?;
        self.cycle_reported = true;
        Some(Err(stalled))
    }
}
