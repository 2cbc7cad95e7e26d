//! Module resolution
//!
//! Computes the closure of `requires` edges from a set of root modules,
//! validates it and produces an immutable [`Configuration`].
//!
//! Resolution is all-or-nothing: on failure nothing is published and the
//! first error found is returned. Modules are validated in name order so a
//! given input always reports the same error.

use crate::configuration::Configuration;
use crate::descriptor::ModuleDescriptor;
use crate::finder::{FinderError, ModuleFinder};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during resolution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A root or required module has no descriptor anywhere
    #[error("Module {name} not found{}", required_by_suffix(.required_by))]
    ModuleNotFound {
        name: String,
        required_by: Option<String>,
    },

    /// A module would shadow a parent module, or a finder holds it twice
    #[error("Duplicate module: {0}")]
    DuplicateModule(String),

    /// Two co-resolved modules own the same package
    #[error("Package {package} is owned by both {first} and {second}")]
    NamespaceConflict {
        package: String,
        first: String,
        second: String,
    },

    /// The `requires` edges of the new modules form a cycle
    #[error("Cycle detected: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    /// A reads edge added after resolution names an unknown module
    #[error("Cannot add reads edge {from} -> {to}: unknown module")]
    UnknownReadsEdge { from: String, to: String },
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    match required_by {
        Some(module) => format!(", required by {}", module),
        None => String::new(),
    }
}

impl From<FinderError> for ResolutionError {
    fn from(error: FinderError) -> Self {
        match error {
            FinderError::DuplicateModule(name) => ResolutionError::DuplicateModule(name),
        }
    }
}

/// Module resolver
///
/// Names are looked up in the main finder first (a hit there must not also
/// exist in a parent), then in the parent configurations, then in the
/// optional after-finder, whose modules never shadow parent modules.
pub struct Resolver<'a> {
    /// Finder consulted before the parents
    finder: &'a dyn ModuleFinder,
    /// Finder consulted after the parents
    after_finder: Option<&'a dyn ModuleFinder>,
    /// Parent configurations, searched in order
    parents: Vec<Arc<Configuration>>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a finder with no parents
    pub fn new(finder: &'a dyn ModuleFinder) -> Self {
        Self {
            finder,
            after_finder: None,
            parents: Vec::new(),
        }
    }

    /// Add a parent configuration
    pub fn with_parent(mut self, parent: Arc<Configuration>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Add parent configurations, in lookup order
    pub fn with_parents<I>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = Arc<Configuration>>,
    {
        self.parents.extend(parents);
        self
    }

    /// Set the finder consulted after the parent configurations
    pub fn with_after_finder(mut self, finder: &'a dyn ModuleFinder) -> Self {
        self.after_finder = Some(finder);
        self
    }

    /// Resolve the given root modules
    pub fn resolve<I, S>(&self, roots: I) -> Result<Configuration, ResolutionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected = self.select(roots)?;
        self.check_packages(&selected)?;
        let order = dependency_order(&selected)?;
        let reads = self.compute_reads(&selected, &order);

        let cf = Configuration::from_parts(self.parents.clone(), selected, reads);
        info!(
            modules = cf.len(),
            edges = cf.edge_count(),
            parents = self.parents.len(),
            "resolved configuration"
        );
        Ok(cf)
    }

    fn find_in_parents(&self, name: &str) -> Option<&Arc<ModuleDescriptor>> {
        self.parents.iter().find_map(|parent| parent.find_module(name))
    }

    fn find_matching(finder: &dyn ModuleFinder, name: &str) -> Option<Arc<ModuleDescriptor>> {
        // A descriptor filed under another name does not answer the lookup
        finder.find(name).filter(|d| d.name() == name)
    }

    /// Walk the `requires` closure of the roots and select new modules
    ///
    /// The whole closure is walked before anything is reported. Missing
    /// modules are reported before shadowed ones, each in name order, so the
    /// outcome depends only on the set of roots.
    fn select<I, S>(&self, roots: I) -> Result<BTreeMap<String, Arc<ModuleDescriptor>>, ResolutionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roots: BTreeSet<String> = roots
            .into_iter()
            .map(|root| root.as_ref().to_string())
            .collect();

        let mut selected: BTreeMap<String, Arc<ModuleDescriptor>> = BTreeMap::new();
        let mut missing: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut shadowed: BTreeSet<String> = BTreeSet::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut worklist: VecDeque<(String, Option<String>)> =
            roots.into_iter().map(|root| (root, None)).collect();

        while let Some((name, required_by)) = worklist.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }

            let in_parent = self.find_in_parents(&name).is_some();
            let descriptor = match Self::find_matching(self.finder, &name) {
                Some(descriptor) => {
                    if in_parent {
                        shadowed.insert(name.clone());
                    }
                    descriptor
                }
                None if in_parent => {
                    debug!(module = %name, "module found in parent configuration");
                    continue;
                }
                None => match self
                    .after_finder
                    .and_then(|finder| Self::find_matching(finder, &name))
                {
                    Some(descriptor) => descriptor,
                    None => {
                        missing.insert(name, required_by);
                        continue;
                    }
                },
            };

            debug!(module = %name, requires = descriptor.requires().len(), "selected module");
            for dependency in descriptor.requires() {
                if !seen.contains(dependency) {
                    worklist.push_back((dependency.clone(), Some(name.clone())));
                }
            }
            selected.insert(name, descriptor);
        }

        if let Some((name, required_by)) = missing.into_iter().next() {
            return Err(ResolutionError::ModuleNotFound { name, required_by });
        }
        if let Some(name) = shadowed.into_iter().next() {
            return Err(ResolutionError::DuplicateModule(name));
        }
        Ok(selected)
    }

    /// Check that no package is owned by two new modules
    fn check_packages(
        &self,
        selected: &BTreeMap<String, Arc<ModuleDescriptor>>,
    ) -> Result<(), ResolutionError> {
        let mut owners: FxHashMap<&str, &str> = FxHashMap::default();
        for descriptor in selected.values() {
            for package in descriptor.packages() {
                if let Some(first) = owners.insert(package, descriptor.name()) {
                    return Err(ResolutionError::NamespaceConflict {
                        package: package.to_string(),
                        first: first.to_string(),
                        second: descriptor.name().to_string(),
                    });
                }

                // Parents are trusted, so overlap with them is only reported
                if let Some(owner) = self
                    .parents
                    .iter()
                    .find_map(|parent| parent.package_owner(package))
                {
                    warn!(
                        package,
                        module = descriptor.name(),
                        parent_module = owner.name(),
                        "package is also owned by a module in a parent configuration"
                    );
                }
            }
        }
        Ok(())
    }

    /// Compute the reads closure of each new module
    ///
    /// `order` lists dependencies before dependents, so every new dependency's
    /// closure is complete by the time a dependent needs it.
    fn compute_reads(
        &self,
        selected: &BTreeMap<String, Arc<ModuleDescriptor>>,
        order: &[String],
    ) -> FxHashMap<String, BTreeSet<String>> {
        let mut reads: FxHashMap<String, BTreeSet<String>> = FxHashMap::default();

        for name in order {
            let descriptor = &selected[name];
            let mut closure = BTreeSet::new();
            for dependency in descriptor.requires() {
                closure.insert(dependency.clone());
                if let Some(inherited) = reads.get(dependency) {
                    closure.extend(inherited.iter().cloned());
                } else if let Some(inherited) = self
                    .parents
                    .iter()
                    .find_map(|parent| parent.reads_of(dependency))
                {
                    closure.extend(inherited.iter().cloned());
                }
            }
            closure.remove(name);
            reads.insert(name.clone(), closure);
        }

        reads
    }
}

/// Order new modules so that dependencies come before dependents
///
/// Fails with the offending path if their `requires` edges form a cycle.
/// Edges into parent modules are ignored: parents cannot require children.
fn dependency_order(
    selected: &BTreeMap<String, Arc<ModuleDescriptor>>,
) -> Result<Vec<String>, ResolutionError> {
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut rec_stack: FxHashSet<&str> = FxHashSet::default();
    let mut path: Vec<&str> = Vec::new();
    let mut order: Vec<String> = Vec::with_capacity(selected.len());

    for start in selected.keys() {
        if !visited.contains(start.as_str()) {
            visit(
                start,
                selected,
                &mut visited,
                &mut rec_stack,
                &mut path,
                &mut order,
            )?;
        }
    }

    Ok(order)
}

fn visit<'m>(
    node: &'m str,
    selected: &'m BTreeMap<String, Arc<ModuleDescriptor>>,
    visited: &mut FxHashSet<&'m str>,
    rec_stack: &mut FxHashSet<&'m str>,
    path: &mut Vec<&'m str>,
    order: &mut Vec<String>,
) -> Result<(), ResolutionError> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(descriptor) = selected.get(node) {
        for dependency in descriptor.requires() {
            let dependency = dependency.as_str();
            if !selected.contains_key(dependency) {
                continue;
            }
            if rec_stack.contains(dependency) {
                let start = path.iter().position(|m| *m == dependency).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|m| m.to_string()).collect();
                cycle.push(dependency.to_string());
                return Err(ResolutionError::CycleDetected(cycle));
            }
            if !visited.contains(dependency) {
                visit(dependency, selected, visited, rec_stack, path, order)?;
            }
        }
    }

    path.pop();
    rec_stack.remove(node);
    order.push(node.to_string());
    Ok(())
}

/// Resolve `roots` against `finder` on top of `parents`
pub fn resolve<S: AsRef<str>>(
    finder: &dyn ModuleFinder,
    parents: &[Arc<Configuration>],
    roots: &[S],
) -> Result<Configuration, ResolutionError> {
    Resolver::new(finder)
        .with_parents(parents.iter().cloned())
        .resolve(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::{empty, ModuleLibrary};

    fn library(descriptors: Vec<ModuleDescriptor>) -> ModuleLibrary {
        ModuleLibrary::of(descriptors).unwrap()
    }

    fn module(name: &str, requires: &[&str]) -> ModuleDescriptor {
        requires
            .iter()
            .fold(ModuleDescriptor::builder(name), |b, r| b.requires(*r))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_single_root() {
        let finder = library(vec![module("m1", &[])]);
        let cf = Resolver::new(&finder).resolve(["m1"]).unwrap();

        assert_eq!(cf.module_names().collect::<Vec<_>>(), vec!["m1"]);
        assert_eq!(cf.edge_count(), 0);
    }

    #[test]
    fn test_unreachable_modules_not_selected() {
        let finder = library(vec![module("m1", &["m2"]), module("m2", &[]), module("m3", &[])]);
        let cf = Resolver::new(&finder).resolve(["m1"]).unwrap();

        assert!(cf.contains_local("m2"));
        assert!(!cf.contains_local("m3"));
    }

    #[test]
    fn test_reads_is_transitive() {
        let finder = library(vec![
            module("a", &["b"]),
            module("b", &["c"]),
            module("c", &["d"]),
            module("d", &[]),
        ]);
        let cf = Resolver::new(&finder).resolve(["a"]).unwrap();

        assert!(cf.reads("a", "b"));
        assert!(cf.reads("a", "c"));
        assert!(cf.reads("a", "d"));
        assert!(cf.reads("b", "d"));
        assert!(!cf.reads("d", "a"));
        assert!(!cf.reads("a", "a"));
        assert_eq!(cf.edge_count(), 6);
    }

    #[test]
    fn test_missing_root() {
        let finder = library(vec![]);
        let result = Resolver::new(&finder).resolve(["m1"]);
        assert_eq!(
            result.unwrap_err(),
            ResolutionError::ModuleNotFound {
                name: "m1".to_string(),
                required_by: None,
            }
        );
    }

    #[test]
    fn test_missing_dependency_names_requirer() {
        let finder = library(vec![module("m1", &["m2"])]);
        let error = Resolver::new(&finder).resolve(["m1"]).unwrap_err();
        assert_eq!(error.to_string(), "Module m2 not found, required by m1");
    }

    #[test]
    fn test_cycle_detected() {
        let finder = library(vec![module("a", &["b"]), module("b", &["c"]), module("c", &["a"])]);
        let result = Resolver::new(&finder).resolve(["a"]);
        match result {
            Err(ResolutionError::CycleDetected(cycle)) => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_after_finder_used_last() {
        let finder = library(vec![module("m1", &["m2"])]);
        let after = library(vec![module("m2", &[])]);
        let cf = Resolver::new(&finder)
            .with_after_finder(&after)
            .resolve(["m1"])
            .unwrap();
        assert!(cf.contains_local("m2"));
    }

    #[test]
    fn test_after_finder_does_not_shadow_parent() {
        let parent = Arc::new(
            Resolver::new(&library(vec![module("m2", &[])]))
                .resolve(["m2"])
                .unwrap(),
        );
        let finder = library(vec![module("m1", &["m2"])]);
        let after = library(vec![module("m2", &[])]);

        let cf = Resolver::new(&finder)
            .with_parent(parent)
            .with_after_finder(&after)
            .resolve(["m1"])
            .unwrap();

        assert!(!cf.contains_local("m2"));
        assert!(cf.reads("m1", "m2"));
    }

    #[test]
    fn test_free_function() {
        let finder = library(vec![module("m1", &[])]);
        let cf = resolve(&finder, &[], &["m1"]).unwrap();
        assert!(cf.contains_local("m1"));

        let cf = resolve(&empty(), &[Arc::new(cf)], &["m1"]).unwrap();
        assert!(cf.is_empty());
        assert!(cf.contains("m1"));
    }

    #[test]
    fn test_failure_kind_independent_of_root_order() {
        let parent = Arc::new(
            Resolver::new(&library(vec![module("java.base", &[])]))
                .resolve(["java.base"])
                .unwrap(),
        );
        let finder = library(vec![module("java.base", &[])]);
        let resolver = Resolver::new(&finder).with_parent(parent);

        let expected = ResolutionError::ModuleNotFound {
            name: "zz".to_string(),
            required_by: None,
        };
        assert_eq!(resolver.resolve(["java.base", "zz"]).unwrap_err(), expected);
        assert_eq!(resolver.resolve(["zz", "java.base"]).unwrap_err(), expected);
    }

    #[test]
    fn test_finder_error_converts() {
        let error: ResolutionError = FinderError::DuplicateModule("m1".to_string()).into();
        assert_eq!(error, ResolutionError::DuplicateModule("m1".to_string()));
    }
}
