//! Resolved module graphs
//!
//! A [`Configuration`] is the immutable result of resolution: the modules
//! selected for a set of roots plus the `reads` relation between them. It
//! may sit on top of parent configurations, which are walked in order and
//! never modified.

use crate::descriptor::ModuleDescriptor;
use crate::resolver::ResolutionError;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Immutable resolved module graph
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    /// Parent configurations, searched in order
    parents: Vec<Arc<Configuration>>,
    /// Modules resolved by this configuration (excludes parents)
    modules: BTreeMap<String, Arc<ModuleDescriptor>>,
    /// Reads edges for local modules: module -> modules it reads
    reads: FxHashMap<String, BTreeSet<String>>,
    /// Package -> owning local module
    packages: FxHashMap<String, String>,
}

impl Configuration {
    /// Create the empty configuration, usually the root of a parent chain
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        parents: Vec<Arc<Configuration>>,
        modules: BTreeMap<String, Arc<ModuleDescriptor>>,
        reads: FxHashMap<String, BTreeSet<String>>,
    ) -> Self {
        let mut packages = FxHashMap::default();
        for descriptor in modules.values() {
            for package in descriptor.packages() {
                packages.insert(package.to_string(), descriptor.name().to_string());
            }
        }

        Self {
            parents,
            modules,
            reads,
            packages,
        }
    }

    /// Parent configurations in lookup order
    pub fn parents(&self) -> &[Arc<Configuration>] {
        &self.parents
    }

    /// Descriptors of the modules resolved in this configuration, in name order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<ModuleDescriptor>> {
        self.modules.values()
    }

    /// Names of the modules resolved in this configuration, in name order
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of modules resolved in this configuration
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if this configuration resolved no modules of its own
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Check if the module was resolved by this configuration (not a parent)
    pub fn contains_local(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Check if the module is visible through this configuration or a parent
    pub fn contains(&self, name: &str) -> bool {
        self.find_module(name).is_some()
    }

    /// Find a module here or in the parent chain
    pub fn find_module(&self, name: &str) -> Option<&Arc<ModuleDescriptor>> {
        self.owner_of(name).and_then(|cf| cf.modules.get(name))
    }

    /// Find the configuration in the chain that resolved the module
    fn owner_of(&self, name: &str) -> Option<&Configuration> {
        if self.modules.contains_key(name) {
            return Some(self);
        }
        self.parents.iter().find_map(|parent| parent.owner_of(name))
    }

    /// Check if `from` reads `to`
    ///
    /// The edge is looked up in whichever configuration resolved `from`, so a
    /// module in a parent never reads modules added by a child.
    pub fn reads(&self, from: &str, to: &str) -> bool {
        self.reads_of(from).is_some_and(|reads| reads.contains(to))
    }

    /// All modules read by `name`, or `None` if the module is not in the chain
    pub fn reads_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        let owner = self.owner_of(name)?;
        Some(owner.reads.get(name).unwrap_or(empty_reads()))
    }

    /// Find the module that owns a package, searching parents after local modules
    pub fn package_owner(&self, package: &str) -> Option<&Arc<ModuleDescriptor>> {
        if let Some(owner) = self.packages.get(package) {
            return self.modules.get(owner);
        }
        self.parents
            .iter()
            .find_map(|parent| parent.package_owner(package))
    }

    /// Number of reads edges of local modules
    pub fn edge_count(&self) -> usize {
        self.reads.values().map(BTreeSet::len).sum()
    }

    /// Derive a configuration with additional reads edges
    ///
    /// Used by binding passes that run after resolution. Every source must be a
    /// module of this configuration and every target must be visible through
    /// the chain. Self-edges are dropped and existing edges are kept.
    pub fn with_reads_edges<I, S, T>(&self, edges: I) -> Result<Configuration, ResolutionError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut derived = self.clone();
        for (from, to) in edges {
            let (from, to) = (from.as_ref(), to.as_ref());
            if !self.contains_local(from) || !self.contains(to) {
                return Err(ResolutionError::UnknownReadsEdge {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            if from == to {
                continue;
            }
            derived
                .reads
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string());
        }
        Ok(derived)
    }
}

fn empty_reads() -> &'static BTreeSet<String> {
    static EMPTY: BTreeSet<String> = BTreeSet::new();
    &EMPTY
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.modules.keys() {
            let reads: Vec<&str> = self
                .reads
                .get(name)
                .map(|r| r.iter().map(String::as_str).collect())
                .unwrap_or_default();
            if reads.is_empty() {
                writeln!(f, "{}", name)?;
            } else {
                writeln!(f, "{} -> {}", name, reads.join(", "))?;
            }
        }
        Ok(())
    }
}
