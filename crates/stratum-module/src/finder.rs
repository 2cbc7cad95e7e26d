//! Module finders
//!
//! A finder supplies descriptors by name. Locating module artifacts on disk is
//! the job of the caller; this crate only relies on the finder contract:
//! lookups are deterministic and one finder never holds two descriptors with
//! the same name.

use crate::descriptor::ModuleDescriptor;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while assembling a finder
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FinderError {
    /// Two descriptors with the same name were given to one finder
    #[error("Duplicate module in finder: {0}")]
    DuplicateModule(String),
}

/// Source of module descriptors
pub trait ModuleFinder: Send + Sync {
    /// Find the descriptor of the named module
    fn find(&self, name: &str) -> Option<Arc<ModuleDescriptor>>;

    /// All descriptors this finder can supply, in name order
    fn find_all(&self) -> Vec<Arc<ModuleDescriptor>>;
}

impl<F: ModuleFinder + ?Sized> ModuleFinder for Arc<F> {
    fn find(&self, name: &str) -> Option<Arc<ModuleDescriptor>> {
        (**self).find(name)
    }

    fn find_all(&self) -> Vec<Arc<ModuleDescriptor>> {
        (**self).find_all()
    }
}

impl<F: ModuleFinder + ?Sized> ModuleFinder for &F {
    fn find(&self, name: &str) -> Option<Arc<ModuleDescriptor>> {
        (**self).find(name)
    }

    fn find_all(&self) -> Vec<Arc<ModuleDescriptor>> {
        (**self).find_all()
    }
}

/// In-memory finder over a fixed set of descriptors
#[derive(Debug, Clone, Default)]
pub struct ModuleLibrary {
    modules: BTreeMap<String, Arc<ModuleDescriptor>>,
}

impl ModuleLibrary {
    /// Create a library from descriptors, rejecting duplicate names
    pub fn of<I>(descriptors: I) -> Result<Self, FinderError>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let mut modules = BTreeMap::new();
        for descriptor in descriptors {
            let name = descriptor.name().to_string();
            if modules.contains_key(&name) {
                return Err(FinderError::DuplicateModule(name));
            }
            modules.insert(name, Arc::new(descriptor));
        }
        Ok(Self { modules })
    }

    /// Names of all modules in the library
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of modules in the library
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the library is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleFinder for ModuleLibrary {
    fn find(&self, name: &str) -> Option<Arc<ModuleDescriptor>> {
        self.modules.get(name).cloned()
    }

    fn find_all(&self) -> Vec<Arc<ModuleDescriptor>> {
        self.modules.values().cloned().collect()
    }
}

/// Finder that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFinder;

impl ModuleFinder for EmptyFinder {
    fn find(&self, _name: &str) -> Option<Arc<ModuleDescriptor>> {
        None
    }

    fn find_all(&self) -> Vec<Arc<ModuleDescriptor>> {
        Vec::new()
    }
}

/// Create a finder that finds nothing
pub fn empty() -> EmptyFinder {
    EmptyFinder
}

/// Sequence of finders where the first finder to know a name wins
///
/// An earlier finder hides any same-named module of a later one, so
/// [`ModuleFinder::find_all`] keeps only the first descriptor per name.
/// [`ComposedFinder::find_all_checked`] reports such overlap as an error.
#[derive(Clone, Default)]
pub struct ComposedFinder {
    finders: Vec<Arc<dyn ModuleFinder>>,
}

impl ComposedFinder {
    /// Create a composed finder from an ordered list of finders
    pub fn new(finders: Vec<Arc<dyn ModuleFinder>>) -> Self {
        Self { finders }
    }

    /// Append a finder consulted after the existing ones
    pub fn then(mut self, finder: Arc<dyn ModuleFinder>) -> Self {
        self.finders.push(finder);
        self
    }

    /// All descriptors, failing if two finders supply the same name
    pub fn find_all_checked(&self) -> Result<Vec<Arc<ModuleDescriptor>>, FinderError> {
        let mut all: BTreeMap<String, Arc<ModuleDescriptor>> = BTreeMap::new();
        for finder in &self.finders {
            for descriptor in finder.find_all() {
                let name = descriptor.name().to_string();
                if all.contains_key(&name) {
                    return Err(FinderError::DuplicateModule(name));
                }
                all.insert(name, descriptor);
            }
        }
        Ok(all.into_values().collect())
    }
}

impl ModuleFinder for ComposedFinder {
    fn find(&self, name: &str) -> Option<Arc<ModuleDescriptor>> {
        self.finders.iter().find_map(|finder| finder.find(name))
    }

    fn find_all(&self) -> Vec<Arc<ModuleDescriptor>> {
        let mut all: BTreeMap<String, Arc<ModuleDescriptor>> = BTreeMap::new();
        for finder in &self.finders {
            for descriptor in finder.find_all() {
                all.entry(descriptor.name().to_string()).or_insert(descriptor);
            }
        }
        all.into_values().collect()
    }
}

/// Compose two finders, consulting `first` before `second`
pub fn compose(first: Arc<dyn ModuleFinder>, second: Arc<dyn ModuleFinder>) -> ComposedFinder {
    ComposedFinder::new(vec![first, second])
}
