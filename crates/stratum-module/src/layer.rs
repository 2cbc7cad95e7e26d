//! Layers
//!
//! A [`Layer`] binds the modules of a [`Configuration`] to loading units.
//! Layers stack: lookups that miss locally continue in the parent layer.
//! Bindings are computed once in [`Layer::create`] and frozen afterwards.

use crate::access::AccessChecker;
use crate::configuration::Configuration;
use crate::descriptor::ModuleDescriptor;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while creating or publishing layers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// The parent layer's configuration is not a parent of the configuration
    #[error("Parent layer configuration is not a parent of the layer configuration")]
    ParentMismatch,

    /// The process-wide boot layer was set twice
    #[error("Boot layer is already initialized")]
    BootAlreadyInitialized,
}

/// Opaque identity of a loading unit
///
/// Loading units are owned by the caller. The layer only stores, compares
/// and displays them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderId(Arc<str>);

impl LoaderId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configuration bound to loading units
#[derive(Debug)]
pub struct Layer {
    configuration: Arc<Configuration>,
    /// Module name -> loading unit, for local modules that were bound
    bindings: FxHashMap<String, LoaderId>,
    parent: Option<Arc<Layer>>,
}

impl Layer {
    /// Create the empty layer, with an empty configuration and no parent
    pub fn empty() -> Self {
        Self {
            configuration: Arc::new(Configuration::empty()),
            bindings: FxHashMap::default(),
            parent: None,
        }
    }

    /// Create a layer for `configuration` on top of `parent`
    ///
    /// `binding` is called exactly once per module of the configuration (not
    /// of its parents), in name order. Returning `None` leaves the module
    /// without a loading unit in this layer, as for platform modules.
    ///
    /// When a parent layer is given, its configuration must be one of the
    /// configuration's parents, unless it resolved no modules at all.
    pub fn create<F>(
        configuration: Arc<Configuration>,
        parent: Option<Arc<Layer>>,
        mut binding: F,
    ) -> Result<Self, LayerError>
    where
        F: FnMut(&str) -> Option<LoaderId>,
    {
        if let Some(parent) = &parent {
            let parent_cf = &parent.configuration;
            let linked = configuration
                .parents()
                .iter()
                .any(|cf| Arc::ptr_eq(cf, parent_cf));
            if !linked && !parent_cf.is_empty() {
                return Err(LayerError::ParentMismatch);
            }
        }

        let mut bindings = FxHashMap::default();
        for name in configuration.module_names() {
            if let Some(loader) = binding(name) {
                bindings.insert(name.to_string(), loader);
            }
        }

        debug!(
            modules = configuration.len(),
            bound = bindings.len(),
            has_parent = parent.is_some(),
            "created layer"
        );

        Ok(Self {
            configuration,
            bindings,
            parent,
        })
    }

    /// Configuration bound by this layer
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Parent layer, if any
    pub fn parent(&self) -> Option<&Arc<Layer>> {
        self.parent.as_ref()
    }

    /// Names of the modules local to this layer (excludes parents)
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.configuration.module_names()
    }

    /// Find the loading unit of a module, delegating to the parent layers
    ///
    /// `None` is a normal answer: the module may be unbound or owned by a
    /// runtime domain outside any modeled layer.
    pub fn find_loader(&self, name: &str) -> Option<&LoaderId> {
        match self.bindings.get(name) {
            Some(loader) => Some(loader),
            None => self.parent.as_ref().and_then(|p| p.find_loader(name)),
        }
    }

    /// Find a module in this layer or one of its parents
    pub fn find_module(&self, name: &str) -> Option<&Arc<ModuleDescriptor>> {
        if self.configuration.contains_local(name) {
            return self.configuration.find_module(name);
        }
        self.parent.as_ref().and_then(|p| p.find_module(name))
    }

    /// Access checker over this layer's configuration
    pub fn access_checker(&self) -> AccessChecker {
        AccessChecker::new(self.configuration.clone())
    }
}
