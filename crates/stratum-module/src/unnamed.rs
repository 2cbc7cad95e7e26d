//! Unnamed modules and module references
//!
//! Every loading unit has one unnamed module holding the code that was not
//! declared by any descriptor. Unnamed modules read every module, but export
//! nothing and are never the target of a qualified export.

use crate::layer::LoaderId;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNNAMED_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an unnamed module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnnamedModuleId(u64);

impl UnnamedModuleId {
    fn next() -> Self {
        Self(NEXT_UNNAMED_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The unnamed module of one loading unit
#[derive(Debug)]
pub struct UnnamedModule {
    id: UnnamedModuleId,
    loader: Option<LoaderId>,
}

impl UnnamedModule {
    /// Create the unnamed module for a loading unit (`None` for the boot loader)
    pub fn new(loader: Option<LoaderId>) -> Self {
        Self {
            id: UnnamedModuleId::next(),
            loader,
        }
    }

    pub fn id(&self) -> UnnamedModuleId {
        self.id
    }

    /// Loading unit this module belongs to
    pub fn loader(&self) -> Option<&LoaderId> {
        self.loader.as_ref()
    }

    /// Reference to this module for access checks
    pub fn module_ref(&self) -> ModuleRef {
        ModuleRef::Unnamed(self.id)
    }
}

/// A requester or target in an access check
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleRef {
    /// A module declared by a descriptor
    Named(String),
    /// The unnamed module of some loading unit
    Unnamed(UnnamedModuleId),
}

impl ModuleRef {
    /// Reference a named module
    pub fn named(name: impl Into<String>) -> Self {
        ModuleRef::Named(name.into())
    }

    pub fn is_unnamed(&self) -> bool {
        matches!(self, ModuleRef::Unnamed(_))
    }

    /// Module name, `None` for unnamed modules
    pub fn name(&self) -> Option<&str> {
        match self {
            ModuleRef::Named(name) => Some(name),
            ModuleRef::Unnamed(_) => None,
        }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRef::Named(name) => write!(f, "module {}", name),
            ModuleRef::Unnamed(id) => write!(f, "unnamed module #{}", id.0),
        }
    }
}
