//! Cross-module access checks
//!
//! Decides whether code in one module may reference a type in a package of
//! another module. The decision combines readability (from the
//! [`Configuration`]) with the target's export declarations:
//!
//! 1. A module may always access itself.
//! 2. The requester must read the target. Unnamed modules read every
//!    resolved module. Otherwise the check fails with
//!    [`Access::DeniedNotReadable`] without looking at exports.
//! 3. The package must be exported unqualified, or exported to the
//!    requester by name. Unnamed modules never match a qualified export.
//!
//! Checks are pure functions of their inputs, so [`AccessChecker`] memoizes
//! them for the lifetime of its configuration.

use crate::configuration::Configuration;
use crate::descriptor::Export;
use crate::unnamed::ModuleRef;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Permitted,
    /// The requester does not read the target module
    DeniedNotReadable,
    /// The target does not export the package to the requester
    DeniedNotExported,
}

impl Access {
    pub fn is_permitted(self) -> bool {
        matches!(self, Access::Permitted)
    }

    /// Convert a denial into a linkage error for the call site
    pub fn into_result(
        self,
        requester: &ModuleRef,
        target: &ModuleRef,
        package: &str,
    ) -> Result<(), IllegalAccess> {
        match self {
            Access::Permitted => Ok(()),
            Access::DeniedNotReadable => Err(IllegalAccess::NotReadable {
                requester: requester.to_string(),
                target: target.to_string(),
            }),
            Access::DeniedNotExported => Err(IllegalAccess::NotExported {
                requester: requester.to_string(),
                target: target.to_string(),
                package: package.to_string(),
            }),
        }
    }
}

/// Linkage error raised for a denied access
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IllegalAccess {
    #[error("{requester} cannot read {target}")]
    NotReadable { requester: String, target: String },

    #[error("{target} does not export {package} to {requester}")]
    NotExported {
        requester: String,
        target: String,
        package: String,
    },
}

/// Decide an access check against a configuration
pub fn check(
    configuration: &Configuration,
    requester: &ModuleRef,
    target: &ModuleRef,
    package: &str,
) -> Access {
    if requester == target {
        return Access::Permitted;
    }

    let target_name = match target {
        ModuleRef::Named(name) => name,
        // Unnamed modules are read only by other unnamed modules and export nothing
        ModuleRef::Unnamed(_) => {
            return match requester {
                ModuleRef::Unnamed(_) => Access::DeniedNotExported,
                ModuleRef::Named(_) => Access::DeniedNotReadable,
            };
        }
    };

    let Some(descriptor) = configuration.find_module(target_name) else {
        return Access::DeniedNotReadable;
    };

    let readable = match requester {
        ModuleRef::Unnamed(_) => true,
        ModuleRef::Named(name) => configuration.reads(name, target_name),
    };
    if !readable {
        return Access::DeniedNotReadable;
    }

    match (descriptor.export_of(package), requester) {
        (None, _) => Access::DeniedNotExported,
        (Some(Export::Unqualified), _) => Access::Permitted,
        (Some(Export::Qualified(targets)), ModuleRef::Named(name)) if targets.contains(name) => {
            Access::Permitted
        }
        (Some(Export::Qualified(_)), _) => Access::DeniedNotExported,
    }
}

/// Package of a dotted type name (`p1.c1` -> `p1`, `c5` -> ``)
pub fn package_of(type_name: &str) -> &str {
    type_name
        .rsplit_once('.')
        .map(|(package, _)| package)
        .unwrap_or("")
}

type CheckKey = (ModuleRef, ModuleRef, String);

/// Memoizing access checker over one configuration
///
/// Safe to share between threads; the configuration is immutable, so cached
/// outcomes never go stale. Only packages owned by the target module are
/// memoized, so the cache is bounded by the requesters times the packages of
/// the configuration chain.
#[derive(Debug)]
pub struct AccessChecker {
    configuration: Arc<Configuration>,
    cache: DashMap<CheckKey, Access>,
}

impl AccessChecker {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            configuration,
            cache: DashMap::new(),
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Check access from `requester` to `package` in `target`
    pub fn check(&self, requester: &ModuleRef, target: &ModuleRef, package: &str) -> Access {
        let key = (requester.clone(), target.clone(), package.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }

        let access = check(&self.configuration, requester, target, package);
        trace!(%requester, %target, package, ?access, "access check");
        if self.owns(target, package) {
            self.cache.insert(key, access);
        }
        access
    }

    fn owns(&self, target: &ModuleRef, package: &str) -> bool {
        target
            .name()
            .and_then(|name| self.configuration.find_module(name))
            .is_some_and(|descriptor| descriptor.owns_package(package))
    }

    /// Check access to a type given by its dotted name
    pub fn check_type(&self, requester: &ModuleRef, target: &ModuleRef, type_name: &str) -> Access {
        self.check(requester, target, package_of(type_name))
    }

    /// Number of memoized outcomes
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
