//! Module descriptors
//!
//! A descriptor is the immutable declaration of one module: its name, the
//! modules it requires, and the packages it owns. Owned packages are either
//! exported (to everyone or to a named list of modules) or concealed.
//!
//! Descriptors are only produced through [`DescriptorBuilder`], which rejects
//! malformed declarations at build time rather than at resolve time.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while building a descriptor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Module name is empty
    #[error("Module name cannot be empty")]
    EmptyName,

    /// Module name is not a dotted identifier
    #[error("Invalid module name: {0}")]
    InvalidModuleName(String),

    /// Package name is not a dotted identifier
    #[error("Invalid package name in module {module}: {package}")]
    InvalidPackageName { module: String, package: String },

    /// A module listed itself as a dependency
    #[error("Module {0} cannot require itself")]
    SelfRequires(String),

    /// Same dependency listed twice
    #[error("Module {module} requires {dependency} more than once")]
    DuplicateRequires { module: String, dependency: String },

    /// Same package exported twice
    #[error("Module {module} exports package {package} more than once")]
    DuplicateExport { module: String, package: String },

    /// Same package concealed twice
    #[error("Module {module} conceals package {package} more than once")]
    DuplicateConceal { module: String, package: String },

    /// Package listed as both exported and concealed
    #[error("Module {module} declares package {package} as both exported and concealed")]
    ExportedAndConcealed { module: String, package: String },

    /// Qualified export without any target
    #[error("Module {module} exports package {package} to an empty target list")]
    EmptyExportTargets { module: String, package: String },

    /// Same target listed twice in one qualified export
    #[error("Module {module} exports package {package} to {target} more than once")]
    DuplicateExportTarget {
        module: String,
        package: String,
        target: String,
    },

    /// Qualified export target is not a valid module name
    #[error("Module {module} exports package {package} to invalid module name {target}")]
    InvalidExportTarget {
        module: String,
        package: String,
        target: String,
    },
}

/// Export declaration for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "targets", rename_all = "lowercase")]
pub enum Export {
    /// Visible to every module that reads the owner
    Unqualified,

    /// Visible only to the listed modules
    Qualified(BTreeSet<String>),
}

impl Export {
    /// Check if this export is restricted to a target list
    pub fn is_qualified(&self) -> bool {
        matches!(self, Export::Qualified(_))
    }

    /// Target modules of a qualified export
    pub fn targets(&self) -> Option<&BTreeSet<String>> {
        match self {
            Export::Unqualified => None,
            Export::Qualified(targets) => Some(targets),
        }
    }

    /// Check if the named module is admitted by this export
    pub fn admits(&self, module: &str) -> bool {
        match self {
            Export::Unqualified => true,
            Export::Qualified(targets) => targets.contains(module),
        }
    }
}

/// Immutable declaration of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    name: String,
    requires: BTreeSet<String>,
    exports: BTreeMap<String, Export>,
    concealed: BTreeSet<String>,
}

impl ModuleDescriptor {
    /// Start building a descriptor for the named module
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of directly required modules
    pub fn requires(&self) -> &BTreeSet<String> {
        &self.requires
    }

    /// Exported packages and their export declarations
    pub fn exports(&self) -> &BTreeMap<String, Export> {
        &self.exports
    }

    /// Packages owned but not exported
    pub fn concealed(&self) -> &BTreeSet<String> {
        &self.concealed
    }

    /// All packages owned by this module, in name order
    pub fn packages(&self) -> BTreeSet<&str> {
        self.exports
            .keys()
            .chain(self.concealed.iter())
            .map(String::as_str)
            .collect()
    }

    /// Check if this module owns the package
    pub fn owns_package(&self, package: &str) -> bool {
        self.exports.contains_key(package) || self.concealed.contains(package)
    }

    /// Export declaration for a package, `None` when the package is concealed
    /// or not owned at all
    pub fn export_of(&self, package: &str) -> Option<&Export> {
        self.exports.get(package)
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {} {{", self.name)?;
        for dependency in &self.requires {
            write!(f, " requires {};", dependency)?;
        }
        for (package, export) in &self.exports {
            match export {
                Export::Unqualified => write!(f, " exports {};", package)?,
                Export::Qualified(targets) => {
                    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                    write!(f, " exports {} to {};", package, targets.join(", "))?
                }
            }
        }
        for package in &self.concealed {
            write!(f, " conceals {};", package)?;
        }
        write!(f, " }}")
    }
}

/// Builder for [`ModuleDescriptor`]
///
/// Declarations are accumulated as given so that duplicates can be reported
/// by [`DescriptorBuilder::build`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    requires: Vec<String>,
    exports: Vec<(String, Option<Vec<String>>)>,
    concealed: Vec<String>,
}

impl DescriptorBuilder {
    /// Create a builder for the named module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            exports: Vec::new(),
            concealed: Vec::new(),
        }
    }

    /// Add a required module
    pub fn requires(mut self, module: impl Into<String>) -> Self {
        self.requires.push(module.into());
        self
    }

    /// Export a package to every reader
    pub fn exports(mut self, package: impl Into<String>) -> Self {
        self.exports.push((package.into(), None));
        self
    }

    /// Export a package to the listed modules only
    pub fn exports_to<I, S>(mut self, package: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets = targets.into_iter().map(Into::into).collect();
        self.exports.push((package.into(), Some(targets)));
        self
    }

    /// Declare an owned package that is not exported
    pub fn conceals(mut self, package: impl Into<String>) -> Self {
        self.concealed.push(package.into());
        self
    }

    /// Validate the declarations and freeze them into a descriptor
    pub fn build(self) -> Result<ModuleDescriptor, DescriptorError> {
        let name = self.name;
        if name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if !is_valid_qualified_name(&name) {
            return Err(DescriptorError::InvalidModuleName(name));
        }

        let mut requires = BTreeSet::new();
        for dependency in self.requires {
            if dependency == name {
                return Err(DescriptorError::SelfRequires(name));
            }
            if !is_valid_qualified_name(&dependency) {
                return Err(DescriptorError::InvalidModuleName(dependency));
            }
            if requires.contains(&dependency) {
                return Err(DescriptorError::DuplicateRequires {
                    module: name,
                    dependency,
                });
            }
            requires.insert(dependency);
        }

        let mut exports = BTreeMap::new();
        for (package, targets) in self.exports {
            check_package_name(&name, &package)?;
            if exports.contains_key(&package) {
                return Err(DescriptorError::DuplicateExport {
                    module: name,
                    package,
                });
            }
            let export = match targets {
                None => Export::Unqualified,
                Some(targets) => {
                    if targets.is_empty() {
                        return Err(DescriptorError::EmptyExportTargets {
                            module: name,
                            package,
                        });
                    }
                    if let Some(target) = targets.iter().find(|t| !is_valid_qualified_name(t)) {
                        return Err(DescriptorError::InvalidExportTarget {
                            target: target.clone(),
                            module: name,
                            package,
                        });
                    }
                    let mut unique = BTreeSet::new();
                    for target in targets {
                        if unique.contains(&target) {
                            return Err(DescriptorError::DuplicateExportTarget {
                                module: name,
                                package,
                                target,
                            });
                        }
                        unique.insert(target);
                    }
                    Export::Qualified(unique)
                }
            };
            exports.insert(package, export);
        }

        let mut concealed = BTreeSet::new();
        for package in self.concealed {
            check_package_name(&name, &package)?;
            if exports.contains_key(&package) {
                return Err(DescriptorError::ExportedAndConcealed {
                    module: name,
                    package,
                });
            }
            if concealed.contains(&package) {
                return Err(DescriptorError::DuplicateConceal {
                    module: name,
                    package,
                });
            }
            concealed.insert(package);
        }

        Ok(ModuleDescriptor {
            name,
            requires,
            exports,
            concealed,
        })
    }
}

fn check_package_name(module: &str, package: &str) -> Result<(), DescriptorError> {
    if is_valid_qualified_name(package) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidPackageName {
            module: module.to_string(),
            package: package.to_string(),
        })
    }
}

/// Check if a name is a dot-separated sequence of identifiers (`java.base`, `p1`)
pub fn is_valid_qualified_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_valid_identifier)
}

fn is_valid_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
