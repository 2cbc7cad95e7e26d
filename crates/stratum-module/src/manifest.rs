//! Module manifests (stratum.toml)
//!
//! Declares module descriptors in TOML:
//!
//! ```toml
//! [[module]]
//! name = "m1"
//! requires = ["m2"]
//!
//! [[module]]
//! name = "m2"
//! exports = ["p2"]
//! conceals = ["p6"]
//!
//! [module.exports-to]
//! p3 = ["m1"]
//! ```
//!
//! Entries go through [`DescriptorBuilder`], so a manifest is subject to the
//! same validation as descriptors built in code.

use crate::descriptor::{DescriptorBuilder, DescriptorError, ModuleDescriptor};
use crate::finder::{FinderError, ModuleLibrary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to render TOML
    #[error("Failed to serialize manifest: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A module entry is malformed
    #[error("Invalid module declaration: {0}")]
    InvalidModule(#[from] DescriptorError),

    /// Two entries declare the same module
    #[error("Invalid manifest: {0}")]
    Finder(#[from] FinderError),
}

/// Manifest file holding module declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleManifest {
    /// Declared modules
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,
}

/// One module declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleEntry {
    /// Module name
    pub name: String,

    /// Required modules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Packages exported to everyone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,

    /// Owned packages that are not exported
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conceals: Vec<String>,

    /// Packages exported to named modules only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exports_to: BTreeMap<String, Vec<String>>,
}

impl ModuleEntry {
    /// Build the descriptor declared by this entry
    pub fn to_descriptor(&self) -> Result<ModuleDescriptor, DescriptorError> {
        let mut builder = DescriptorBuilder::new(&self.name);
        for dependency in &self.requires {
            builder = builder.requires(dependency);
        }
        for package in &self.exports {
            builder = builder.exports(package);
        }
        for (package, targets) in &self.exports_to {
            builder = builder.exports_to(package, targets.iter().cloned());
        }
        for package in &self.conceals {
            builder = builder.conceals(package);
        }
        builder.build()
    }
}

impl From<&ModuleDescriptor> for ModuleEntry {
    fn from(descriptor: &ModuleDescriptor) -> Self {
        let mut exports = Vec::new();
        let mut exports_to = BTreeMap::new();
        for (package, export) in descriptor.exports() {
            match export.targets() {
                None => exports.push(package.clone()),
                Some(targets) => {
                    exports_to.insert(package.clone(), targets.iter().cloned().collect());
                }
            }
        }

        Self {
            name: descriptor.name().to_string(),
            requires: descriptor.requires().iter().cloned().collect(),
            exports,
            conceals: descriptor.concealed().iter().cloned().collect(),
            exports_to,
        }
    }
}

impl ModuleManifest {
    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a manifest from a string
    ///
    /// Every entry is validated, so a manifest that parses also converts.
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: ModuleManifest = toml::from_str(content)?;
        manifest.to_descriptors()?;
        Ok(manifest)
    }

    /// Build a manifest from descriptors
    pub fn from_descriptors<'a, I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = &'a ModuleDescriptor>,
    {
        Self {
            modules: descriptors.into_iter().map(ModuleEntry::from).collect(),
        }
    }

    /// Build the descriptors declared by this manifest, in file order
    pub fn to_descriptors(&self) -> Result<Vec<ModuleDescriptor>, ManifestError> {
        self.modules
            .iter()
            .map(|entry| entry.to_descriptor().map_err(ManifestError::from))
            .collect()
    }

    /// Build an in-memory finder over the declared modules
    pub fn to_library(&self) -> Result<ModuleLibrary, ManifestError> {
        Ok(ModuleLibrary::of(self.to_descriptors()?)?)
    }

    /// Names of the declared modules, in file order
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    /// Render this manifest as TOML
    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string(self)?)
    }

    /// Write this manifest to a file
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Export;
    use crate::finder::ModuleFinder;

    const MANIFEST: &str = r#"
[[module]]
name = "m1"
requires = ["m2"]

[[module]]
name = "m2"
exports = ["p2"]
conceals = ["p6"]

[module.exports-to]
p3 = ["m1"]
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = ModuleManifest::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.module_names().collect::<Vec<_>>(), vec!["m1", "m2"]);

        let descriptors = manifest.to_descriptors().unwrap();
        let m2 = &descriptors[1];
        assert_eq!(m2.export_of("p2"), Some(&Export::Unqualified));
        assert!(m2.export_of("p3").unwrap().admits("m1"));
        assert!(m2.concealed().contains("p6"));
    }

    #[test]
    fn test_to_library() {
        let library = ModuleManifest::from_str(MANIFEST).unwrap().to_library().unwrap();
        assert_eq!(library.len(), 2);
        assert!(library.find("m1").unwrap().requires().contains("m2"));
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let manifest = ModuleManifest {
            modules: vec![
                ModuleEntry::from(&ModuleDescriptor::builder("m1").build().unwrap()),
                ModuleEntry::from(&ModuleDescriptor::builder("m1").build().unwrap()),
            ],
        };
        assert!(matches!(
            manifest.to_library(),
            Err(ManifestError::Finder(FinderError::DuplicateModule(_)))
        ));
    }

    #[test]
    fn test_invalid_entry_rejected() {
        let content = r#"
[[module]]
name = "m1"
exports = ["p1"]
conceals = ["p1"]
"#;
        assert!(matches!(
            ModuleManifest::from_str(content),
            Err(ManifestError::InvalidModule(DescriptorError::ExportedAndConcealed { .. }))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ModuleManifest::from_str("[[module]]\nrequires = 3"),
            Err(ManifestError::ParseError(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let manifest = ModuleManifest::from_str(MANIFEST).unwrap();
        let rendered = manifest.to_toml_string().unwrap();
        assert_eq!(ModuleManifest::from_str(&rendered).unwrap(), manifest);
    }

    #[test]
    fn test_from_descriptors() {
        let descriptors = ModuleManifest::from_str(MANIFEST)
            .unwrap()
            .to_descriptors()
            .unwrap();
        let rebuilt = ModuleManifest::from_descriptors(&descriptors)
            .to_descriptors()
            .unwrap();
        assert_eq!(rebuilt, descriptors);
    }
}
