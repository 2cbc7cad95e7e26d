//! Stratum module system
//!
//! This crate resolves module dependency graphs and enforces cross-module
//! access rules:
//! - Module descriptors and their builder-time validation
//! - Descriptor manifests (stratum.toml)
//! - Module finders
//! - Resolution into immutable configurations
//! - Layers binding configurations to loading units
//! - Readability and export checks, including unnamed modules
//!
//! Data flows one way: descriptors are handed to a finder, the resolver turns
//! the finder's modules into a [`Configuration`], and a [`Layer`] binds that
//! configuration to loading units. [`AccessChecker`] consults the
//! configuration for readability and the descriptors for exports.

pub mod access;
pub mod boot;
pub mod configuration;
pub mod descriptor;
pub mod finder;
pub mod layer;
pub mod manifest;
pub mod resolver;
pub mod unnamed;

pub use access::{package_of, Access, AccessChecker, IllegalAccess};
pub use configuration::Configuration;
pub use descriptor::{DescriptorBuilder, DescriptorError, Export, ModuleDescriptor};
pub use finder::{ComposedFinder, EmptyFinder, FinderError, ModuleFinder, ModuleLibrary};
pub use layer::{Layer, LayerError, LoaderId};
pub use manifest::{ManifestError, ModuleEntry, ModuleManifest};
pub use resolver::{resolve, ResolutionError, Resolver};
pub use unnamed::{ModuleRef, UnnamedModule, UnnamedModuleId};
