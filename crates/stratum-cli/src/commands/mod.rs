pub mod check;
pub mod describe;
pub mod resolve;

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stratum_module::{Layer, LoaderId, ModuleManifest, Resolver};
use tracing::debug;

/// Manifest and roots to resolve, optionally on top of a parent manifest
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Module manifest (stratum.toml)
    pub manifest: PathBuf,

    /// Root module, repeatable (defaults to every declared module)
    #[arg(short, long = "root")]
    pub roots: Vec<String>,

    /// Manifest resolved first, as the parent configuration
    #[arg(long)]
    pub parent: Option<PathBuf>,

    /// Root module of the parent manifest, repeatable
    #[arg(long = "parent-root", requires = "parent")]
    pub parent_roots: Vec<String>,
}

impl GraphArgs {
    /// Resolve the manifest, and its parent if any, into a layer
    pub fn build_layer(&self) -> anyhow::Result<Layer> {
        let parent = match &self.parent {
            Some(path) => Some(Arc::new(resolve_layer(path, &self.parent_roots, None)?)),
            None => None,
        };
        resolve_layer(&self.manifest, &self.roots, parent)
    }
}

pub fn load_manifest(path: &Path) -> anyhow::Result<ModuleManifest> {
    ModuleManifest::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn resolve_layer(path: &Path, roots: &[String], parent: Option<Arc<Layer>>) -> anyhow::Result<Layer> {
    let manifest = load_manifest(path)?;
    let library = manifest
        .to_library()
        .with_context(|| format!("Invalid manifest {}", path.display()))?;

    let roots: Vec<String> = if roots.is_empty() {
        manifest.module_names().map(String::from).collect()
    } else {
        roots.to_vec()
    };

    let mut resolver = Resolver::new(&library);
    if let Some(parent) = &parent {
        resolver = resolver.with_parent(parent.configuration().clone());
    }
    let configuration = resolver
        .resolve(&roots)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    // Every module of a manifest shares one loading unit, named after the file
    let loader = LoaderId::new(path.display().to_string());
    debug!(%loader, roots = roots.len(), "binding manifest modules");
    Ok(Layer::create(
        Arc::new(configuration),
        parent,
        |_| Some(loader.clone()),
    )?)
}
