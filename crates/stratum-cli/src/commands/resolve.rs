//! `stratum resolve`: Resolve a manifest and print the readability graph.

use super::GraphArgs;
use crate::output::{resolve_color_choice, StyledOutput};
use serde::Serialize;
use stratum_module::Layer;

#[derive(Serialize)]
struct GraphSnapshot<'a> {
    modules: Vec<ModuleSnapshot<'a>>,
    edges: usize,
    parent_modules: Vec<&'a str>,
}

#[derive(Serialize)]
struct ModuleSnapshot<'a> {
    name: &'a str,
    loader: Option<&'a str>,
    reads: Vec<&'a str>,
}

impl<'a> GraphSnapshot<'a> {
    fn of(layer: &'a Layer) -> Self {
        let configuration = layer.configuration();
        let modules = layer
            .modules()
            .map(|name| ModuleSnapshot {
                name,
                loader: layer.find_loader(name).map(|loader| loader.name()),
                reads: configuration
                    .reads_of(name)
                    .map(|reads| reads.iter().map(String::as_str).collect())
                    .unwrap_or_default(),
            })
            .collect();
        let parent_modules = layer
            .parent()
            .map(|parent| parent.modules().collect())
            .unwrap_or_default();

        Self {
            modules,
            edges: configuration.edge_count(),
            parent_modules,
        }
    }
}

pub fn execute(graph: &GraphArgs, format: &str, color: &str) -> anyhow::Result<()> {
    let layer = graph.build_layer()?;
    let snapshot = GraphSnapshot::of(&layer);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let mut out = StyledOutput::new(resolve_color_choice(Some(color)));
    out.success("Resolved");
    out.plain(&format!(
        " {} modules, {} reads edges",
        snapshot.modules.len(),
        snapshot.edges
    ));
    out.newline();
    if !snapshot.parent_modules.is_empty() {
        out.dim(&format!("  parent: {}", snapshot.parent_modules.join(", ")));
        out.newline();
    }

    for module in &snapshot.modules {
        out.bold(module.name);
        if !module.reads.is_empty() {
            out.plain(" -> ");
            for (i, read) in module.reads.iter().enumerate() {
                if i > 0 {
                    out.plain(", ");
                }
                // Modules owned by the parent are highlighted
                if snapshot.parent_modules.contains(read) {
                    out.info(read);
                } else {
                    out.plain(read);
                }
            }
        }
        out.newline();
    }
    out.flush();

    Ok(())
}
