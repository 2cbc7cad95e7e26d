//! `stratum describe`: List the modules declared in a manifest.

use crate::output::{resolve_color_choice, StyledOutput};
use std::path::Path;

pub fn execute(path: &Path, format: &str, color: &str) -> anyhow::Result<()> {
    let manifest = super::load_manifest(path)?;
    let descriptors = manifest.to_descriptors()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    let mut out = StyledOutput::new(resolve_color_choice(Some(color)));
    for descriptor in &descriptors {
        out.bold(&format!("module {}", descriptor.name()));
        out.newline();

        for dependency in descriptor.requires() {
            out.dim("  requires ");
            out.plain(dependency);
            out.newline();
        }
        for (package, export) in descriptor.exports() {
            out.dim("  exports ");
            out.plain(package);
            if let Some(targets) = export.targets() {
                let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                out.dim(" to ");
                out.plain(&targets.join(", "));
            }
            out.newline();
        }
        for package in descriptor.concealed() {
            out.dim("  conceals ");
            out.plain(package);
            out.newline();
        }
    }
    out.flush();

    Ok(())
}
