//! `stratum check`: Decide an access from one module to a package of another.
//!
//! Exits with status 1 when the access is denied.

use super::GraphArgs;
use crate::output::{resolve_color_choice, StyledOutput};
use stratum_module::{boot, package_of, ModuleRef};

pub struct CheckArgs {
    /// Requesting module, `None` for the boot loader's unnamed module
    pub from: Option<String>,
    pub to: String,
    pub package: Option<String>,
    pub type_name: Option<String>,
}

impl CheckArgs {
    fn requester(&self) -> ModuleRef {
        match &self.from {
            Some(name) => ModuleRef::named(name),
            None => boot::unnamed_module().module_ref(),
        }
    }

    fn package(&self) -> anyhow::Result<&str> {
        match (&self.package, &self.type_name) {
            (Some(package), _) => Ok(package.as_str()),
            (None, Some(type_name)) => Ok(package_of(type_name)),
            (None, None) => anyhow::bail!("Either --package or --type is required"),
        }
    }
}

pub fn execute(graph: &GraphArgs, args: &CheckArgs, color: &str) -> anyhow::Result<()> {
    let layer = graph.build_layer()?;
    let requester = args.requester();
    let target = ModuleRef::named(&args.to);
    let package = args.package()?;

    let access = layer.access_checker().check(&requester, &target, package);

    let mut out = StyledOutput::new(resolve_color_choice(Some(color)));
    match access.into_result(&requester, &target, package) {
        Ok(()) => {
            out.success("permitted");
            out.plain(&format!(": {} may access {} in {}", requester, package, target));
            out.newline();
            out.flush();
            Ok(())
        }
        Err(denial) => {
            out.error("denied");
            out.plain(&format!(": {}", denial));
            out.newline();
            out.flush();
            std::process::exit(1);
        }
    }
}
