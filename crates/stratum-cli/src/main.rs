//! Stratum command-line tool
//!
//! Reads module manifests, resolves them into configurations and runs
//! access checks against the result.

mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use commands::GraphArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stratum")]
#[command(about = "Inspect and check Stratum module graphs", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter directives (overrides STRATUM_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Color output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the modules declared in a manifest
    Describe {
        /// Module manifest
        manifest: PathBuf,
        /// Output format: pretty, json
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Resolve a manifest and print the readability graph
    Resolve {
        #[command(flatten)]
        graph: GraphArgs,
        /// Output format: pretty, json
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Check whether one module may access a package of another
    Check {
        #[command(flatten)]
        graph: GraphArgs,
        /// Requesting module
        #[arg(long, required_unless_present = "from_unnamed", conflicts_with = "from_unnamed")]
        from: Option<String>,
        /// Request from the unnamed module of the boot loader
        #[arg(long)]
        from_unnamed: bool,
        /// Target module
        #[arg(long)]
        to: String,
        /// Package in the target module
        #[arg(long, required_unless_present = "type_name", conflicts_with = "type_name")]
        package: Option<String>,
        /// Dotted type name in the target module (e.g. `p2.C`)
        #[arg(long = "type")]
        type_name: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log.as_deref());

    match cli.command {
        Commands::Describe { manifest, format } => {
            commands::describe::execute(&manifest, &format, &cli.color)
        }
        Commands::Resolve { graph, format } => {
            commands::resolve::execute(&graph, &format, &cli.color)
        }
        Commands::Check {
            graph,
            from,
            from_unnamed: _,
            to,
            package,
            type_name,
        } => {
            let args = commands::check::CheckArgs {
                from,
                to,
                package,
                type_name,
            };
            commands::check::execute(&graph, &args, &cli.color)
        }
    }
}
