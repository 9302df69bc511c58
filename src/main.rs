//! pod2nix - Convert Docker Compose files into NixOS modules
//!
//! This is the main CLI entry point for pod2nix.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pod2nix::compose::ComposeParser;
use pod2nix::{convert, routing_rules, Backend, RoutingRule};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// pod2nix - Docker Compose to NixOS converter
#[derive(Parser)]
#[command(name = "pod2nix")]
#[command(version)]
#[command(about = "Convert Docker Compose files into NixOS oci-containers modules", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a compose file into a NixOS module
    Convert {
        /// Compose file ("-" reads stdin, default: compose file in the current directory)
        file: Option<PathBuf>,
        /// Container backend (docker or podman)
        #[arg(short, long, default_value = "docker")]
        backend: Backend,
        /// Extra Traefik route: name=NAME,url=URL,host=HOST[,entrypoint=EP][,cert-resolver=R][,tls]
        #[arg(short, long = "route")]
        routes: Vec<RoutingRule>,
        /// File with a list of Traefik routes (JSON or YAML)
        #[arg(long)]
        routes_file: Option<PathBuf>,
        /// Write the module to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the Traefik routes derived from service labels as JSON
    Routes {
        /// Compose file ("-" reads stdin, default: compose file in the current directory)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries the generated output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let working_dir = std::env::current_dir()?;

    match cli.command {
        Commands::Convert {
            file,
            backend,
            mut routes,
            routes_file,
            output,
        } => {
            if let Some(path) = routes_file {
                let from_file = RoutingRule::load_file(&path)
                    .with_context(|| format!("Failed to load routes from {}", path.display()))?;
                routes.extend(from_file);
            }

            let compose_file = resolve_compose_file(file, &working_dir)?;
            let manifest = ComposeParser::read_source(&compose_file)
                .with_context(|| format!("Failed to read {}", compose_file.display()))?;
            let module = convert(&manifest, backend, &routes)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, module)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote NixOS module to {}", path.display());
                }
                None => print!("{}", module),
            }
        }

        Commands::Routes { file } => {
            let compose_file = resolve_compose_file(file, &working_dir)?;
            let manifest = ComposeParser::read_source(&compose_file)
                .with_context(|| format!("Failed to read {}", compose_file.display()))?;
            let rules = routing_rules(&manifest)?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }

    Ok(())
}

/// Explicit path, or the compose file found in the working directory
fn resolve_compose_file(file: Option<PathBuf>, working_dir: &Path) -> Result<PathBuf> {
    match file {
        Some(path) => Ok(path),
        None => ComposeParser::find_compose_file(working_dir).with_context(|| {
            format!("No compose file found in {}", working_dir.display())
        }),
    }
}
