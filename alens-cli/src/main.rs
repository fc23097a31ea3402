// SPDX-License-Identifier: AGPL-3.0-or-later
//! alens CLI
//!
//! Inspect and edit file metadata on local and mounted remote storage.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "alens")]
#[command(author, version, about = "alens - uniform file metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Driver configuration file (defaults to the per-user config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every attribute the driver can resolve
    #[command(alias = "info")]
    Stat {
        /// URI or local path
        target: String,

        /// Include attributes that could not be resolved
        #[arg(short, long)]
        all: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Print selected attributes
    Get {
        /// URI or local path
        target: String,

        /// Attribute names, e.g. standard::size or unix::mode
        #[arg(required = true)]
        attributes: Vec<String>,
    },

    /// Set an attribute and write it back
    Set {
        /// URI or local path
        target: String,

        /// Attribute name
        attribute: String,

        /// New value; `0644` style integers are octal
        value: String,
    },

    /// Check whether a file exists (exit status 1 if not)
    Exists {
        /// URI or local path
        target: String,
    },

    /// Show permissions as seen through a content handle
    Perms {
        /// URI or local path
        target: String,
    },

    /// List schemes with a registered driver
    Schemes,

    /// List known attribute names
    Attrs,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match commands::Context::new(cli.config.as_deref(), cli.json) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Stat { target, all, human } => commands::stat(&ctx, &target, all, human),
        Commands::Get { target, attributes } => commands::get(&ctx, &target, &attributes),
        Commands::Set { target, attribute, value } => {
            commands::set(&ctx, &target, &attribute, &value)
        }
        Commands::Exists { target } => match commands::exists(&ctx, &target) {
            Ok(true) => Ok(()),
            Ok(false) => return ExitCode::from(1),
            Err(e) => Err(e),
        },
        Commands::Perms { target } => commands::perms(&ctx, &target),
        Commands::Schemes => commands::schemes(&ctx),
        Commands::Attrs => commands::attrs(&ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
