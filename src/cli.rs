//! CLI struct definitions for the abstractable command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "abstractable",
    version = env!("CARGO_PKG_VERSION"),
    about = "Check abstract method contracts of a class hierarchy manifest."
)]
pub(crate) struct Cli {
    /// Gate configuration file (TOML, `[gate]` table).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Treat every class as already validated.
    #[clap(long, global = true)]
    pub ignore_validation: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ManifestArgs {
    /// Hierarchy manifest (TOML, `[[types]]` entries).
    pub manifest: PathBuf,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Try to instantiate every class and report unimplemented abstract methods
    Check {
        #[clap(flatten)]
        args: ManifestArgs,
    },
    /// Show missing abstract method overrides for one class
    Resolve {
        #[clap(flatten)]
        args: ManifestArgs,
        /// Class to resolve.
        #[clap(long = "type")]
        type_name: String,
        /// Resolve the static-method namespace instead.
        #[clap(long = "static")]
        static_ns: bool,
    },
    /// List abstract methods declared on a type
    Methods {
        #[clap(flatten)]
        args: ManifestArgs,
        #[clap(long = "type")]
        type_name: String,
        /// Only the type's own declarations.
        #[clap(long)]
        local: bool,
        #[clap(long = "static")]
        static_ns: bool,
    },
    /// Create one instance through the validation gate
    Instantiate {
        #[clap(flatten)]
        args: ManifestArgs,
        #[clap(long = "type")]
        type_name: String,
        /// Use the allocate path instead of new.
        #[clap(long)]
        allocate: bool,
    },
}
