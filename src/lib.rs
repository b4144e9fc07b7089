//! Abstractable: abstract method contracts for explicit class hierarchies.
//!
//! A class or mixin module declares method names that every instantiable
//! descendant must override. Nothing is checked when types are defined; the
//! check runs when an instance is created, and fails with a message listing
//! every declaring ancestor and the names still missing on the path down to
//! the class being created.
//!
//! # Core Principles
//!
//! - **Per-path contracts**: each declaring ancestor is satisfied independently
//! - **Creation-time checks**: `new` and `allocate` are gated identically
//! - **Memoized**: a class is re-validated only when its effective abstract
//!   names (or the concrete bodies in the hierarchy) change
//! - **Strict about abstract classes**: a class that itself declares abstract
//!   methods is never instantiable
//!
//! # Architecture
//!
//! - [`crate::core::hierarchy`]: explicit type graph and linearization
//! - [`crate::core::ancestry`]: ancestry chains and descendant lookup
//! - [`crate::core::registry`]: locally declared abstract names
//! - [`crate::core::resolver`]: missing-override resolution
//! - [`crate::core::gate`]: validation memo and creation gate
//! - [`crate::core::skeleton`]: placeholder bodies for abstract names
//! - [`crate::core::runtime`]: the facade most callers use
//!
//! # Examples
//!
//! ```
//! use abstractable::{Runtime, TypeSpec};
//!
//! let rt = Runtime::default();
//! let list = rt.register(TypeSpec::class("AbstractList")).unwrap();
//! rt.declare(list.instance(), &["size", "add"]).unwrap();
//!
//! let impl_list = rt.register(TypeSpec::class("ArrayList").extends(list)).unwrap();
//! rt.define_method(impl_list.instance(), "size").unwrap();
//! assert!(rt.new_instance(impl_list).is_err());
//!
//! rt.define_method(impl_list.instance(), "add").unwrap();
//! assert!(rt.new_instance(impl_list).is_ok());
//! ```
//!
//! ```bash
//! abstractable check hierarchy.toml
//! abstractable resolve hierarchy.toml --type OneImplList
//! ABSTRACTABLE_LOG=debug abstractable instantiate hierarchy.toml --type ArrayList
//! ```

pub mod core;
mod cli;

pub use crate::core::config::GateConfig;
pub use crate::core::error::{AbstractError, MissingMethods, NotImplemented};
pub use crate::core::gate::CreateOp;
pub use crate::core::hierarchy::{ClassLike, Facet, TypeId, TypeKind, TypeSpec};
pub use crate::core::names::MethodName;
pub use crate::core::resolver::ResolutionResult;
pub use crate::core::runtime::{Instance, Runtime};

use clap::Parser;
use cli::{Cli, Command, ManifestArgs};
use crate::core::{config, error, manifest, report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn output_format(raw: &str) -> Result<OutputFormat, error::AbstractError> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(error::AbstractError::InvalidArgument(format!(
            "unknown format {:?} (expected 'text' or 'json')",
            other
        ))),
    }
}

/// Install the stderr log subscriber. `ABSTRACTABLE_LOG` holds the filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("ABSTRACTABLE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_runtime(cli: &Cli, args: &ManifestArgs) -> Result<Runtime, error::AbstractError> {
    let mut gate = config::resolve_config(cli.config.as_deref())?;
    if cli.ignore_validation {
        gate.ignore_validation = true;
    }
    let manifest = manifest::load_manifest(&args.manifest)?;
    manifest.build(gate)
}

fn print_json(value: &serde_json::Value) -> Result<(), error::AbstractError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run() -> Result<(), error::AbstractError> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Command::Check { args } => {
            let format = output_format(&args.format)?;
            let runtime = load_runtime(&cli, args)?;
            let report = report::check_all(&runtime)?;
            match format {
                OutputFormat::Text => println!("{}", report::render_text(&report)),
                OutputFormat::Json => print_json(&serde_json::to_value(&report)?)?,
            }
            if !report.passed() {
                return Err(error::AbstractError::CheckFailed(report.failures));
            }
        }
        Command::Resolve {
            args,
            type_name,
            static_ns,
        } => {
            let format = output_format(&args.format)?;
            let runtime = load_runtime(&cli, args)?;
            let ty = runtime.type_id(type_name)?;
            let result = if *static_ns {
                runtime.find_missing_static(ty)?
            } else {
                runtime.find_missing(ty)?
            };
            let mut described = Vec::new();
            for (owner, names) in result.iter() {
                described.push(MissingMethods {
                    owner: runtime.describe(owner)?,
                    methods: names.iter().map(|n| n.to_string()).collect(),
                });
            }
            match format {
                OutputFormat::Text if described.is_empty() => {
                    println!("{}: all abstract methods implemented", type_name)
                }
                OutputFormat::Text => {
                    for m in &described {
                        println!("[{}] defined in {}", m.methods.join(", "), m.owner);
                    }
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "type": type_name,
                    "static": static_ns,
                    "missing": described,
                }))?,
            }
        }
        Command::Methods {
            args,
            type_name,
            local,
            static_ns,
        } => {
            let format = output_format(&args.format)?;
            let runtime = load_runtime(&cli, args)?;
            let ty = runtime.type_id(type_name)?;
            let names = if *static_ns {
                runtime.abstract_static_methods(ty, !local)?
            } else {
                runtime.abstract_methods(ty, !local)?
            };
            match format {
                OutputFormat::Text => {
                    for name in &names {
                        println!("{}", name);
                    }
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "type": type_name,
                    "static": static_ns,
                    "inherited": !local,
                    "abstract_methods": names,
                }))?,
            }
        }
        Command::Instantiate {
            args,
            type_name,
            allocate,
        } => {
            let format = output_format(&args.format)?;
            let runtime = load_runtime(&cli, args)?;
            let ty = runtime.type_id(type_name)?;
            let op = if *allocate {
                CreateOp::Allocate
            } else {
                CreateOp::New
            };
            runtime.create(ty, op)?;
            match format {
                OutputFormat::Text => println!("{}.{}: ok", type_name, op),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "type": type_name,
                    "op": op.as_str(),
                    "status": "ok",
                }))?,
            }
        }
    }
    Ok(())
}
