//! TOML hierarchy manifests.
//!
//! A manifest lists types in registration order. Every reference (`extends`,
//! `include`, `prepend`) must name a type defined earlier in the file.
//!
//! ```toml
//! [[types]]
//! name = "AbstractList"
//! abstract = ["size", "empty?", "add"]
//!
//! [[types]]
//! name = "OneImplList"
//! extends = "AbstractList"
//! methods = ["size"]
//! ```

use crate::core::config::GateConfig;
use crate::core::error::AbstractError;
use crate::core::hierarchy::{TypeId, TypeKind, TypeSpec};
use crate::core::runtime::Runtime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: TypeKind,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub prepend: Vec<String>,
    /// Concrete instance methods defined directly on the type.
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub static_methods: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_methods: Vec<String>,
    #[serde(default)]
    pub static_abstract: Vec<String>,
    /// Opt in without declaring anything.
    #[serde(default)]
    pub abstractable: bool,
    #[serde(default)]
    pub static_abstractable: bool,
}

fn default_kind() -> TypeKind {
    TypeKind::Class
}

pub fn parse_manifest(content: &str) -> Result<Manifest, AbstractError> {
    Ok(toml::from_str(content)?)
}

pub fn load_manifest(path: &Path) -> Result<Manifest, AbstractError> {
    let content = fs::read_to_string(path)?;
    parse_manifest(&content)
}

impl Manifest {
    /// Register every type into `runtime`, in file order.
    pub fn apply(&self, runtime: &Runtime) -> Result<Vec<TypeId>, AbstractError> {
        let mut ids = Vec::with_capacity(self.types.len());
        for decl in &self.types {
            ids.push(decl.apply(runtime)?);
        }
        tracing::debug!(types = ids.len(), "manifest applied");
        Ok(ids)
    }

    pub fn build(&self, config: GateConfig) -> Result<Runtime, AbstractError> {
        let runtime = Runtime::new(config);
        self.apply(&runtime)?;
        Ok(runtime)
    }
}

impl TypeDecl {
    fn apply(&self, runtime: &Runtime) -> Result<TypeId, AbstractError> {
        let mut spec = TypeSpec::new(self.name.clone(), self.kind);
        if let Some(parent) = &self.extends {
            spec = spec.extends(self.reference(runtime, parent)?);
        }
        for module in &self.include {
            spec = spec.include(self.reference(runtime, module)?);
        }
        for module in &self.prepend {
            spec = spec.prepend(self.reference(runtime, module)?);
        }
        let id = runtime.register(spec)?;

        if self.abstractable {
            runtime.enable(id.instance())?;
        }
        if self.static_abstractable {
            runtime.enable(id.static_ns())?;
        }
        // Declarations first so explicit bodies replace the skeletons.
        if !self.abstract_methods.is_empty() {
            runtime.declare(id.instance(), &self.abstract_methods)?;
        }
        if !self.static_abstract.is_empty() {
            runtime.declare(id.static_ns(), &self.static_abstract)?;
        }
        runtime.define_methods(id.instance(), &self.methods)?;
        runtime.define_methods(id.static_ns(), &self.static_methods)?;
        Ok(id)
    }

    fn reference(&self, runtime: &Runtime, name: &str) -> Result<TypeId, AbstractError> {
        runtime.lookup(name)?.ok_or_else(|| {
            AbstractError::InvalidArgument(format!(
                "{} refers to {}, which is not defined before it",
                self.name, name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTS: &str = r#"
[[types]]
name = "AbstractList"
abstract = ["size", "empty?", "add"]

[[types]]
name = "OneImplList"
extends = "AbstractList"
methods = ["size"]

[[types]]
name = "Enumerable"
kind = "module"
abstractable = true
"#;

    #[test]
    fn parses_defaults() {
        let manifest = parse_manifest(LISTS).unwrap();
        assert_eq!(manifest.types.len(), 3);
        assert_eq!(manifest.types[0].kind, TypeKind::Class);
        assert_eq!(manifest.types[0].abstract_methods.len(), 3);
        assert_eq!(manifest.types[2].kind, TypeKind::Module);
        assert!(manifest.types[2].abstractable);
    }

    #[test]
    fn builds_a_runtime() {
        let rt = parse_manifest(LISTS)
            .unwrap()
            .build(GateConfig::default())
            .unwrap();
        let one = rt.type_id("OneImplList").unwrap();
        let missing = rt.find_missing(one).unwrap();
        let abstract_list = rt.type_id("AbstractList").unwrap();
        let names: Vec<&str> = missing
            .get(abstract_list.instance())
            .unwrap()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(names, ["empty?", "add"]);
        assert!(rt.participates(rt.type_id("Enumerable").unwrap().instance()).unwrap());
    }

    #[test]
    fn forward_references_are_rejected() {
        let manifest = parse_manifest(
            r#"
[[types]]
name = "Child"
extends = "Parent"

[[types]]
name = "Parent"
"#,
        )
        .unwrap();
        let err = manifest.build(GateConfig::default()).err().unwrap();
        assert!(matches!(err, AbstractError::InvalidArgument(_)));
        assert!(err.to_string().contains("Parent"));
    }

    #[test]
    fn bad_method_names_surface_as_invalid_argument() {
        let manifest = parse_manifest(
            r#"
[[types]]
name = "Broken"
abstract = ["not a name"]
"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.build(GateConfig::default()),
            Err(AbstractError::InvalidArgument(_))
        ));
    }
}
