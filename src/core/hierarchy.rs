//! Explicit type hierarchy: classes, mixin modules and their linearizations.
//!
//! Every type is linearized once, when it is registered. Superclasses and
//! mixins must already exist at that point, so the graph is acyclic by
//! construction and a linearization never changes afterwards.

use crate::core::error::AbstractError;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::LazyLock;

static TYPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn instance(self) -> ClassLike {
        ClassLike {
            ty: self,
            facet: Facet::Instance,
        }
    }

    pub fn static_ns(self) -> ClassLike {
        ClassLike {
            ty: self,
            facet: Facet::Static,
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Instantiable, at most one superclass.
    Class,
    /// Mixin only.
    Module,
}

impl TypeKind {
    pub fn as_str(&self) -> &str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Module => "module",
        }
    }
}

/// Which method surface of a type a [`ClassLike`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Instance,
    Static,
}

/// Anything that can own methods and abstract declarations.
///
/// The static facet of a type is its own `ClassLike`: it has its own registry
/// entry, method table and memo, and is linked to the instance facet only
/// through the shared `TypeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassLike {
    pub ty: TypeId,
    pub facet: Facet,
}

impl ClassLike {
    pub fn with_facet(self, facet: Facet) -> Self {
        Self { ty: self.ty, facet }
    }

    pub fn is_static(&self) -> bool {
        self.facet == Facet::Static
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mixin {
    Include(TypeId),
    Prepend(TypeId),
}

impl Mixin {
    fn target(&self) -> TypeId {
        match self {
            Mixin::Include(id) | Mixin::Prepend(id) => *id,
        }
    }
}

/// Builder describing a type to register.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    name: String,
    kind: TypeKind,
    superclass: Option<TypeId>,
    mixins: Vec<Mixin>,
}

impl TypeSpec {
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Module)
    }

    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            mixins: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: TypeId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn include(mut self, module: TypeId) -> Self {
        self.mixins.push(Mixin::Include(module));
        self
    }

    pub fn prepend(mut self, module: TypeId) -> Self {
        self.mixins.push(Mixin::Prepend(module));
        self
    }
}

#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub name: String,
    pub kind: TypeKind,
    pub superclass: Option<TypeId>,
    pub mixins: Vec<Mixin>,
    /// Method resolution order, the type itself included, most specific first.
    pub linearization: Vec<TypeId>,
}

#[derive(Debug, Default)]
pub struct TypeGraph {
    types: Vec<TypeEntry>,
    by_name: FxHashMap<String, TypeId>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: TypeSpec) -> Result<TypeId, AbstractError> {
        if !TYPE_NAME.is_match(&spec.name) {
            return Err(AbstractError::InvalidArgument(format!(
                "wrong type name {:?}",
                spec.name
            )));
        }
        if self.by_name.contains_key(&spec.name) {
            return Err(AbstractError::InvalidArgument(format!(
                "type {} is already registered",
                spec.name
            )));
        }
        if let Some(parent) = spec.superclass {
            if spec.kind == TypeKind::Module {
                return Err(AbstractError::InvalidArgument(format!(
                    "module {} cannot have a superclass",
                    spec.name
                )));
            }
            if self.get(parent)?.kind != TypeKind::Class {
                return Err(AbstractError::InvalidArgument(format!(
                    "superclass of {} must be a class, got module {}",
                    spec.name,
                    self.name(parent)?
                )));
            }
        }
        for mixin in &spec.mixins {
            let target = self.get(mixin.target())?;
            if target.kind != TypeKind::Module {
                return Err(AbstractError::InvalidArgument(format!(
                    "{} can only mix in modules, got class {}",
                    spec.name, target.name
                )));
            }
        }

        let id = TypeId(self.types.len() as u32);
        let linearization = self.linearize(id, &spec);
        tracing::trace!(ty = %spec.name, depth = linearization.len(), "registered type");

        self.by_name.insert(spec.name.clone(), id);
        self.types.push(TypeEntry {
            name: spec.name,
            kind: spec.kind,
            superclass: spec.superclass,
            mixins: spec.mixins,
            linearization,
        });
        Ok(id)
    }

    /// Prepends, self, includes, then the superclass chain. Includes are
    /// deduplicated against everything already present; prepends only
    /// against earlier prepends, with a final pass keeping the most specific
    /// occurrence of each type.
    fn linearize(&self, id: TypeId, spec: &TypeSpec) -> Vec<TypeId> {
        let parent: &[TypeId] = spec
            .superclass
            .map(|p| self.types[p.index()].linearization.as_slice())
            .unwrap_or_default();

        let mut prepends: VecDeque<TypeId> = VecDeque::new();
        let mut includes: VecDeque<TypeId> = VecDeque::new();

        for mixin in &spec.mixins {
            let ids = &self.types[mixin.target().index()].linearization;
            match mixin {
                Mixin::Prepend(_) => {
                    // Re-prepending modules that are all already present keeps the order.
                    if ids.iter().any(|m| !prepends.contains(m)) {
                        prepends.retain(|m| !ids.contains(m));
                        for m in ids.iter().rev() {
                            prepends.push_front(*m);
                        }
                    }
                }
                Mixin::Include(_) => {
                    let fresh: Vec<TypeId> = ids
                        .iter()
                        .copied()
                        .filter(|m| {
                            !prepends.contains(m) && !includes.contains(m) && !parent.contains(m)
                        })
                        .collect();
                    for m in fresh.into_iter().rev() {
                        includes.push_front(m);
                    }
                }
            }
        }

        let mut out: Vec<TypeId> = Vec::with_capacity(prepends.len() + includes.len() + parent.len() + 1);
        for m in prepends
            .into_iter()
            .chain(std::iter::once(id))
            .chain(includes)
            .chain(parent.iter().copied())
        {
            if !out.contains(&m) {
                out.push(m);
            }
        }
        out
    }

    pub fn get(&self, id: TypeId) -> Result<&TypeEntry, AbstractError> {
        self.types.get(id.index()).ok_or_else(|| {
            AbstractError::InvalidArgument(format!("unknown type id {}", id.index()))
        })
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: TypeId) -> Result<&str, AbstractError> {
        Ok(self.get(id)?.name.as_str())
    }

    pub fn kind(&self, id: TypeId) -> Result<TypeKind, AbstractError> {
        Ok(self.get(id)?.kind)
    }

    pub fn linearization(&self, id: TypeId) -> Result<&[TypeId], AbstractError> {
        Ok(self.get(id)?.linearization.as_slice())
    }

    /// Linearization of a class-like, mapped onto its facet, most specific first.
    pub fn ancestors(&self, target: ClassLike) -> Result<Vec<ClassLike>, AbstractError> {
        Ok(self
            .linearization(target.ty)?
            .iter()
            .map(|id| ClassLike {
                ty: *id,
                facet: target.facet,
            })
            .collect())
    }

    pub fn describe(&self, target: ClassLike) -> String {
        let name = self
            .types
            .get(target.ty.index())
            .map(|t| t.name.as_str())
            .unwrap_or("<unknown>");
        match target.facet {
            Facet::Instance => name.to_string(),
            Facet::Static => format!("{} (static)", name),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(|i| TypeId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
