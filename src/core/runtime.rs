//! Runtime facade tying the hierarchy, method tables, registry and gate together.
//!
//! All operations take `&self`; a `Runtime` can be shared across threads.
//! Type registration is the only operation that takes the graph's write lock;
//! everything else locks per class-like.

use crate::core::config::GateConfig;
use crate::core::error::AbstractError;
use crate::core::gate::{CreateOp, ValidationGate, ValidationMemo};
use crate::core::hierarchy::{ClassLike, TypeGraph, TypeId, TypeKind, TypeSpec};
use crate::core::methods::{MethodBody, MethodTables};
use crate::core::names::{self, MethodName};
use crate::core::registry::AbstractRegistry;
use crate::core::resolver::{ContractResolver, ResolutionResult};
use crate::core::skeleton;
use std::sync::{RwLock, RwLockReadGuard};

/// A successfully created instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instance {
    class: TypeId,
    created_by: CreateOp,
}

impl Instance {
    pub fn class(&self) -> TypeId {
        self.class
    }

    pub fn created_by(&self) -> CreateOp {
        self.created_by
    }
}

pub struct Runtime {
    graph: RwLock<TypeGraph>,
    registry: AbstractRegistry,
    methods: MethodTables,
    gate: ValidationGate,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

impl Runtime {
    pub fn new(config: GateConfig) -> Self {
        Self {
            graph: RwLock::new(TypeGraph::new()),
            registry: AbstractRegistry::new(),
            methods: MethodTables::new(),
            gate: ValidationGate::new(config),
        }
    }

    pub fn config(&self) -> &GateConfig {
        self.gate.config()
    }

    fn graph(&self) -> Result<RwLockReadGuard<'_, TypeGraph>, AbstractError> {
        self.graph
            .read()
            .map_err(|_| AbstractError::LockPoisoned("type graph".to_string()))
    }

    fn resolver<'a>(&'a self, graph: &'a TypeGraph) -> ContractResolver<'a> {
        ContractResolver::new(graph, &self.registry, &self.methods)
    }

    // ===== Types =====

    pub fn register(&self, spec: TypeSpec) -> Result<TypeId, AbstractError> {
        let mut graph = self
            .graph
            .write()
            .map_err(|_| AbstractError::LockPoisoned("type graph".to_string()))?;
        graph.register(spec)
    }

    pub fn lookup(&self, name: &str) -> Result<Option<TypeId>, AbstractError> {
        Ok(self.graph()?.lookup(name))
    }

    /// Like [`Runtime::lookup`], but an unknown name is an invalid argument.
    pub fn type_id(&self, name: &str) -> Result<TypeId, AbstractError> {
        self.lookup(name)?
            .ok_or_else(|| AbstractError::InvalidArgument(format!("unknown type {}", name)))
    }

    pub fn kind(&self, ty: TypeId) -> Result<TypeKind, AbstractError> {
        self.graph()?.kind(ty)
    }

    pub fn describe(&self, target: ClassLike) -> Result<String, AbstractError> {
        let graph = self.graph()?;
        graph.get(target.ty)?;
        Ok(graph.describe(target))
    }

    pub fn types(&self) -> Result<Vec<TypeId>, AbstractError> {
        Ok(self.graph()?.ids().collect())
    }

    pub fn ancestors(&self, target: ClassLike) -> Result<Vec<ClassLike>, AbstractError> {
        self.graph()?.ancestors(target)
    }

    // ===== Declarations =====

    /// Opt `target` into the protocol without declaring anything.
    pub fn enable(&self, target: ClassLike) -> Result<(), AbstractError> {
        self.graph()?.get(target.ty)?;
        self.registry.enable(target)
    }

    pub fn declare<S: AsRef<str>>(&self, target: ClassLike, raw: &[S]) -> Result<(), AbstractError> {
        self.graph()?.get(target.ty)?;
        let declared = names::parse_all(raw)?;
        let added = self.registry.declare(target, &declared)?;
        // Re-declaring replaces any body with a fresh skeleton.
        skeleton::install(&self.methods, target, &declared)?;
        tracing::debug!(class = ?target, added = added.len(), "declared abstract methods");
        Ok(())
    }

    /// Collect names one at a time and declare them in one go.
    pub fn abstract_block(&self, target: ClassLike) -> AbstractBlock<'_> {
        AbstractBlock {
            runtime: self,
            target,
            names: Vec::new(),
        }
    }

    /// Installed skeletons stay in place; only the requirement is dropped.
    pub fn undeclare<S: AsRef<str>>(
        &self,
        target: ClassLike,
        names: &[S],
    ) -> Result<Vec<MethodName>, AbstractError> {
        self.graph()?.get(target.ty)?;
        self.registry.undeclare(target, names)
    }

    // ===== Methods =====

    pub fn define_method(&self, target: ClassLike, name: &str) -> Result<(), AbstractError> {
        self.graph()?.get(target.ty)?;
        self.methods.define(target, &MethodName::new(name)?)
    }

    pub fn define_methods<S: AsRef<str>>(&self, target: ClassLike, names: &[S]) -> Result<(), AbstractError> {
        for name in names {
            self.define_method(target, name.as_ref())?;
        }
        Ok(())
    }

    /// Remove a member from `target`'s own table and drop any local abstract
    /// declaration of the same name. Returns whether a member was removed.
    pub fn remove_method(&self, target: ClassLike, name: &str) -> Result<bool, AbstractError> {
        self.graph()?.get(target.ty)?;
        let name = MethodName::new(name)?;
        let removed = self.methods.remove(target, &name)?;
        self.registry.undeclare(target, &[name.as_str()])?;
        Ok(removed.is_some())
    }

    pub fn local_methods(&self, target: ClassLike) -> Result<Vec<MethodName>, AbstractError> {
        self.graph()?.get(target.ty)?;
        self.methods.local_names(target)
    }

    fn dispatch(&self, receiver: ClassLike, name: &str) -> Result<ClassLike, AbstractError> {
        let graph = self.graph()?;
        let name = MethodName::new(name)?;
        let mut ancestors = graph.ancestors(receiver)?;
        if receiver.is_static() {
            // Static methods of mixed-in modules are not inherited by includers.
            ancestors.retain(|m| {
                m.ty == receiver.ty || graph.kind(m.ty).is_ok_and(|k| k == TypeKind::Class)
            });
        }
        match self.methods.lookup(&ancestors, &name)? {
            Some((owner, MethodBody::Concrete)) => Ok(owner),
            Some((_, MethodBody::Skeleton { declared_in })) => {
                Err(skeleton::invoked(&graph, declared_in, &name))
            }
            None => Err(AbstractError::UndefinedMethod {
                method: name.to_string(),
                receiver: graph.describe(receiver),
            }),
        }
    }

    /// Dispatch `name` on an instance; returns the class-like whose body runs.
    pub fn call(&self, instance: &Instance, name: &str) -> Result<ClassLike, AbstractError> {
        self.dispatch(instance.class.instance(), name)
    }

    /// Dispatch `name` on the static namespace of `ty`.
    pub fn call_static(&self, ty: TypeId, name: &str) -> Result<ClassLike, AbstractError> {
        self.dispatch(ty.static_ns(), name)
    }

    // ===== Queries =====

    pub fn abstract_methods(&self, ty: TypeId, all: bool) -> Result<Vec<MethodName>, AbstractError> {
        let graph = self.graph()?;
        self.registry.declared_effective(&graph, ty.instance(), all)
    }

    pub fn abstract_static_methods(&self, ty: TypeId, all: bool) -> Result<Vec<MethodName>, AbstractError> {
        let graph = self.graph()?;
        self.registry.declared_effective(&graph, ty.static_ns(), all)
    }

    pub fn find_missing(&self, ty: TypeId) -> Result<ResolutionResult, AbstractError> {
        let graph = self.graph()?;
        self.resolver(&graph).resolve(ty.instance())
    }

    pub fn find_missing_static(&self, ty: TypeId) -> Result<ResolutionResult, AbstractError> {
        let graph = self.graph()?;
        self.resolver(&graph).resolve_static(ty)
    }

    pub fn participates(&self, target: ClassLike) -> Result<bool, AbstractError> {
        let graph = self.graph()?;
        self.registry.participates(&graph, target)
    }

    // ===== Creation =====

    pub fn required_validate(&self, ty: TypeId) -> Result<bool, AbstractError> {
        let graph = self.graph()?;
        self.gate.required_validate(&self.resolver(&graph), ty.instance())
    }

    /// Run validation now, regardless of the memo.
    pub fn validate(&self, ty: TypeId) -> Result<(), AbstractError> {
        let graph = self.graph()?;
        self.gate.validate(&self.resolver(&graph), ty.instance())
    }

    pub fn memo(&self, ty: TypeId) -> Result<Option<ValidationMemo>, AbstractError> {
        self.gate.memo(ty.instance())
    }

    pub fn create(&self, ty: TypeId, op: CreateOp) -> Result<Instance, AbstractError> {
        let graph = self.graph()?;
        self.gate.check_creation(&self.resolver(&graph), ty, op)?;
        Ok(Instance {
            class: ty,
            created_by: op,
        })
    }

    pub fn new_instance(&self, ty: TypeId) -> Result<Instance, AbstractError> {
        self.create(ty, CreateOp::New)
    }

    pub fn allocate(&self, ty: TypeId) -> Result<Instance, AbstractError> {
        self.create(ty, CreateOp::Allocate)
    }
}

/// Builder returned by [`Runtime::abstract_block`].
pub struct AbstractBlock<'a> {
    runtime: &'a Runtime,
    target: ClassLike,
    names: Vec<String>,
}

impl AbstractBlock<'_> {
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn methods<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.names
            .extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    pub fn commit(self) -> Result<(), AbstractError> {
        self.runtime.declare(self.target, &self.names)
    }
}
