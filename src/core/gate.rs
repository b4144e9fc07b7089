//! Validation gate run on every instance creation.
//!
//! A class is re-validated only when its effective abstract-name list has
//! changed since its last successful validation, or when some member of its
//! own linearization has lost a concrete body since then. Independently of that, a
//! class that still declares abstract names itself can never be created.

use crate::core::config::GateConfig;
use crate::core::error::{AbstractError, NotImplemented};
use crate::core::hierarchy::{ClassLike, TypeId, TypeKind};
use crate::core::names::MethodName;
use crate::core::resolver::ContractResolver;
use crate::core::slots::Slots;
use std::fmt;

/// Creation paths; both are gated identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOp {
    /// Construct and initialize.
    New,
    /// Allocate storage only.
    Allocate,
}

impl CreateOp {
    pub fn as_str(&self) -> &str {
        match self {
            CreateOp::New => "new",
            CreateOp::Allocate => "allocate",
        }
    }
}

impl fmt::Display for CreateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot taken at the last successful validation of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMemo {
    pub names: Vec<MethodName>,
    /// Method-table revision of every linearization member, most specific first.
    pub revisions: Vec<(ClassLike, u64)>,
}

pub struct ValidationGate {
    config: GateConfig,
    memos: Slots<ClassLike, Option<ValidationMemo>>,
}

impl ValidationGate {
    pub fn new(config: GateConfig) -> Self {
        if config.ignore_validation {
            tracing::warn!("abstract method validation disabled by configuration");
        }
        Self {
            config,
            memos: Slots::new("memo"),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn memo(&self, target: ClassLike) -> Result<Option<ValidationMemo>, AbstractError> {
        Ok(self.memos.read(target, |m| m.clone())?.flatten())
    }

    fn snapshot(
        &self,
        resolver: &ContractResolver<'_>,
        target: ClassLike,
    ) -> Result<ValidationMemo, AbstractError> {
        let graph = resolver.graph();
        let mut revisions = Vec::new();
        for member in graph.ancestors(target)? {
            revisions.push((member, resolver.methods().revision(member)?));
        }
        Ok(ValidationMemo {
            names: resolver.registry().declared_effective(graph, target, true)?,
            revisions,
        })
    }

    /// False when validation is disabled or the memo still matches.
    pub fn required_validate(
        &self,
        resolver: &ContractResolver<'_>,
        target: ClassLike,
    ) -> Result<bool, AbstractError> {
        if self.config.ignore_validation {
            return Ok(false);
        }
        let current = self.snapshot(resolver, target)?;
        Ok(self.memo(target)?.as_ref() != Some(&current))
    }

    /// Resolve `target` and record the memo on success, unconditionally.
    pub fn validate(
        &self,
        resolver: &ContractResolver<'_>,
        target: ClassLike,
    ) -> Result<(), AbstractError> {
        self.memos
            .with(target, |memo| self.validate_locked(resolver, target, memo, true))?
    }

    fn validate_locked(
        &self,
        resolver: &ContractResolver<'_>,
        target: ClassLike,
        memo: &mut Option<ValidationMemo>,
        force: bool,
    ) -> Result<(), AbstractError> {
        let graph = resolver.graph();
        if !force && self.config.ignore_validation {
            tracing::debug!(class = %graph.describe(target), "validation bypassed");
            return Ok(());
        }
        // Taken before resolving so a concurrent change forces the next check.
        let current = self.snapshot(resolver, target)?;
        if !force && memo.as_ref() == Some(&current) {
            tracing::debug!(class = %graph.describe(target), "validation memo hit");
            return Ok(());
        }

        let result = resolver.resolve(target)?;
        if !result.is_empty() {
            tracing::debug!(
                class = %graph.describe(target),
                owners = result.len(),
                "abstract methods not implemented"
            );
            return Err(AbstractError::NotImplemented(NotImplemented::Missing(
                result.describe(graph),
            )));
        }
        *memo = Some(current);
        Ok(())
    }

    /// Gate an instance-creation attempt on `ty`.
    pub fn check_creation(
        &self,
        resolver: &ContractResolver<'_>,
        ty: TypeId,
        op: CreateOp,
    ) -> Result<(), AbstractError> {
        let graph = resolver.graph();
        let registry = resolver.registry();
        let target = ty.instance();

        if graph.kind(ty)? == TypeKind::Module {
            return Err(AbstractError::InvalidArgument(format!(
                "module {} cannot call {}",
                graph.name(ty)?,
                op
            )));
        }
        if !registry.participates(graph, target)? {
            return Ok(());
        }

        self.memos
            .with(target, |memo| self.validate_locked(resolver, target, memo, false))??;

        if !registry.declared_effective(graph, target, false)?.is_empty() {
            return Err(AbstractError::WrongOperation {
                target: graph.describe(target),
                op: op.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hierarchy::{TypeGraph, TypeSpec};
    use crate::core::methods::MethodTables;
    use crate::core::registry::AbstractRegistry;

    struct Fixture {
        graph: TypeGraph,
        registry: AbstractRegistry,
        methods: MethodTables,
    }

    impl Fixture {
        fn resolver(&self) -> ContractResolver<'_> {
            ContractResolver::new(&self.graph, &self.registry, &self.methods)
        }
    }

    fn formatter_fixture() -> (Fixture, TypeId, TypeId, TypeId) {
        let mut graph = TypeGraph::new();
        let base = graph.register(TypeSpec::class("AbstractFormatter")).unwrap();
        let a = graph.register(TypeSpec::class("AFormatter").extends(base)).unwrap();
        let b = graph.register(TypeSpec::class("BFormatter").extends(base)).unwrap();
        let fx = Fixture {
            graph,
            registry: AbstractRegistry::new(),
            methods: MethodTables::new(),
        };
        fx.registry.declare(base.instance(), &["format"]).unwrap();
        let format = MethodName::new("format").unwrap();
        fx.methods.define(a.instance(), &format).unwrap();
        fx.methods.define(b.instance(), &format).unwrap();
        (fx, base, a, b)
    }

    #[test]
    fn memo_is_per_class() {
        let (fx, _, a, b) = formatter_fixture();
        let gate = ValidationGate::new(GateConfig::default());
        let r = fx.resolver();

        assert!(gate.required_validate(&r, a.instance()).unwrap());
        assert!(gate.required_validate(&r, b.instance()).unwrap());
        gate.check_creation(&r, a, CreateOp::New).unwrap();
        assert!(!gate.required_validate(&r, a.instance()).unwrap());
        assert!(gate.required_validate(&r, b.instance()).unwrap());

        let memo = gate.memo(a.instance()).unwrap().unwrap();
        assert_eq!(memo.names, vec![MethodName::new("format").unwrap()]);
    }

    #[test]
    fn declaring_abstract_class_is_wrong_operation_after_validating() {
        let (fx, base, _, _) = formatter_fixture();
        let gate = ValidationGate::new(GateConfig::default());
        let r = fx.resolver();

        for op in [CreateOp::New, CreateOp::Allocate] {
            let err = gate.check_creation(&r, base, op).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("AbstractFormatter has abstract methods. and therefore can't call {op}.")
            );
        }
        assert!(gate.memo(base.instance()).unwrap().is_some());
    }

    #[test]
    fn removing_an_override_forces_revalidation() {
        let (fx, _, a, _) = formatter_fixture();
        let gate = ValidationGate::new(GateConfig::default());
        gate.check_creation(&fx.resolver(), a, CreateOp::New).unwrap();

        fx.methods
            .remove(a.instance(), &MethodName::new("format").unwrap())
            .unwrap();
        let r = fx.resolver();
        assert!(gate.required_validate(&r, a.instance()).unwrap());
        let err = gate.check_creation(&r, a, CreateOp::Allocate).unwrap_err();
        assert!(err.missing().is_some());
    }

    #[test]
    fn removal_outside_the_chain_keeps_the_memo() {
        let (fx, _, a, b) = formatter_fixture();
        let gate = ValidationGate::new(GateConfig::default());
        gate.check_creation(&fx.resolver(), a, CreateOp::New).unwrap();
        let before = gate.memo(a.instance()).unwrap().unwrap();

        fx.methods
            .remove(b.instance(), &MethodName::new("format").unwrap())
            .unwrap();
        let r = fx.resolver();
        assert!(!gate.required_validate(&r, a.instance()).unwrap());
        assert!(gate.required_validate(&r, b.instance()).unwrap());
        assert_eq!(gate.memo(a.instance()).unwrap().unwrap(), before);
        assert!(before.revisions.iter().all(|(m, _)| *m != b.instance()));
    }

    #[test]
    fn ignore_validation_skips_resolution_but_not_wrong_operation() {
        let (fx, base, a, _) = formatter_fixture();
        fx.methods
            .remove(a.instance(), &MethodName::new("format").unwrap())
            .unwrap();
        let gate = ValidationGate::new(GateConfig::default().with_ignore_validation(true));
        let r = fx.resolver();

        assert!(!gate.required_validate(&r, a.instance()).unwrap());
        gate.check_creation(&r, a, CreateOp::New).unwrap();
        assert!(gate.memo(a.instance()).unwrap().is_none());
        assert!(matches!(
            gate.check_creation(&r, base, CreateOp::New),
            Err(AbstractError::WrongOperation { .. })
        ));
    }

    #[test]
    fn non_participants_and_modules() {
        let mut graph = TypeGraph::new();
        let plain = graph.register(TypeSpec::class("Plain")).unwrap();
        let m = graph.register(TypeSpec::module("Mixin")).unwrap();
        let fx = Fixture {
            graph,
            registry: AbstractRegistry::new(),
            methods: MethodTables::new(),
        };
        let gate = ValidationGate::new(GateConfig::default());
        let r = fx.resolver();

        gate.check_creation(&r, plain, CreateOp::New).unwrap();
        assert!(gate.memo(plain.instance()).unwrap().is_none());
        assert!(matches!(
            gate.check_creation(&r, m, CreateOp::New),
            Err(AbstractError::InvalidArgument(_))
        ));
    }
}
