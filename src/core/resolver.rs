//! Contract resolution: which declared abstract names are still missing for a class.
//!
//! Each declaring ancestor is checked on its own against the members that
//! follow it in the chain. An override only counts when the member defines the
//! name itself with a concrete body; inherited bodies and skeletons do not.

use crate::core::ancestry::AncestryChain;
use crate::core::error::{AbstractError, MissingMethods};
use crate::core::hierarchy::{ClassLike, TypeGraph, TypeId};
use crate::core::methods::MethodTables;
use crate::core::names::MethodName;
use crate::core::registry::AbstractRegistry;

/// Declaring ancestor -> names still missing, in chain order.
///
/// Entries with nothing missing are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    entries: Vec<(ClassLike, Vec<MethodName>)>,
}

impl ResolutionResult {
    pub fn record(&mut self, owner: ClassLike, missing: Vec<MethodName>) {
        if !missing.is_empty() {
            self.entries.push((owner, missing));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, owner: ClassLike) -> Option<&[MethodName]> {
        self.entries
            .iter()
            .find(|(o, _)| *o == owner)
            .map(|(_, names)| names.as_slice())
    }

    pub fn owners(&self) -> Vec<ClassLike> {
        self.entries.iter().map(|(o, _)| *o).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassLike, &[MethodName])> + '_ {
        self.entries.iter().map(|(o, n)| (*o, n.as_slice()))
    }

    pub fn describe(&self, graph: &TypeGraph) -> Vec<MissingMethods> {
        self.entries
            .iter()
            .map(|(owner, names)| MissingMethods {
                owner: graph.describe(*owner),
                methods: names.iter().map(|n| n.to_string()).collect(),
            })
            .collect()
    }
}

pub struct ContractResolver<'a> {
    graph: &'a TypeGraph,
    registry: &'a AbstractRegistry,
    methods: &'a MethodTables,
}

impl<'a> ContractResolver<'a> {
    pub fn new(graph: &'a TypeGraph, registry: &'a AbstractRegistry, methods: &'a MethodTables) -> Self {
        Self {
            graph,
            registry,
            methods,
        }
    }

    pub fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    pub fn registry(&self) -> &'a AbstractRegistry {
        self.registry
    }

    pub fn methods(&self) -> &'a MethodTables {
        self.methods
    }

    pub fn resolve(&self, target: ClassLike) -> Result<ResolutionResult, AbstractError> {
        self.resolve_chain(&AncestryChain::for_class(self.graph, target)?)
    }

    /// Same check over the static-method namespaces of `ty`'s chain.
    pub fn resolve_static(&self, ty: TypeId) -> Result<ResolutionResult, AbstractError> {
        self.resolve_chain(&AncestryChain::for_static(self.graph, ty)?)
    }

    pub fn resolve_chain(&self, chain: &AncestryChain) -> Result<ResolutionResult, AbstractError> {
        let mut result = ResolutionResult::default();
        for (ancestor, descendants) in chain.iter_with_descendants() {
            if descendants.is_empty() || !self.registry.participates(self.graph, ancestor)? {
                continue;
            }
            let mut missing = Vec::new();
            for name in self.registry.declared_locally(ancestor)? {
                if !self.overridden(descendants, &name)? {
                    missing.push(name);
                }
            }
            result.record(ancestor, missing);
        }
        if let Some(target) = chain.target() {
            tracing::debug!(
                class = %self.graph.describe(target),
                owners = result.len(),
                "resolved abstract contracts"
            );
        }
        Ok(result)
    }

    fn overridden(&self, descendants: &[ClassLike], name: &MethodName) -> Result<bool, AbstractError> {
        for d in descendants {
            if self.methods.defines_concretely(*d, name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
