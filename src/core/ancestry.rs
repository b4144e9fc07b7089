//! Ancestry stream: the chain from the most general ancestor down to a class.

use crate::core::error::AbstractError;
use crate::core::hierarchy::{ClassLike, Facet, TypeGraph, TypeId, TypeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestryChain {
    members: Vec<ClassLike>,
}

impl AncestryChain {
    /// Chain for a class's own facet. Modules and unknown ids are rejected.
    pub fn for_class(graph: &TypeGraph, target: ClassLike) -> Result<Self, AbstractError> {
        let entry = graph.get(target.ty)?;
        if entry.kind != TypeKind::Class {
            return Err(AbstractError::InvalidArgument(format!(
                "wrong type argument {} (should be a class, got {})",
                entry.name,
                entry.kind.as_str()
            )));
        }
        let mut members = graph.ancestors(target)?;
        members.reverse();
        tracing::trace!(class = %graph.describe(target), len = members.len(), "ancestry chain");
        Ok(Self { members })
    }

    /// The instance chain of `ty`, each member mapped to its static facet.
    pub fn for_static(graph: &TypeGraph, ty: TypeId) -> Result<Self, AbstractError> {
        let instance = Self::for_class(graph, ty.instance())?;
        Ok(Self {
            members: instance
                .members
                .into_iter()
                .map(|m| m.with_facet(Facet::Static))
                .collect(),
        })
    }

    pub fn members(&self) -> &[ClassLike] {
        &self.members
    }

    pub fn target(&self) -> Option<ClassLike> {
        self.members.last().copied()
    }

    /// Every member strictly more specific than `member`; empty when absent.
    pub fn descendants_of(&self, member: ClassLike) -> &[ClassLike] {
        match self.members.iter().position(|m| *m == member) {
            Some(i) => &self.members[i + 1..],
            None => &[],
        }
    }

    pub fn iter_with_descendants(&self) -> impl Iterator<Item = (ClassLike, &[ClassLike])> + '_ {
        self.members
            .iter()
            .enumerate()
            .map(|(i, m)| (*m, &self.members[i + 1..]))
    }
}
