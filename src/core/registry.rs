//! Abstract registry: locally declared abstract names per class-like.
//!
//! A declaration belongs to the class-like that made it and is never copied
//! onto descendants; inherited views are assembled on demand from the
//! linearization.

use crate::core::error::AbstractError;
use crate::core::hierarchy::{ClassLike, TypeGraph};
use crate::core::names::{self, MethodName};
use crate::core::slots::Slots;

#[derive(Debug, Default, Clone)]
struct RegistryEntry {
    /// Explicitly opted into the protocol (declaring implies it).
    enabled: bool,
    names: Vec<MethodName>,
}

pub struct AbstractRegistry {
    entries: Slots<ClassLike, RegistryEntry>,
}

impl Default for AbstractRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AbstractRegistry {
    pub fn new() -> Self {
        Self {
            entries: Slots::new("registry"),
        }
    }

    pub fn enable(&self, target: ClassLike) -> Result<(), AbstractError> {
        self.entries.with(target, |e| e.enabled = true)
    }

    pub fn is_enabled(&self, target: ClassLike) -> Result<bool, AbstractError> {
        Ok(self.entries.read(target, |e| e.enabled)?.unwrap_or(false))
    }

    /// Participation is inherited: subclasses and includers of a participant
    /// participate too.
    pub fn participates(&self, graph: &TypeGraph, target: ClassLike) -> Result<bool, AbstractError> {
        for member in graph.ancestors(target)? {
            if self.is_enabled(member)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Declare abstract names on `target`. Every name is validated before
    /// anything is recorded; names already declared keep their position.
    /// Returns the names that were not already declared, in call order.
    pub fn declare<S: AsRef<str>>(
        &self,
        target: ClassLike,
        raw: &[S],
    ) -> Result<Vec<MethodName>, AbstractError> {
        let declared = names::parse_all(raw)?;
        self.entries.with(target, |e| {
            e.enabled = true;
            let mut added = Vec::new();
            for name in declared {
                if !e.names.contains(&name) {
                    e.names.push(name.clone());
                    added.push(name);
                }
            }
            added
        })
    }

    /// Remove names from `target`'s own list. Names it never declared are
    /// ignored and left out of the result.
    pub fn undeclare<S: AsRef<str>>(
        &self,
        target: ClassLike,
        raw: &[S],
    ) -> Result<Vec<MethodName>, AbstractError> {
        let requested = names::parse_all(raw)?;
        if self.entries.read(target, |_| ())?.is_none() {
            return Ok(Vec::new());
        }
        self.entries.with(target, |e| {
            let mut removed = Vec::new();
            for name in &requested {
                if let Some(i) = e.names.iter().position(|n| n == name) {
                    removed.push(e.names.remove(i));
                }
            }
            removed
        })
    }

    pub fn declared_locally(&self, target: ClassLike) -> Result<Vec<MethodName>, AbstractError> {
        Ok(self
            .entries
            .read(target, |e| e.names.clone())?
            .unwrap_or_default())
    }

    /// Own names first, then those of every other participating member of
    /// the linearization, most specific first. The same name declared by two
    /// owners appears twice.
    pub fn declared_effective(
        &self,
        graph: &TypeGraph,
        target: ClassLike,
        include_inherited: bool,
    ) -> Result<Vec<MethodName>, AbstractError> {
        let mut out = self.declared_locally(target)?;
        if !include_inherited {
            return Ok(out);
        }
        for ancestor in graph.ancestors(target)? {
            if ancestor == target || !self.participates(graph, ancestor)? {
                continue;
            }
            out.extend(self.declared_locally(ancestor)?);
        }
        Ok(out)
    }
}
