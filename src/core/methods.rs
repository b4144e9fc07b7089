//! Per class-like method tables.

use crate::core::error::AbstractError;
use crate::core::hierarchy::ClassLike;
use crate::core::names::MethodName;
use crate::core::slots::Slots;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodBody {
    Concrete,
    /// Placeholder for an abstract name; fails when dispatched to.
    Skeleton { declared_in: ClassLike },
}

impl MethodBody {
    pub fn is_concrete(&self) -> bool {
        matches!(self, MethodBody::Concrete)
    }
}

/// Methods defined directly on one class-like, in definition order.
#[derive(Debug, Default, Clone)]
pub struct MethodTable {
    entries: Vec<(MethodName, MethodBody)>,
    /// Bumped whenever a concrete body disappears from this table.
    revision: u64,
}

impl MethodTable {
    fn position(&self, name: &MethodName) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Returns the body that was replaced, if any.
    fn set(&mut self, name: &MethodName, body: MethodBody) -> Option<MethodBody> {
        let previous = match self.position(name) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, body)),
            None => {
                self.entries.push((name.clone(), body));
                None
            }
        };
        if previous.is_some_and(|b| b.is_concrete()) && !body.is_concrete() {
            self.revision += 1;
        }
        previous
    }

    fn remove(&mut self, name: &MethodName) -> Option<MethodBody> {
        let removed = self.position(name).map(|i| self.entries.remove(i).1);
        if removed.is_some_and(|b| b.is_concrete()) {
            self.revision += 1;
        }
        removed
    }

    pub fn get(&self, name: &MethodName) -> Option<MethodBody> {
        self.position(name).map(|i| self.entries[i].1)
    }

    pub fn names(&self) -> Vec<MethodName> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}

pub struct MethodTables {
    tables: Slots<ClassLike, MethodTable>,
}

impl Default for MethodTables {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodTables {
    pub fn new() -> Self {
        Self {
            tables: Slots::new("method"),
        }
    }

    /// Define (or redefine) a concrete method directly on `owner`.
    pub fn define(&self, owner: ClassLike, name: &MethodName) -> Result<(), AbstractError> {
        self.tables.with(owner, |table| {
            table.set(name, MethodBody::Concrete);
        })
    }

    /// Install a skeleton body, replacing whatever `owner` defined under `name`.
    pub fn install_skeleton(&self, owner: ClassLike, name: &MethodName) -> Result<(), AbstractError> {
        self.tables.with(owner, |table| {
            table.set(name, MethodBody::Skeleton { declared_in: owner });
        })
    }

    /// Remove `name` from `owner`'s own table. Returns the removed body.
    pub fn remove(
        &self,
        owner: ClassLike,
        name: &MethodName,
    ) -> Result<Option<MethodBody>, AbstractError> {
        self.tables.with(owner, |table| table.remove(name))
    }

    pub fn body(&self, owner: ClassLike, name: &MethodName) -> Result<Option<MethodBody>, AbstractError> {
        Ok(self.tables.read(owner, |table| table.get(name))?.flatten())
    }

    /// True when `owner` itself carries a non-placeholder body for `name`.
    pub fn defines_concretely(&self, owner: ClassLike, name: &MethodName) -> Result<bool, AbstractError> {
        Ok(self
            .body(owner, name)?
            .is_some_and(|b| b.is_concrete()))
    }

    pub fn local_names(&self, owner: ClassLike) -> Result<Vec<MethodName>, AbstractError> {
        Ok(self.tables.read(owner, |t| t.names())?.unwrap_or_default())
    }

    /// First definition of `name` along `ancestors` (most specific first).
    pub fn lookup(
        &self,
        ancestors: &[ClassLike],
        name: &MethodName,
    ) -> Result<Option<(ClassLike, MethodBody)>, AbstractError> {
        for owner in ancestors {
            if let Some(body) = self.body(*owner, name)? {
                return Ok(Some((*owner, body)));
            }
        }
        Ok(None)
    }

    /// Count of concrete bodies `owner` has lost so far.
    pub fn revision(&self, owner: ClassLike) -> Result<u64, AbstractError> {
        Ok(self.tables.read(owner, |t| t.revision)?.unwrap_or(0))
    }
}
