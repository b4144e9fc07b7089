//! Placeholder bodies for abstract names.

use crate::core::error::{AbstractError, NotImplemented};
use crate::core::hierarchy::{ClassLike, TypeGraph};
use crate::core::methods::MethodTables;
use crate::core::names::MethodName;

/// Install a placeholder for every name on `owner`.
pub fn install(
    methods: &MethodTables,
    owner: ClassLike,
    names: &[MethodName],
) -> Result<(), AbstractError> {
    for name in names {
        methods.install_skeleton(owner, name)?;
    }
    Ok(())
}

/// The failure raised when a placeholder is invoked, whatever the arguments.
pub fn invoked(graph: &TypeGraph, declared_in: ClassLike, name: &MethodName) -> AbstractError {
    AbstractError::NotImplemented(NotImplemented::Skeleton {
        method: name.to_string(),
        owner: graph.describe(declared_in),
    })
}
