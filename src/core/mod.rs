//! The abstract-method engine and its ambient pieces.
//!
//! Leaves first: names and hierarchy, then method tables and the registry,
//! the ancestry stream and resolver built on them, and finally the gate and
//! runtime facade.

pub mod ancestry;
pub mod config;
pub mod error;
pub mod gate;
pub mod hierarchy;
pub mod manifest;
pub mod methods;
pub mod names;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod runtime;
pub mod skeleton;
pub mod slots;
