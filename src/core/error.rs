use serde::Serialize;
use std::fmt;
use std::io;
use thiserror::Error;

/// Missing overrides contributed by one declaring ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingMethods {
    pub owner: String,
    pub methods: Vec<String>,
}

/// Payload of [`AbstractError::NotImplemented`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotImplemented {
    /// Validation found declaring ancestors whose names no descendant overrides.
    Missing(Vec<MissingMethods>),
    /// A placeholder installed for an abstract name was invoked directly.
    Skeleton { method: String, owner: String },
}

impl fmt::Display for NotImplemented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(entries) => {
                write!(f, "following abstract methods are not implemented.")?;
                for entry in entries {
                    write!(
                        f,
                        "\n[{}] defined in {}",
                        entry.methods.join(", "),
                        entry.owner
                    )?;
                }
                Ok(())
            }
            Self::Skeleton { method, owner } => write!(
                f,
                "{} is abstract method defined in {}, and must implement.",
                method, owner
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum AbstractError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotImplemented(NotImplemented),
    #[error("{target} has abstract methods. and therefore can't call {op}.")]
    WrongOperation { target: String, op: String },
    #[error("undefined method `{method}` for {receiver}")]
    UndefinedMethod { method: String, receiver: String },
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("Check failed: {0} class(es) with unimplemented abstract methods")]
    CheckFailed(usize),
}

impl AbstractError {
    /// Missing-override details when this is a validation failure.
    pub fn missing(&self) -> Option<&[MissingMethods]> {
        match self {
            Self::NotImplemented(NotImplemented::Missing(entries)) => Some(entries),
            _ => None,
        }
    }
}
