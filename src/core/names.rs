//! Method names accepted by the registry and method tables.

use crate::core::error::AbstractError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Identifier with an optional trailing `?`, `!` or `=`.
static METHOD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*[?!=]?$").unwrap());

/// A validated method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodName(String);

impl MethodName {
    pub fn new(raw: &str) -> Result<Self, AbstractError> {
        if METHOD_NAME.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AbstractError::InvalidArgument(format!(
                "wrong type argument {:?} (should be a method name)",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MethodName {
    type Error = AbstractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for MethodName {
    type Error = AbstractError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MethodName> for String {
    fn from(value: MethodName) -> Self {
        value.0
    }
}

/// Validate a whole batch, failing on the first bad entry.
pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<MethodName>, AbstractError> {
    raw.iter().map(|s| MethodName::new(s.as_ref())).collect()
}
