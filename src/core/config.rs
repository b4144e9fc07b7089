//! Gate configuration.
//!
//! Loaded from the `[gate]` table of a TOML file, with the
//! `ABSTRACTABLE_IGNORE_VALIDATE` environment variable layered on top. The
//! resulting value is handed to the gate when it is built; nothing reads the
//! environment afterwards.

use crate::core::error::AbstractError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const IGNORE_VALIDATE_ENV: &str = "ABSTRACTABLE_IGNORE_VALIDATE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Report every class as already validated. For trusted contexts only.
    pub ignore_validation: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    gate: GateConfig,
}

impl GateConfig {
    /// Presence of the variable is enough, whatever its value.
    pub fn from_env() -> Self {
        Self {
            ignore_validation: std::env::var_os(IGNORE_VALIDATE_ENV).is_some(),
        }
    }

    pub fn with_ignore_validation(mut self, ignore: bool) -> Self {
        self.ignore_validation = ignore;
        self
    }
}

pub fn parse_config(content: &str) -> Result<GateConfig, AbstractError> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.gate)
}

/// Missing file = default config (not an error).
pub fn load_config(path: &Path) -> Result<GateConfig, AbstractError> {
    if !path.exists() {
        return Ok(GateConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// File settings first, then the environment override.
pub fn resolve_config(path: Option<&Path>) -> Result<GateConfig, AbstractError> {
    let mut config = match path {
        Some(p) => load_config(p)?,
        None => GateConfig::default(),
    };
    if GateConfig::from_env().ignore_validation {
        config.ignore_validation = true;
    }
    Ok(config)
}
