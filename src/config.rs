use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

use crate::env::{EnvComposer, ValuePrecedence};
use crate::errors::{DeployError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "deploy.yaml";
pub const DEFAULT_MANIFEST_PATH: &str = ".env";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Path to the variable manifest.
    #[validate(custom = "validate_manifest_path")]
    pub manifest: PathBuf,

    pub precedence: ValuePrecedence,

    /// Names omitted on top of the built-in denylist.
    #[validate(custom = "validate_denylist")]
    pub denylist: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST_PATH),
            precedence: ValuePrecedence::default(),
            denylist: Vec::new(),
        }
    }
}

fn validate_manifest_path(path: &Path) -> std::result::Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        let mut err = ValidationError::new("empty_manifest_path");
        err.message = Some("manifest path must not be empty".into());
        return Err(err);
    }
    Ok(())
}

fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_denylist(names: &[String]) -> std::result::Result<(), ValidationError> {
    if let Some(bad) = names.iter().find(|n| !is_valid_var_name(n)) {
        let mut err = ValidationError::new("invalid_variable_name");
        err.message = Some(format!("'{}' is not a valid variable name", bad).into());
        return Err(err);
    }
    Ok(())
}

impl DeployConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // an empty document deserializes to null rather than an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DeployConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded deploy config");
        Ok(config)
    }

    /// Like [`DeployConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No deploy config, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn composer(&self) -> EnvComposer {
        EnvComposer::new()
            .with_precedence(self.precedence)
            .deny(self.denylist.iter().cloned())
    }
}
