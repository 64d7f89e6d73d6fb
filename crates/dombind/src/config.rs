//! Binder configuration (`[binding]` table)
//!
//! ```toml
//! [binding]
//! adoption = "reuse"
//! verify-constructors = true
//! numeric-widening = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// What `adopt` does with a host object that already has a live wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionPolicy {
    /// Return the existing wrapper if its class is compatible
    #[default]
    Reuse,
    /// Fail explicit adoption with `DuplicateAdoption`. Host values coming
    /// back from reads and calls still reuse a compatible live wrapper.
    Reject,
}

/// Binder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BindingConfig {
    /// Adoption policy for already-adopted host objects
    #[serde(default)]
    pub adoption: AdoptionPolicy,

    /// Check every host constructor when the binder is created
    #[serde(default = "default_true")]
    pub verify_constructors: bool,

    /// Accept an `Int` where a `Number` is declared
    #[serde(default = "default_true")]
    pub numeric_widening: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            adoption: AdoptionPolicy::default(),
            verify_constructors: true,
            numeric_widening: true,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    binding: BindingConfig,
}

impl BindingConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string; a missing `[binding]` table means defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.binding)
    }

    /// Render as a TOML document with a `[binding]` table
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let file = ConfigFile {
            binding: self.clone(),
        };
        Ok(toml::to_string(&file)?)
    }
}
