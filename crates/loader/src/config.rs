//! Loader configuration via `trellis.toml`
//!
//! Every field has a default, so an empty file is a valid configuration.
//! A commented default file can be written next to a design with
//! [`LoaderConfig::write_default_if_missing`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use trellis_foreign::FORMAT_VERSION;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Policy for raw identities during a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Keep every concrete raw identity; fail if one is taken
    #[default]
    RequireProvided,
    /// Keep concrete raw identities that are free, replace the others
    PreserveOrCreate,
    /// Replace every raw identity
    CreateNew,
}

impl IdentityStrategy {
    /// Name used in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStrategy::RequireProvided => "require_provided",
            IdentityStrategy::PreserveOrCreate => "preserve_or_create",
            IdentityStrategy::CreateNew => "create_new",
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loader configuration loaded from `trellis.toml`
///
/// # Example
///
/// ```toml
/// identity_strategy = "require_provided"
/// name_from_string_id = true
/// format_version = 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Strategy used by [`DesignLoader::load`](crate::DesignLoader::load)
    #[serde(default)]
    pub identity_strategy: IdentityStrategy,
    /// Use a string object id as the `name` attribute when none is given
    #[serde(default = "default_true")]
    pub name_from_string_id: bool,
    /// Document format version read without a legacy adapter
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

fn default_true() -> bool {
    true
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            identity_strategy: IdentityStrategy::default(),
            name_from_string_id: default_true(),
            format_version: default_format_version(),
        }
    }
}

impl LoaderConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Trellis loader configuration
#
# Identity strategy for full design loads:
#   "require_provided"   = keep document identities, fail on collision (default)
#   "preserve_or_create" = keep free identities, replace taken ones
#   "create_new"         = always assign fresh identities
identity_strategy = "require_provided"

# Use a string object id as the "name" attribute when the object has none.
name_from_string_id = true

# Document format version read directly. Other versions require a legacy adapter.
format_version = 1
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, names an unknown
    /// strategy, or fails [`validate`](Self::validate).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check field values that the TOML schema cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format_version == 0 {
            return Err(ConfigError::InvalidValue(
                "format_version must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
