//! Configuration module for markcheck
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Every field has a default, so an absent file yields a usable configuration.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use crate::text::PositionEncoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

/// Where baselines live and how mismatches are handled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Directory holding the accepted snapshots
    #[serde(default = "default_reference_dir")]
    pub reference_dir: PathBuf,

    /// Directory that receives snapshots which differ from their reference
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// Overwrite references with the actual output instead of comparing
    #[serde(default = "default_accept")]
    pub accept: bool,
}

/// How to reach the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Command line that launches a language server on stdio; empty means none configured
    #[serde(default)]
    pub command: Vec<String>,

    /// Workspace root announced to the server
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Preferred position encoding offered during initialization
    #[serde(default = "default_position_encoding")]
    pub position_encoding: PositionEncoding,

    /// Passed through verbatim as `initializationOptions`
    #[serde(default)]
    pub initialization_options: Option<serde_json::Value>,
}

/// Fixture interpretation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Extension given to the implicit file of a fixture without `@filename`
    #[serde(default = "default_file_extension")]
    pub default_extension: String,

    /// Option pragmas accepted in addition to the built-in registry
    #[serde(default)]
    pub extra_options: Vec<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub baselines: BaselineConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub fixtures: FixtureConfig,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            reference_dir: default_reference_dir(),
            local_dir: default_local_dir(),
            accept: default_accept(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            root_dir: default_root_dir(),
            position_encoding: default_position_encoding(),
            initialization_options: None,
        }
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            default_extension: default_file_extension(),
            extra_options: Vec::new(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.baselines.reference_dir == self.baselines.local_dir {
            return Err(Error::config(format!(
                "baselines.reference_dir and baselines.local_dir must differ (both are {})",
                self.baselines.reference_dir.display()
            )));
        }

        if let Some(program) = self.server.command.first() {
            if program.trim().is_empty() {
                return Err(Error::config("server.command has an empty program name"));
            }
        }

        if !self.server.root_dir.starts_with('/') {
            return Err(Error::config(format!(
                "server.root_dir must be absolute, got {:?}",
                self.server.root_dir
            )));
        }

        let ext = &self.fixtures.default_extension;
        if ext.is_empty() || ext.contains(['.', '/']) {
            return Err(Error::config(format!(
                "fixtures.default_extension must be a bare extension like \"ts\", got {ext:?}"
            )));
        }

        for name in &self.fixtures.extra_options {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::config(format!(
                    "fixtures.extra_options entry {name:?} is not a valid pragma name"
                )));
            }
        }

        Ok(())
    }

    /// Saves configuration as TOML
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
