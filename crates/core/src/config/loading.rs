//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::Config;

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `MARKCHECK_` and use double underscores
    /// for nested values. For example:
    /// - `MARKCHECK_BASELINES__ACCEPT=true`
    /// - `MARKCHECK_SERVER__COMMAND="my-server --stdio"`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for missing sections
        let builder = set_config_default(
            builder,
            "baselines.reference_dir",
            DEFAULT_REFERENCE_DIR,
        )?;
        let builder = set_config_default(builder, "baselines.local_dir", DEFAULT_LOCAL_DIR)?;
        let builder = set_config_default(builder, "baselines.accept", default_accept())?;
        let builder = set_config_default(builder, "server.root_dir", DEFAULT_ROOT_DIR)?;
        let builder = set_config_default(
            builder,
            "server.position_encoding",
            default_position_encoding().as_protocol(),
        )?;
        let mut builder = set_config_default(
            builder,
            "fixtures.default_extension",
            DEFAULT_FILE_EXTENSION,
        )?;

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MARKCHECK")
                .separator("__")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("server.command")
                .with_list_parse_key("fixtures.extra_options"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (`./markcheck.toml` or custom --config path)
    /// 3. Environment variables (MARKCHECK_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Path::new(DEFAULT_CONFIG_FILE).to_path_buf(),
        };
        tracing::debug!("Loading configuration from {}", path.display());
        Self::from_file(&path)
    }
}
