//! Default values and functions for configuration

use crate::text::PositionEncoding;
use std::path::PathBuf;

// Default constants
pub(crate) const DEFAULT_REFERENCE_DIR: &str = "testdata/baselines/reference";
pub(crate) const DEFAULT_LOCAL_DIR: &str = "testdata/baselines/local";
pub(crate) const DEFAULT_ROOT_DIR: &str = "/";
pub(crate) const DEFAULT_FILE_EXTENSION: &str = "ts";
pub(crate) const DEFAULT_CONFIG_FILE: &str = "markcheck.toml";

pub(crate) fn default_reference_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REFERENCE_DIR)
}

pub(crate) fn default_local_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_DIR)
}

pub(crate) fn default_accept() -> bool {
    false
}

pub(crate) fn default_root_dir() -> String {
    DEFAULT_ROOT_DIR.to_string()
}

pub(crate) fn default_position_encoding() -> PositionEncoding {
    PositionEncoding::Utf8
}

pub(crate) fn default_file_extension() -> String {
    DEFAULT_FILE_EXTENSION.to_string()
}
