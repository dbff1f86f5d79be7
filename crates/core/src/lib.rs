//! Core types for the markcheck fixture verification engine
//!
//! This crate provides the foundations shared by every other markcheck crate:
//!
//! - **Error handling**: one error taxonomy covering fixture parsing, navigation,
//!   assertions, baselines and service faults
//! - **Text coordinates**: byte ranges, line/character positions and the
//!   [`LineMap`] that converts between them
//! - **Configuration**: layered TOML + environment configuration
//!

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod text;

// Re-export main types for convenience
pub use config::{BaselineConfig, Config, FixtureConfig, ServerConfig};
pub use error::{Error, Result, ResultExt};
pub use text::{LineMap, LinePosition, PositionEncoding, TextRange};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::text::{LineMap, TextRange};
}
