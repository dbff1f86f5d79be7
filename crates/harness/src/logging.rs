//! Test logging utilities

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging based on environment variables
///
/// Checks the following environment variables in order:
/// 1. MARKCHECK_TEST_LOG - Specific to fixture tests
/// 2. RUST_LOG - General Rust logging
/// 3. Default: "error" level
///
/// Safe to call from every test; the subscriber is installed once per process.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let log_level = std::env::var("MARKCHECK_TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "error".to_string());

        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_test_writer()
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        init_test_logging();
    }
}
