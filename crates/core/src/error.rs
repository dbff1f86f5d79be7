use thiserror::Error;

/// Result type for markcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for markcheck operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed fixture markup
    ///
    /// Line and column are 1-based and refer to the raw fixture text of `file`.
    #[error("{file} ({line},{column}): {message}")]
    FixtureParse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// Unknown marker, range or file, or a position outside the active file
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// An expectation did not hold
    #[error("{0}")]
    Assertion(String),

    /// A serialized snapshot differs from its stored reference
    #[error("baseline file {baseline} has changed\n{diff}")]
    BaselineMismatch { baseline: String, diff: String },

    /// A snapshot was produced for which no reference exists yet
    #[error("new baseline created at {local}.")]
    NewBaseline { local: String },

    /// Failure reported by (or while talking to) the analysis service
    #[error("Service error: {0}")]
    Service(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a fixture parse error at a 1-based line and column
    pub fn fixture_parse(
        file: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::FixtureParse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates a navigation error
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    /// Creates an assertion failure
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }

    /// Creates a baseline mismatch carrying a unified diff
    pub fn baseline_mismatch(baseline: impl Into<String>, diff: impl Into<String>) -> Self {
        Self::BaselineMismatch {
            baseline: baseline.into(),
            diff: diff.into(),
        }
    }

    pub fn new_baseline(local: impl Into<String>) -> Self {
        Self::NewBaseline {
            local: local.into(),
        }
    }

    /// Creates a service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Stable label for reporting which class of failure ended a test
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FixtureParse { .. } => "FixtureParseError",
            Self::Navigation(_) => "NavigationError",
            Self::Assertion(_) => "AssertionFailure",
            Self::BaselineMismatch { .. } | Self::NewBaseline { .. } => "BaselineMismatch",
            Self::Service(_) => "ServiceError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IoError",
            Self::WithContext { .. } | Self::Other(_) => "UnexpectedFault",
        }
    }

    /// Whether the error was raised before any expectation could be checked
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::FixtureParse { .. } | Self::Config(_))
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_parse_display_uses_file_line_column() {
        let err = Error::fixture_parse("/a.ts", 3, 7, "Unterminated range.");
        assert_eq!(err.to_string(), "/a.ts (3,7): Unterminated range.");
        assert_eq!(err.kind(), "FixtureParseError");
        assert!(err.is_setup_failure());
    }

    #[test]
    fn test_baseline_mismatch_mentions_file() {
        let err = Error::baseline_mismatch("goToDef/x.baseline.jsonc", "-a\n+b\n");
        assert!(err.to_string().starts_with("baseline file goToDef/x.baseline.jsonc has changed"));
        assert!(!err.is_setup_failure());
    }

    #[test]
    fn test_context_wraps_source() {
        let io: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = io.context("reading reference").unwrap_err();
        assert_eq!(err.to_string(), "reading reference: gone");
        assert_eq!(err.kind(), "UnexpectedFault");
    }
}
