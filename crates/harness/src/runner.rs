//! Per-test boundary
//!
//! [`FixtureTest::run`] builds the project, runs the body and disposes the
//! session. Whatever goes wrong in between, an error or a panic, ends up as
//! a [`TestOutcome`] for that one test.

use crate::logging::init_test_logging;
use crate::project::ProjectBuilder;
use crate::session::Session;
use markcheck_core::Result;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Label recorded for a panic caught at the test boundary
pub const UNEXPECTED_FAULT: &str = "UnexpectedFault";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Supported,
    /// Known not to work yet; skipped before the fixture is parsed
    NotYetSupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed { kind: String, message: String },
    Skipped,
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Panics with the failure message unless the test passed or was skipped
    pub fn assert_passed(&self) {
        if let Self::Failed { kind, message } = self {
            panic!("{kind}: {message}");
        }
    }
}

/// One fixture-driven test case
#[derive(Debug, Clone)]
pub struct FixtureTest {
    name: String,
    content: String,
    status: TestStatus,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

impl FixtureTest {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            status: TestStatus::Supported,
        }
    }

    pub fn status(mut self, status: TestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run<F>(&self, builder: &ProjectBuilder, body: F) -> TestOutcome
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        init_test_logging();
        if self.status == TestStatus::NotYetSupported {
            debug!(test = %self.name, "Skipping test that is not yet supported");
            return TestOutcome::Skipped;
        }

        let result = catch_unwind(AssertUnwindSafe(|| -> Result<()> {
            let mut session = builder.session(&self.name, &self.content)?;
            let outcome = body(&mut session);
            let disposed = session.dispose();
            outcome?;
            disposed
        }));

        match result {
            Ok(Ok(())) => TestOutcome::Passed,
            Ok(Err(err)) => {
                warn!(test = %self.name, kind = err.kind(), "Test failed");
                TestOutcome::Failed {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(test = %self.name, %message, "Test panicked");
                TestOutcome::Failed {
                    kind: UNEXPECTED_FAULT.to_string(),
                    message,
                }
            }
        }
    }
}
