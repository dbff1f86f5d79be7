//! Per-test harness for markcheck fixtures
//!
//! A test starts from fixture text and a [`ProjectBuilder`]. The builder
//! parses the fixture, starts a fresh service and hands back a [`Session`]
//! through which the test body navigates, edits and verifies:
//!
//! ```ignore
//! let outcome = FixtureTest::new("member_completion", "const p = { x: 1 };\np./*1*/")
//!     .run(&builder, |session| {
//!         session.verify_completions("1", Some(&ExpectedList::new(ExpectedItems::includes(["x"]))))
//!     });
//! outcome.assert_passed();
//! ```

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod logging;
pub mod project;
pub mod runner;
pub mod session;
pub mod verify;

pub use logging::init_test_logging;
pub use project::{lsp_factory, ProjectBuilder};
pub use runner::{FixtureTest, TestOutcome, TestStatus, UNEXPECTED_FAULT};
pub use session::{shift_offset, Session};
pub use verify::MarkerInput;
