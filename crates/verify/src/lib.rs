//! Expectation matching and baseline snapshots for markcheck
//!
//! [`matcher`] decides whether a completion or quick-info response satisfies
//! a declared expectation. [`baseline`] renders navigation and tooltip
//! results to deterministic text and compares them with stored references.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod baseline;
pub mod defaults;
pub mod diff;
pub mod expected;
pub mod field;
pub mod matcher;

pub use baseline::{
    baseline_name, render_locations, render_tooltips, BaselineBuilder, BaselineCommand,
    BaselineMode, BaselineStore, PendingBaseline, SourceFile, TooltipEntry, NO_CONTENT,
};
pub use defaults::{apply_defaults, DEFAULT_COMMIT_CHARACTERS, SORT_TEXT_LOCATION_PRIORITY};
pub use diff::unified_diff;
pub use expected::{
    ExpectedCompletion, ExpectedItem, ExpectedItemDefaults, ExpectedItems, ExpectedList,
};
pub use field::Field;
pub use matcher::{no_resolve, verify_completion_list, verify_quick_info, ItemResolver};
