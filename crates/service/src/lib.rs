//! Service adapter for markcheck
//!
//! Everything between the verifier and the analysis service: the
//! [`LanguageService`] trait, a JSON-RPC client that implements it over a
//! language server process, the per-test document store, and the
//! normalization of responses into byte-offset types.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod adapter;
pub mod documents;
pub mod lsp_client;
pub mod response;
pub mod service;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use adapter::ServiceAdapter;
pub use documents::{Document, DocumentStore};
pub use lsp_client::{path_to_uri, uri_to_path, LspClient};
pub use response::{
    kind_from_name, kind_name, CompletionResponse, EditSpan, ItemDefaults, ItemEdit,
    LocationSpan, ParameterInfo, QuickInfo, ResponseItem, SignatureHelpInfo, SignatureInfo,
};
pub use service::{
    language_id, CompletionItemDefaults, CompletionListResult, DefaultEditRange,
    LanguageService, ServiceFactory,
};
