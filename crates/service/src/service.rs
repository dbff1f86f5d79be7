//! The analysis service seam
//!
//! [`LanguageService`] is the black box markcheck verifies. Its shape follows
//! the language server protocol: documents are addressed by absolute virtual
//! path and positions are zero-based line/character pairs in the encoding the
//! service reports through [`LanguageService::position_encoding`].

use lsp_types::{CompletionItem, Hover, Location, Position, Range, SignatureHelp};
use markcheck_core::{PositionEncoding, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// List-level defaults for items that omit the corresponding field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItemDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_characters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_range: Option<DefaultEditRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultEditRange {
    InsertReplace { insert: Range, replace: Range },
    Range(Range),
}

/// A completion list as the service returned it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionListResult {
    #[serde(default)]
    pub is_incomplete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_defaults: Option<CompletionItemDefaults>,
    #[serde(default)]
    pub items: Vec<CompletionItem>,
}

/// `textDocument/completion` may answer with a bare item array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CompletionResult {
    List(CompletionListResult),
    Items(Vec<CompletionItem>),
}

impl From<CompletionResult> for CompletionListResult {
    fn from(result: CompletionResult) -> Self {
        match result {
            CompletionResult::List(list) => list,
            CompletionResult::Items(items) => Self {
                is_incomplete: false,
                item_defaults: None,
                items,
            },
        }
    }
}

/// Synchronous source-analysis service
pub trait LanguageService {
    /// Encoding of `Position::character` in requests and responses
    fn position_encoding(&self) -> PositionEncoding;

    /// Pushes the project's resolved options
    fn configure(&mut self, options: &BTreeMap<String, String>) -> Result<()>;

    fn did_open(&mut self, path: &str, language_id: &str, version: i32, text: &str) -> Result<()>;

    /// Incremental change replacing `range` (in pre-edit coordinates) with `text`
    fn did_change(&mut self, path: &str, version: i32, range: Range, text: &str) -> Result<()>;

    fn completion(&mut self, path: &str, position: Position) -> Result<Option<CompletionListResult>>;

    fn resolve_completion(&mut self, item: CompletionItem) -> Result<CompletionItem>;

    fn hover(&mut self, path: &str, position: Position) -> Result<Option<Hover>>;

    fn definition(&mut self, path: &str, position: Position) -> Result<Vec<Location>>;

    fn references(
        &mut self,
        path: &str,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>>;

    fn signature_help(&mut self, path: &str, position: Position) -> Result<Option<SignatureHelp>>;

    fn shutdown(&mut self) -> Result<()>;
}

/// Builds a fresh service for each test
pub trait ServiceFactory {
    fn create(&self) -> Result<Box<dyn LanguageService>>;
}

impl<F> ServiceFactory for F
where
    F: Fn() -> Result<Box<dyn LanguageService>>,
{
    fn create(&self) -> Result<Box<dyn LanguageService>> {
        self()
    }
}

/// Language id announced for a file, derived from its extension
pub fn language_id(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "json" => "json",
        "py" => "python",
        "rs" => "rust",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_completion_result_accepts_list_and_array() {
        let list: CompletionResult = serde_json::from_value(json!({
            "isIncomplete": true,
            "itemDefaults": {
                "commitCharacters": [".", ","],
                "editRange": {
                    "insert": {"start": {"line": 0, "character": 1}, "end": {"line": 0, "character": 2}},
                    "replace": {"start": {"line": 0, "character": 1}, "end": {"line": 0, "character": 4}}
                }
            },
            "items": [{"label": "a"}]
        }))
        .expect("list form");
        let list = CompletionListResult::from(list);
        assert!(list.is_incomplete);
        let defaults = list.item_defaults.expect("defaults");
        assert_eq!(defaults.commit_characters, Some(vec![".".to_string(), ",".to_string()]));
        assert!(matches!(defaults.edit_range, Some(DefaultEditRange::InsertReplace { .. })));

        let array: CompletionResult =
            serde_json::from_value(json!([{"label": "b"}])).expect("array form");
        let array = CompletionListResult::from(array);
        assert!(!array.is_incomplete);
        assert_eq!(array.items[0].label, "b");
    }

    #[test]
    fn test_plain_edit_range_default() {
        let defaults: CompletionItemDefaults = serde_json::from_value(json!({
            "editRange": {"start": {"line": 2, "character": 0}, "end": {"line": 2, "character": 3}}
        }))
        .expect("defaults");
        assert!(matches!(defaults.edit_range, Some(DefaultEditRange::Range(_))));
    }

    #[test]
    fn test_language_id() {
        assert_eq!(language_id("/a.ts"), "typescript");
        assert_eq!(language_id("/b.TSX"), "typescriptreact");
        assert_eq!(language_id("/tsconfig.json"), "json");
        assert_eq!(language_id("/README"), "plaintext");
    }
}
