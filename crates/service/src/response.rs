//! Service responses normalized to byte offsets
//!
//! Everything the verifier looks at goes through these types, so the
//! matcher and the baseline renderers never see protocol positions or the
//! several alternative shapes the protocol allows for one value.

use crate::documents::{Document, DocumentStore};
use crate::lsp_client::uri_to_path;
use crate::service::{CompletionItemDefaults, CompletionListResult, DefaultEditRange};
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemTag, CompletionTextEdit, Documentation,
    Hover, HoverContents, Location, MarkedString, ParameterLabel, SignatureHelp,
};
use markcheck_core::{LinePosition, PositionEncoding, Result, TextRange};
use serde::Serialize;

/// Insert span of an edit plus the optional wider replace span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EditSpan {
    pub insert: TextRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<TextRange>,
}

impl From<TextRange> for EditSpan {
    fn from(insert: TextRange) -> Self {
        Self {
            insert,
            replace: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEdit {
    pub new_text: String,
    pub span: EditSpan,
}

/// One completion entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<ItemEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_characters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_description: Option<String>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preselect: Option<bool>,
    /// The item as received, for `completionItem/resolve`
    #[serde(skip)]
    pub raw: CompletionItem,
}

/// Protocol kind numbers and the names used in expectations
const KIND_NAMES: &[(CompletionItemKind, &str)] = &[
    (CompletionItemKind::TEXT, "text"),
    (CompletionItemKind::METHOD, "method"),
    (CompletionItemKind::FUNCTION, "function"),
    (CompletionItemKind::CONSTRUCTOR, "constructor"),
    (CompletionItemKind::FIELD, "field"),
    (CompletionItemKind::VARIABLE, "variable"),
    (CompletionItemKind::CLASS, "class"),
    (CompletionItemKind::INTERFACE, "interface"),
    (CompletionItemKind::MODULE, "module"),
    (CompletionItemKind::PROPERTY, "property"),
    (CompletionItemKind::UNIT, "unit"),
    (CompletionItemKind::VALUE, "value"),
    (CompletionItemKind::ENUM, "enum"),
    (CompletionItemKind::KEYWORD, "keyword"),
    (CompletionItemKind::SNIPPET, "snippet"),
    (CompletionItemKind::COLOR, "color"),
    (CompletionItemKind::FILE, "file"),
    (CompletionItemKind::REFERENCE, "reference"),
    (CompletionItemKind::FOLDER, "folder"),
    (CompletionItemKind::ENUM_MEMBER, "enumMember"),
    (CompletionItemKind::CONSTANT, "constant"),
    (CompletionItemKind::STRUCT, "struct"),
    (CompletionItemKind::EVENT, "event"),
    (CompletionItemKind::OPERATOR, "operator"),
    (CompletionItemKind::TYPE_PARAMETER, "typeParameter"),
];

pub fn kind_name(kind: CompletionItemKind) -> Option<&'static str> {
    KIND_NAMES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, name)| *name)
}

pub fn kind_from_name(name: &str) -> Option<CompletionItemKind> {
    KIND_NAMES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(k, _)| *k)
}

fn documentation_text(doc: &Documentation) -> String {
    match doc {
        Documentation::String(s) => s.clone(),
        Documentation::MarkupContent(markup) => markup.value.clone(),
    }
}

impl ResponseItem {
    pub fn from_lsp(item: CompletionItem, document: &Document, encoding: PositionEncoding) -> Self {
        let edit = item.text_edit.as_ref().map(|edit| match edit {
            CompletionTextEdit::Edit(edit) => ItemEdit {
                new_text: edit.new_text.clone(),
                span: EditSpan::from(document.span(edit.range, encoding)),
            },
            CompletionTextEdit::InsertAndReplace(edit) => ItemEdit {
                new_text: edit.new_text.clone(),
                span: EditSpan {
                    insert: document.span(edit.insert, encoding),
                    replace: Some(document.span(edit.replace, encoding)),
                },
            },
        });
        let deprecated = item
            .tags
            .as_ref()
            .is_some_and(|tags| tags.contains(&CompletionItemTag::DEPRECATED));

        Self {
            label: item.label.clone(),
            kind: item.kind.and_then(kind_name).map(str::to_string),
            detail: item.detail.clone(),
            documentation: item.documentation.as_ref().map(documentation_text),
            sort_text: item.sort_text.clone(),
            filter_text: item.filter_text.clone(),
            insert_text: item.insert_text.clone(),
            edit,
            commit_characters: item.commit_characters.clone(),
            label_detail: item
                .label_details
                .as_ref()
                .and_then(|d| d.detail.clone()),
            label_description: item
                .label_details
                .as_ref()
                .and_then(|d| d.description.clone()),
            deprecated,
            preselect: item.preselect,
            raw: item,
        }
    }

    /// Fills fields the item omits from the list's defaults
    ///
    /// Fields the item sets are never overwritten.
    pub fn with_list_defaults(mut self, defaults: Option<&ItemDefaults>) -> Self {
        let Some(defaults) = defaults else {
            return self;
        };
        if self.commit_characters.is_none() {
            self.commit_characters = defaults.commit_characters.clone();
        }
        if self.edit.is_none() {
            if let Some(span) = defaults.edit_range {
                let new_text = self
                    .raw
                    .text_edit_text
                    .clone()
                    .unwrap_or_else(|| self.label.clone());
                self.edit = Some(ItemEdit { new_text, span });
            }
        }
        self
    }
}

/// List-level item defaults in byte offsets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_characters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_range: Option<EditSpan>,
}

impl ItemDefaults {
    fn from_lsp(
        defaults: &CompletionItemDefaults,
        document: &Document,
        encoding: PositionEncoding,
    ) -> Self {
        let edit_range = defaults.edit_range.as_ref().map(|range| match range {
            DefaultEditRange::Range(range) => EditSpan::from(document.span(*range, encoding)),
            DefaultEditRange::InsertReplace { insert, replace } => EditSpan {
                insert: document.span(*insert, encoding),
                replace: Some(document.span(*replace, encoding)),
            },
        });
        Self {
            commit_characters: defaults.commit_characters.clone(),
            edit_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResponse {
    pub is_incomplete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_defaults: Option<ItemDefaults>,
    pub items: Vec<ResponseItem>,
}

impl CompletionResponse {
    pub fn from_lsp(
        list: CompletionListResult,
        document: &Document,
        encoding: PositionEncoding,
    ) -> Self {
        Self {
            is_incomplete: list.is_incomplete,
            item_defaults: list
                .item_defaults
                .as_ref()
                .map(|d| ItemDefaults::from_lsp(d, document, encoding)),
            items: list
                .items
                .into_iter()
                .map(|item| ResponseItem::from_lsp(item, document, encoding))
                .collect(),
        }
    }
}

/// Hover contents split into the display text and its documentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickInfo {
    pub text: String,
    pub documentation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextRange>,
}

/// Splits markdown hover text at its first fenced code block
fn split_markdown(value: &str) -> (String, String) {
    let trimmed = value.trim_start();
    let Some(after_fence) = trimmed.strip_prefix("```") else {
        return (String::new(), value.trim().to_string());
    };
    let body_start = after_fence.find('\n').map_or(after_fence.len(), |i| i + 1);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(close) => {
            let text = body[..close].trim_end_matches('\n').to_string();
            let rest = body[close + 3..].trim().to_string();
            (text, rest)
        }
        None => (body.trim_end().to_string(), String::new()),
    }
}

impl QuickInfo {
    pub fn from_lsp(hover: Hover, document: &Document, encoding: PositionEncoding) -> Self {
        let (text, documentation) = match hover.contents {
            HoverContents::Markup(markup) => split_markdown(&markup.value),
            HoverContents::Scalar(MarkedString::LanguageString(code)) => (code.value, String::new()),
            HoverContents::Scalar(MarkedString::String(s)) => split_markdown(&s),
            HoverContents::Array(parts) => {
                let mut text = None;
                let mut docs = Vec::new();
                for part in parts {
                    match part {
                        MarkedString::LanguageString(code) if text.is_none() => {
                            text = Some(code.value)
                        }
                        MarkedString::LanguageString(code) => docs.push(code.value),
                        MarkedString::String(s) => docs.push(s),
                    }
                }
                (text.unwrap_or_default(), docs.join("\n"))
            }
        };
        Self {
            text,
            documentation,
            span: hover.range.map(|r| document.span(r, encoding)),
        }
    }
}

/// A result location; `span` is absent when the file is not an open document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSpan {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextRange>,
    pub start: LinePosition,
    pub end: LinePosition,
}

impl LocationSpan {
    pub fn from_lsp(
        location: &Location,
        documents: &DocumentStore,
        encoding: PositionEncoding,
    ) -> Result<Self> {
        let file = uri_to_path(&location.uri)?;
        let span = documents
            .get(&file)
            .map(|doc| doc.span(location.range, encoding));
        let range = location.range;
        Ok(Self {
            file,
            span,
            start: LinePosition::new(range.start.line, range.start.character),
            end: LinePosition::new(range.end.line, range.end.character),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureInfo {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_parameter: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureHelpInfo {
    pub signatures: Vec<SignatureInfo>,
    pub active_signature: u32,
    pub active_parameter: u32,
}

/// Slices `label` by UTF-16 offsets as sent with `labelOffsetSupport`
fn slice_utf16(label: &str, start: u32, end: u32) -> String {
    let mut units = 0u32;
    let mut out = String::new();
    for ch in label.chars() {
        if units >= start && units < end {
            out.push(ch);
        }
        units += ch.len_utf16() as u32;
    }
    out
}

impl SignatureHelpInfo {
    pub fn from_lsp(help: SignatureHelp) -> Self {
        let signatures = help
            .signatures
            .into_iter()
            .map(|sig| {
                let parameters = sig
                    .parameters
                    .unwrap_or_default()
                    .into_iter()
                    .map(|param| ParameterInfo {
                        label: match param.label {
                            ParameterLabel::Simple(s) => s,
                            ParameterLabel::LabelOffsets([start, end]) => {
                                slice_utf16(&sig.label, start, end)
                            }
                        },
                        documentation: param.documentation.as_ref().map(documentation_text),
                    })
                    .collect();
                SignatureInfo {
                    documentation: sig.documentation.as_ref().map(documentation_text),
                    label: sig.label,
                    parameters,
                    active_parameter: sig.active_parameter,
                }
            })
            .collect();
        Self {
            signatures,
            active_signature: help.active_signature.unwrap_or(0),
            active_parameter: help.active_parameter.unwrap_or(0),
        }
    }

    /// Tooltip text of the active signature, with the active parameter in `*`
    pub fn display(&self) -> String {
        let Some(sig) = self
            .signatures
            .get(self.active_signature as usize)
            .or_else(|| self.signatures.first())
        else {
            return String::new();
        };
        let active = sig.active_parameter.unwrap_or(self.active_parameter) as usize;
        let mut out = sig.label.clone();
        if let Some(param) = sig.parameters.get(active) {
            if let Some(pos) = out.find(&param.label) {
                out.replace_range(pos..pos + param.label.len(), &format!("*{}*", param.label));
            }
        }
        if let Some(doc) = sig.documentation.as_deref().filter(|d| !d.is_empty()) {
            out.push('\n');
            out.push_str(doc);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{
        InsertReplaceEdit, MarkupContent, MarkupKind, ParameterInformation, Position, Range,
        SignatureInformation, TextEdit,
    };
    use pretty_assertions::assert_eq;

    fn store(text: &str) -> DocumentStore {
        let mut store = DocumentStore::new();
        store.open("/a.ts", text);
        store
    }

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    #[test]
    fn test_item_edits_become_byte_spans() {
        let store = store("f(\"al\");");
        let doc = store.get("/a.ts").expect("doc");
        let item = CompletionItem {
            label: "alpha".to_string(),
            kind: Some(CompletionItemKind::CONSTANT),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit::new(range(0, 3, 5), "alpha".into()))),
            ..Default::default()
        };
        let normalized = ResponseItem::from_lsp(item, doc, PositionEncoding::Utf8);
        assert_eq!(normalized.kind.as_deref(), Some("constant"));
        assert_eq!(
            normalized.edit,
            Some(ItemEdit {
                new_text: "alpha".to_string(),
                span: EditSpan::from(TextRange::new(3, 5)),
            })
        );
    }

    #[test]
    fn test_list_defaults_fill_missing_fields_only() {
        let store = store("obj.pr");
        let doc = store.get("/a.ts").expect("doc");
        let own = CompletionItem {
            label: "own".to_string(),
            commit_characters: Some(vec![".".to_string()]),
            text_edit: Some(CompletionTextEdit::InsertAndReplace(InsertReplaceEdit {
                new_text: "own".to_string(),
                insert: range(0, 4, 5),
                replace: range(0, 4, 6),
            })),
            ..Default::default()
        };
        let bare = CompletionItem {
            label: "prop".to_string(),
            ..Default::default()
        };
        let defaults = ItemDefaults {
            commit_characters: Some(vec![".".into(), ",".into(), ";".into()]),
            edit_range: Some(EditSpan::from(TextRange::new(4, 6))),
        };

        let own = ResponseItem::from_lsp(own, doc, PositionEncoding::Utf8)
            .with_list_defaults(Some(&defaults));
        assert_eq!(own.commit_characters, Some(vec![".".to_string()]));
        assert_eq!(
            own.edit.map(|e| e.span.replace),
            Some(Some(TextRange::new(4, 6)))
        );

        let bare = ResponseItem::from_lsp(bare, doc, PositionEncoding::Utf8)
            .with_list_defaults(Some(&defaults));
        assert_eq!(bare.commit_characters, defaults.commit_characters);
        assert_eq!(
            bare.edit,
            Some(ItemEdit {
                new_text: "prop".to_string(),
                span: EditSpan::from(TextRange::new(4, 6)),
            })
        );

        let quoted = CompletionItem {
            label: "prop".to_string(),
            text_edit_text: Some("[\"prop\"]".to_string()),
            ..Default::default()
        };
        let quoted = ResponseItem::from_lsp(quoted, doc, PositionEncoding::Utf8)
            .with_list_defaults(Some(&defaults));
        assert_eq!(quoted.edit.map(|e| e.new_text), Some("[\"prop\"]".to_string()));
    }

    #[test]
    fn test_quick_info_splits_code_block_and_docs() {
        let store = store("const x = 1;");
        let doc = store.get("/a.ts").expect("doc");
        let hover = Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: "```typescript\nconst x: 1\n```\nThe answer.".to_string(),
            }),
            range: Some(range(0, 6, 7)),
        };
        let info = QuickInfo::from_lsp(hover, doc, PositionEncoding::Utf8);
        assert_eq!(info.text, "const x: 1");
        assert_eq!(info.documentation, "The answer.");
        assert_eq!(info.span, Some(TextRange::new(6, 7)));
    }

    #[test]
    fn test_signature_label_offsets() {
        let help = SignatureHelp {
            signatures: vec![SignatureInformation {
                label: "f(a: number, b: string): void".to_string(),
                documentation: None,
                parameters: Some(vec![
                    ParameterInformation {
                        label: ParameterLabel::LabelOffsets([2, 11]),
                        documentation: None,
                    },
                    ParameterInformation {
                        label: ParameterLabel::Simple("b: string".to_string()),
                        documentation: None,
                    },
                ]),
                active_parameter: None,
            }],
            active_signature: Some(0),
            active_parameter: Some(1),
        };
        let info = SignatureHelpInfo::from_lsp(help);
        assert_eq!(info.signatures[0].parameters[0].label, "a: number");
        assert_eq!(info.display(), "f(a: number, *b: string*): void");
    }
}
