//! In-memory language service for tests
//!
//! [`MockLanguageService`] knows nothing about any real language. It works
//! on words: declarations are found with a handful of patterns
//! (`const x`, `function f(...)`, `class C`, ...), references are whole-word
//! occurrences, member completions come from object literals assigned to a
//! name, and string-literal completions come from the literal types in a
//! function's parameter list. That is enough to drive every verification
//! path end to end.

use crate::lsp_client::path_to_uri;
use crate::service::{
    CompletionItemDefaults, CompletionListResult, DefaultEditRange, LanguageService,
};
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, Hover, HoverContents,
    Location, MarkupContent, MarkupKind, ParameterInformation, ParameterLabel, Position, Range,
    SignatureHelp, SignatureInformation, TextEdit,
};
use markcheck_core::{Error, LineMap, LinePosition, PositionEncoding, Result, TextRange};
use regex::Regex;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::LazyLock;

static DECLARATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b(const|let|var|function|class|interface|type|enum)\s+([_$\p{L}][\w$]*)").ok()
});
static MEMBER_ACCESS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([_$\p{L}][\w$]*)\s*\.\s*[\w$]*$").ok());
static STRING_ARGUMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"([_$\p{L}][\w$]*)\s*\(\s*"([^"]*)$"#).ok());
static STRING_LITERAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).ok());

/// Sort text for names declared in the project
pub const LOCATION_PRIORITY: &str = "11";
/// Sort text for keywords
pub const GLOBALS_OR_KEYWORDS: &str = "15";

const KEYWORDS: &[&str] = &[
    "break", "case", "class", "const", "continue", "else", "export", "for", "function", "if",
    "import", "interface", "let", "new", "return", "switch", "this", "type", "typeof", "var",
    "void", "while",
];

/// Calls the service received, in order
pub type CallLog = Rc<RefCell<Vec<String>>>;

struct Declaration {
    file: String,
    name: String,
    name_span: TextRange,
    kind: CompletionItemKind,
    signature: String,
    doc: Option<String>,
}

struct Member {
    name: String,
    kind: CompletionItemKind,
    detail: String,
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Identifier run around `offset`, if any
fn word_at(text: &str, offset: usize) -> Option<TextRange> {
    let offset = offset.min(text.len());
    if !text.is_char_boundary(offset) {
        return None;
    }
    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident(*c))
        .last()
        .map_or(offset, |(i, _)| i);
    let end = text[offset..]
        .char_indices()
        .find(|(_, c)| !is_ident(*c))
        .map_or(text.len(), |(i, _)| offset + i);
    (end > start).then(|| TextRange::new(start, end))
}

/// Whole-word occurrences of `name`
fn occurrences(text: &str, name: &str) -> Vec<TextRange> {
    text.match_indices(name)
        .filter(|(start, _)| {
            let end = start + name.len();
            let before = text[..*start].chars().next_back();
            let after = text[end..].chars().next();
            !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
        })
        .map(|(start, _)| TextRange::new(start, start + name.len()))
        .collect()
}

fn doc_comment_before(text: &str, offset: usize) -> Option<String> {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let body = text[..line_start].trim_end().strip_suffix("*/")?;
    let start = body.rfind("/**")?;
    let lines: Vec<&str> = body[start + 3..]
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Splits on commas outside any brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Name of the call whose argument list contains `offset`, and the argument index
fn enclosing_call(text: &str, offset: usize) -> Option<(String, u32)> {
    let before = &text[..offset];
    let mut depth = 0usize;
    let mut commas = 0u32;
    for (i, c) in before.char_indices().rev() {
        match c {
            ')' | ']' | '}' => depth += 1,
            '(' | '[' | '{' if depth > 0 => depth -= 1,
            '(' => {
                let name_end = before[..i].trim_end().len();
                let name_start = before[..name_end]
                    .char_indices()
                    .rev()
                    .take_while(|(_, c)| is_ident(*c))
                    .last()
                    .map(|(j, _)| j)?;
                return Some((before[name_start..name_end].to_string(), commas));
            }
            '[' | '{' => return None,
            ';' if depth == 0 => return None,
            ',' if depth == 0 => commas += 1,
            _ => {}
        }
    }
    None
}

/// Top-level keys of the object literal assigned to `object`
fn object_members(text: &str, object: &str) -> Vec<Member> {
    let pattern = format!(
        r"\b(?:const|let|var)\s+{}\s*(?::[^=]*)?=\s*\{{",
        regex::escape(object)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let Some(found) = re.find(text) else {
        return Vec::new();
    };

    let body = &text[found.end()..];
    let chars: Vec<(usize, char)> = body.char_indices().collect();
    let mut members = Vec::new();
    let mut depth = 0usize;
    let mut expecting_key = true;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i].1;
        match c {
            '"' | '\'' | '`' => {
                i += 1;
                while i < chars.len() && chars[i].1 != c {
                    i += 1;
                }
            }
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' if depth == 0 => break,
            '}' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => expecting_key = true,
            c if depth == 0 && expecting_key && is_ident(c) => {
                let start = chars[i].0;
                let mut j = i;
                while j < chars.len() && is_ident(chars[j].1) {
                    j += 1;
                }
                let end = chars.get(j).map_or(body.len(), |(offset, _)| *offset);
                let name = &body[start..end];
                let next = chars[j..]
                    .iter()
                    .map(|(_, c)| *c)
                    .find(|c| !c.is_whitespace());
                let (kind, detail) = match next {
                    Some('(') => (
                        CompletionItemKind::METHOD,
                        format!("(method) {object}.{name}()"),
                    ),
                    _ => (
                        CompletionItemKind::PROPERTY,
                        format!("(property) {object}.{name}"),
                    ),
                };
                members.push(Member {
                    name: name.to_string(),
                    kind,
                    detail,
                });
                expecting_key = false;
                i = j;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    members
}

fn declaration_kind(keyword: &str) -> CompletionItemKind {
    match keyword {
        "const" => CompletionItemKind::CONSTANT,
        "function" => CompletionItemKind::FUNCTION,
        "class" => CompletionItemKind::CLASS,
        "interface" | "type" => CompletionItemKind::INTERFACE,
        "enum" => CompletionItemKind::ENUM,
        _ => CompletionItemKind::VARIABLE,
    }
}

fn default_commit_characters() -> Vec<String> {
    [".", ",", ";"].iter().map(|s| s.to_string()).collect()
}

/// Word-level stand-in for a real language server
pub struct MockLanguageService {
    encoding: PositionEncoding,
    documents: BTreeMap<String, String>,
    options: BTreeMap<String, String>,
    calls: CallLog,
}

impl Default for MockLanguageService {
    fn default() -> Self {
        Self::with_encoding(PositionEncoding::Utf8)
    }
}

impl MockLanguageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(encoding: PositionEncoding) -> Self {
        Self {
            encoding,
            documents: BTreeMap::new(),
            options: BTreeMap::new(),
            calls: CallLog::default(),
        }
    }

    /// Shared handle on the call log; stays readable after the service is boxed
    pub fn calls(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn text(&self, path: &str) -> Result<String> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| Error::service(format!("{path} was never opened")))
    }

    fn offset(&self, text: &str, position: Position) -> usize {
        LineMap::new(text).position_to_offset(
            text,
            LinePosition::new(position.line, position.character),
            self.encoding,
        )
    }

    fn range(&self, text: &str, span: TextRange) -> Range {
        let map = LineMap::new(text);
        let start = map.offset_to_position(text, span.start, self.encoding);
        let end = map.offset_to_position(text, span.end, self.encoding);
        Range::new(
            Position::new(start.line, start.character),
            Position::new(end.line, end.character),
        )
    }

    fn location(&self, file: &str, text: &str, span: TextRange) -> Result<Location> {
        Ok(Location {
            uri: path_to_uri(file)?,
            range: self.range(text, span),
        })
    }

    fn declarations(&self) -> Vec<Declaration> {
        let Some(re) = DECLARATION.as_ref() else {
            return Vec::new();
        };
        let mut declarations = Vec::new();
        for (file, text) in &self.documents {
            for caps in re.captures_iter(text) {
                let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let rest = &text[keyword.start()..];
                let end = rest
                    .find(|c| matches!(c, '{' | '=' | ';' | '\n'))
                    .unwrap_or(rest.len());
                declarations.push(Declaration {
                    file: file.clone(),
                    name: name.as_str().to_string(),
                    name_span: TextRange::new(name.start(), name.end()),
                    kind: declaration_kind(keyword.as_str()),
                    signature: rest[..end].trim().to_string(),
                    doc: doc_comment_before(text, keyword.start()),
                });
            }
        }
        declarations
    }

    /// Literal-type completions inside `f("|")`
    fn string_completions(&self, text: &str, offset: usize, prefix: &str) -> Option<CompletionListResult> {
        let caps = STRING_ARGUMENT.as_ref()?.captures(prefix)?;
        let function = caps.get(1)?.as_str();
        let partial = caps.get(2)?.as_str();

        let pattern = format!(r"function\s+{}\s*\(([^)]*)\)", regex::escape(function));
        let re = Regex::new(&pattern).ok()?;
        let params = self
            .documents
            .values()
            .find_map(|doc| re.captures(doc).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))?;

        let content_start = offset - partial.len();
        let content_end = text[offset..]
            .find(['"', '\n'])
            .filter(|i| text[offset + i..].starts_with('"'))
            .map_or(offset, |i| offset + i);
        let range = self.range(text, TextRange::new(content_start, content_end));

        let items = STRING_LITERAL
            .as_ref()?
            .captures_iter(&params)
            .filter_map(|c| c.get(1))
            .map(|literal| CompletionItem {
                label: literal.as_str().to_string(),
                kind: Some(CompletionItemKind::CONSTANT),
                sort_text: Some(LOCATION_PRIORITY.to_string()),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit::new(
                    range,
                    literal.as_str().to_string(),
                ))),
                ..Default::default()
            })
            .collect();

        Some(CompletionListResult {
            is_incomplete: false,
            item_defaults: Some(CompletionItemDefaults {
                commit_characters: Some(default_commit_characters()),
                ..Default::default()
            }),
            items,
        })
    }

    fn word_edit_range(&self, text: &str, offset: usize) -> DefaultEditRange {
        let start = text[..offset]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_ident(*c))
            .last()
            .map_or(offset, |(i, _)| i);
        let end = text[offset..]
            .char_indices()
            .find(|(_, c)| !is_ident(*c))
            .map_or(text.len(), |(i, _)| offset + i);
        let insert = self.range(text, TextRange::new(start, offset));
        if end == offset {
            DefaultEditRange::Range(insert)
        } else {
            DefaultEditRange::InsertReplace {
                insert,
                replace: self.range(text, TextRange::new(start, end)),
            }
        }
    }
}

impl LanguageService for MockLanguageService {
    fn position_encoding(&self) -> PositionEncoding {
        self.encoding
    }

    fn configure(&mut self, options: &BTreeMap<String, String>) -> Result<()> {
        let rendered: Vec<String> = options.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.record(format!("configure {}", rendered.join(",")));
        self.options = options.clone();
        Ok(())
    }

    fn did_open(&mut self, path: &str, language_id: &str, version: i32, text: &str) -> Result<()> {
        self.record(format!("didOpen {path} {language_id} v{version}"));
        self.documents.insert(path.to_string(), text.to_string());
        Ok(())
    }

    fn did_change(&mut self, path: &str, version: i32, range: Range, text: &str) -> Result<()> {
        self.record(format!("didChange {path} v{version}"));
        let mut content = self.text(path)?;
        let start = self.offset(&content, range.start);
        let end = self.offset(&content, range.end).max(start);
        content.replace_range(start..end, text);
        self.documents.insert(path.to_string(), content);
        Ok(())
    }

    fn completion(&mut self, path: &str, position: Position) -> Result<Option<CompletionListResult>> {
        self.record(format!("completion {path} {}:{}", position.line, position.character));
        let text = self.text(path)?;
        let offset = self.offset(&text, position);
        let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &text[line_start..offset];

        if let Some(list) = self.string_completions(&text, offset, prefix) {
            return Ok(Some(list));
        }

        let item_defaults = Some(CompletionItemDefaults {
            commit_characters: Some(default_commit_characters()),
            edit_range: Some(self.word_edit_range(&text, offset)),
            data: None,
        });

        let object = MEMBER_ACCESS
            .as_ref()
            .and_then(|re| re.captures(prefix))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        if let Some(object) = object {
            let Some(members) = self
                .documents
                .values()
                .map(|doc| object_members(doc, &object))
                .find(|members| !members.is_empty())
            else {
                return Ok(None);
            };
            let items = members
                .into_iter()
                .map(|member| CompletionItem {
                    label: member.name,
                    kind: Some(member.kind),
                    sort_text: Some(LOCATION_PRIORITY.to_string()),
                    data: Some(json!({ "detail": member.detail })),
                    ..Default::default()
                })
                .collect();
            return Ok(Some(CompletionListResult {
                is_incomplete: false,
                item_defaults,
                items,
            }));
        }

        let mut seen = BTreeSet::new();
        let mut items: Vec<CompletionItem> = self
            .declarations()
            .into_iter()
            .filter(|decl| decl.file == path && seen.insert(decl.name.clone()))
            .map(|decl| CompletionItem {
                label: decl.name,
                kind: Some(decl.kind),
                sort_text: Some(LOCATION_PRIORITY.to_string()),
                data: Some(json!({ "detail": decl.signature, "documentation": decl.doc })),
                ..Default::default()
            })
            .collect();
        items.extend(
            KEYWORDS
                .iter()
                .filter(|kw| !seen.contains(**kw))
                .map(|kw| CompletionItem {
                    label: kw.to_string(),
                    kind: Some(CompletionItemKind::KEYWORD),
                    sort_text: Some(GLOBALS_OR_KEYWORDS.to_string()),
                    ..Default::default()
                }),
        );

        Ok(Some(CompletionListResult {
            is_incomplete: false,
            item_defaults,
            items,
        }))
    }

    fn resolve_completion(&mut self, mut item: CompletionItem) -> Result<CompletionItem> {
        self.record(format!("resolve {}", item.label));
        if let Some(data) = item.data.as_ref() {
            if let Some(detail) = data.get("detail").and_then(Value::as_str) {
                item.detail = Some(detail.to_string());
            }
            if let Some(doc) = data.get("documentation").and_then(Value::as_str) {
                item.documentation = Some(Documentation::String(doc.to_string()));
            }
        }
        Ok(item)
    }

    fn hover(&mut self, path: &str, position: Position) -> Result<Option<Hover>> {
        self.record(format!("hover {path} {}:{}", position.line, position.character));
        let text = self.text(path)?;
        let offset = self.offset(&text, position);
        let Some(span) = word_at(&text, offset) else {
            return Ok(None);
        };
        let name = &text[span.start..span.end];
        let Some(decl) = self.declarations().into_iter().find(|d| d.name == name) else {
            return Ok(None);
        };

        let mut value = format!("```typescript\n{}\n```", decl.signature);
        if let Some(doc) = &decl.doc {
            value.push('\n');
            value.push_str(doc);
        }
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(self.range(&text, span)),
        }))
    }

    fn definition(&mut self, path: &str, position: Position) -> Result<Vec<Location>> {
        self.record(format!("definition {path} {}:{}", position.line, position.character));
        let text = self.text(path)?;
        let offset = self.offset(&text, position);
        let Some(span) = word_at(&text, offset) else {
            return Ok(Vec::new());
        };
        let name = &text[span.start..span.end];

        let mut locations = Vec::new();
        for decl in self.declarations().into_iter().filter(|d| d.name == name) {
            let file_text = self.text(&decl.file)?;
            locations.push(self.location(&decl.file, &file_text, decl.name_span)?);
        }
        Ok(locations)
    }

    fn references(
        &mut self,
        path: &str,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>> {
        self.record(format!(
            "references {path} {}:{} declaration={include_declaration}",
            position.line, position.character
        ));
        let text = self.text(path)?;
        let offset = self.offset(&text, position);
        let Some(span) = word_at(&text, offset) else {
            return Ok(Vec::new());
        };
        let name = text[span.start..span.end].to_string();
        let declared: Vec<(String, TextRange)> = self
            .declarations()
            .into_iter()
            .filter(|d| d.name == name)
            .map(|d| (d.file, d.name_span))
            .collect();

        let mut locations = Vec::new();
        for (file, file_text) in &self.documents {
            for occurrence in occurrences(file_text, &name) {
                let is_declaration = declared
                    .iter()
                    .any(|(f, s)| f == file && *s == occurrence);
                if is_declaration && !include_declaration {
                    continue;
                }
                locations.push(self.location(file, file_text, occurrence)?);
            }
        }
        Ok(locations)
    }

    fn signature_help(&mut self, path: &str, position: Position) -> Result<Option<SignatureHelp>> {
        self.record(format!("signatureHelp {path} {}:{}", position.line, position.character));
        let text = self.text(path)?;
        let offset = self.offset(&text, position);
        let Some((function, argument)) = enclosing_call(&text, offset) else {
            return Ok(None);
        };

        let pattern = format!(
            r"function\s+{}\s*\(([^)]*)\)\s*(?::\s*([^{{;\n]+))?",
            regex::escape(&function)
        );
        let Ok(re) = Regex::new(&pattern) else {
            return Ok(None);
        };
        let Some((caps, doc)) = self.documents.values().find_map(|doc| {
            re.captures(doc).map(|caps| {
                let start = caps.get(0).map_or(0, |m| m.start());
                (caps, doc_comment_before(doc, start))
            })
        }) else {
            return Ok(None);
        };

        let params = caps.get(1).map_or("", |m| m.as_str());
        let returns = caps.get(2).map_or("void", |m| m.as_str().trim());

        let mut label = format!("{function}(");
        let mut parameters = Vec::new();
        for (i, param) in split_top_level(params).into_iter().enumerate() {
            if i > 0 {
                label.push_str(", ");
            }
            let start = label.encode_utf16().count() as u32;
            label.push_str(param);
            let end = label.encode_utf16().count() as u32;
            parameters.push(ParameterInformation {
                label: ParameterLabel::LabelOffsets([start, end]),
                documentation: None,
            });
        }
        label.push_str(&format!("): {returns}"));

        Ok(Some(SignatureHelp {
            signatures: vec![SignatureInformation {
                label,
                documentation: doc.map(Documentation::String),
                parameters: Some(parameters),
                active_parameter: None,
            }],
            active_signature: Some(0),
            active_parameter: Some(argument),
        }))
    }

    fn shutdown(&mut self) -> Result<()> {
        self.record("shutdown".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open(text: &str) -> MockLanguageService {
        let mut service = MockLanguageService::new();
        service
            .did_open("/a.ts", "typescript", 1, text)
            .expect("open");
        service
    }

    fn at(text: &str, needle: &str) -> Position {
        let offset = text.find(needle).unwrap_or_default() + needle.len();
        let pos = LineMap::new(text).offset_to_position(text, offset, PositionEncoding::Utf8);
        Position::new(pos.line, pos.character)
    }

    fn labels(list: &CompletionListResult) -> Vec<&str> {
        list.items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_member_completions_from_object_literal() {
        let text = "const point = { x: 1, y: f(1, 2), norm() { return 0; } };\npoint.";
        let mut service = open(text);
        let list = service
            .completion("/a.ts", at(text, "point."))
            .expect("completion")
            .expect("list");
        assert_eq!(labels(&list), vec!["x", "y", "norm"]);
        assert_eq!(list.items[2].kind, Some(CompletionItemKind::METHOD));
    }

    #[test]
    fn test_string_literal_completions_carry_edits() {
        let text = "function f(p: \"alpha\" | \"beta\") {}\nf(\"al\");";
        let mut service = open(text);
        let list = service
            .completion("/a.ts", at(text, "f(\"al"))
            .expect("completion")
            .expect("list");
        assert_eq!(labels(&list), vec!["alpha", "beta"]);
        let Some(CompletionTextEdit::Edit(edit)) = &list.items[0].text_edit else {
            panic!("expected a plain text edit");
        };
        assert_eq!(edit.range, Range::new(Position::new(1, 3), Position::new(1, 5)));
    }

    #[test]
    fn test_global_completions_and_resolve() {
        let text = "/** Doubles n. */\nfunction twice(n: number) { return n * 2; }\n";
        let mut service = open(text);
        let list = service
            .completion("/a.ts", Position::new(2, 0))
            .expect("completion")
            .expect("list");
        assert_eq!(list.items[0].label, "twice");
        assert_eq!(list.items[0].sort_text.as_deref(), Some(LOCATION_PRIORITY));
        assert!(list.items.iter().any(|i| i.label == "return"));

        let resolved = service
            .resolve_completion(list.items[0].clone())
            .expect("resolve");
        assert_eq!(resolved.detail.as_deref(), Some("function twice(n: number)"));
        assert_eq!(
            resolved.documentation,
            Some(Documentation::String("Doubles n.".to_string()))
        );
    }

    #[test]
    fn test_did_change_applies_incremental_edit() {
        let mut service = open("let a = 1;\nlet b = 2;");
        service
            .did_change(
                "/a.ts",
                2,
                Range::new(Position::new(1, 4), Position::new(1, 5)),
                "bee",
            )
            .expect("change");
        assert_eq!(service.text("/a.ts").expect("text"), "let a = 1;\nlet bee = 2;");
        assert_eq!(
            service.calls().borrow().last().map(String::as_str),
            Some("didChange /a.ts v2")
        );
    }

    #[test]
    fn test_signature_help_counts_arguments() {
        let text = "function add(a: number, b: number): number { return a + b; }\nadd(1, ";
        let mut service = open(text);
        let help = service
            .signature_help("/a.ts", at(text, "add(1, "))
            .expect("signature help")
            .expect("help");
        assert_eq!(help.signatures[0].label, "add(a: number, b: number): number");
        assert_eq!(help.active_parameter, Some(1));
    }

    #[test]
    fn test_references_skip_declaration_on_request() {
        let text = "const value = 1;\nvalue + value;";
        let mut service = open(text);
        let all = service
            .references("/a.ts", Position::new(1, 0), true)
            .expect("references");
        assert_eq!(all.len(), 3);
        let uses = service
            .references("/a.ts", Position::new(1, 0), false)
            .expect("references");
        assert_eq!(uses.len(), 2);
    }

    #[test]
    fn test_enclosing_call() {
        assert_eq!(enclosing_call("f(a, g(b, c), ", 14), Some(("f".to_string(), 2)));
        assert_eq!(enclosing_call("x; y", 4), None);
        assert_eq!(enclosing_call("function f() { g", 16), None);
    }
}
