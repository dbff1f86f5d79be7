//! Per-test store of open documents

use lsp_types::{Position, Range};
use markcheck_core::{Error, LineMap, LinePosition, PositionEncoding, Result, TextRange};
use std::collections::BTreeMap;

/// Current text of one open file
#[derive(Debug, Clone)]
pub struct Document {
    content: String,
    line_map: LineMap,
    version: i32,
}

impl Document {
    fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            line_map: LineMap::new(content),
            version: 1,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn position(&self, offset: usize, encoding: PositionEncoding) -> Position {
        let pos = self
            .line_map
            .offset_to_position(&self.content, offset, encoding);
        Position::new(pos.line, pos.character)
    }

    pub fn offset(&self, position: Position, encoding: PositionEncoding) -> usize {
        self.line_map.position_to_offset(
            &self.content,
            LinePosition::new(position.line, position.character),
            encoding,
        )
    }

    pub fn range(&self, span: TextRange, encoding: PositionEncoding) -> Range {
        Range::new(
            self.position(span.start, encoding),
            self.position(span.end, encoding),
        )
    }

    pub fn span(&self, range: Range, encoding: PositionEncoding) -> TextRange {
        let start = self.offset(range.start, encoding);
        let end = self.offset(range.end, encoding).max(start);
        TextRange::new(start, end)
    }
}

/// Documents keyed by normalized absolute path
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: BTreeMap<String, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path`; returns false if it was already open
    pub fn open(&mut self, path: &str, content: &str) -> bool {
        if self.documents.contains_key(path) {
            return false;
        }
        self.documents
            .insert(path.to_string(), Document::new(content));
        true
    }

    pub fn get(&self, path: &str) -> Option<&Document> {
        self.documents.get(path)
    }

    pub fn require(&self, path: &str) -> Result<&Document> {
        self.get(path)
            .ok_or_else(|| Error::navigation(format!("File {path} is not part of the project")))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Replaces `span` with `new_text` and bumps the version
    ///
    /// Returns the edited range in pre-edit protocol coordinates together
    /// with the new version.
    pub fn apply_edit(
        &mut self,
        path: &str,
        span: TextRange,
        new_text: &str,
        encoding: PositionEncoding,
    ) -> Result<(Range, i32)> {
        let document = self
            .documents
            .get_mut(path)
            .ok_or_else(|| Error::navigation(format!("File {path} is not part of the project")))?;

        if span.end > document.content.len()
            || !document.content.is_char_boundary(span.start)
            || !document.content.is_char_boundary(span.end)
        {
            return Err(Error::navigation(format!(
                "Edit range {span} is outside {path} (length {})",
                document.content.len()
            )));
        }

        let range = document.range(span, encoding);
        document
            .content
            .replace_range(span.start..span.end, new_text);
        document.line_map = LineMap::new(&document.content);
        document.version += 1;
        Ok((range, document.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_edit_reports_pre_edit_range() {
        let mut store = DocumentStore::new();
        assert!(store.open("/a.ts", "ab\ncd"));
        assert!(!store.open("/a.ts", "ignored"));

        let (range, version) = store
            .apply_edit("/a.ts", TextRange::new(3, 4), "XY\n", PositionEncoding::Utf8)
            .expect("edit");
        assert_eq!(range, Range::new(Position::new(1, 0), Position::new(1, 1)));
        assert_eq!(version, 2);

        let doc = store.get("/a.ts").expect("document");
        assert_eq!(doc.content(), "ab\nXY\nd");
        assert_eq!(doc.line_map().line_count(), 3);
    }

    #[test]
    fn test_apply_edit_rejects_out_of_bounds() {
        let mut store = DocumentStore::new();
        store.open("/a.ts", "abc");
        let err = store
            .apply_edit("/a.ts", TextRange::new(2, 9), "", PositionEncoding::Utf8)
            .unwrap_err();
        assert_eq!(err.kind(), "NavigationError");
    }

    #[test]
    fn test_span_round_trip_utf16() {
        let mut store = DocumentStore::new();
        store.open("/a.ts", "// ü\nlet 𝒳 = 1;");
        let doc = store.get("/a.ts").expect("document");
        let span = TextRange::new(doc.content().find('𝒳').unwrap_or(0), doc.content().len());
        let range = doc.range(span, PositionEncoding::Utf16);
        assert_eq!(range.start, Position::new(1, 4));
        assert_eq!(doc.span(range, PositionEncoding::Utf16), span);
    }
}
