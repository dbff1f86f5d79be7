//! Text coordinates
//!
//! Everything inside markcheck addresses text by byte offset into the
//! annotation-stripped content of a file. The analysis service speaks in
//! zero-based line/character pairs whose character unit depends on the
//! negotiated [`PositionEncoding`]. [`LineMap`] converts between the two.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open byte span `[start, end)` within one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end >= start, "range end before start");
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// Zero-based line and character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinePosition {
    pub line: u32,
    pub character: u32,
}

impl LinePosition {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for LinePosition {
    // Rendered 1-based, the way editors show it
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line + 1, self.character + 1)
    }
}

/// Unit in which `LinePosition::character` is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "utf-16", alias = "utf16")]
    Utf16,
    #[serde(rename = "utf-32", alias = "utf32")]
    Utf32,
}

impl PositionEncoding {
    /// Parses the protocol spelling (`utf-8`, `utf-16`, `utf-32`)
    pub fn from_protocol(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "utf-16" | "utf16" => Some(Self::Utf16),
            "utf-32" | "utf32" => Some(Self::Utf32),
            _ => None,
        }
    }

    pub fn as_protocol(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf32 => "utf-32",
        }
    }

    fn width(&self, ch: char) -> usize {
        match self {
            Self::Utf8 => ch.len_utf8(),
            Self::Utf16 => ch.len_utf16(),
            Self::Utf32 => 1,
        }
    }
}

/// Byte offsets at which each line of a text starts
///
/// `\n`, `\r\n` and a lone `\r` all terminate a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                b'\n' => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Index of the line containing `offset` (offsets past the end map to the last line)
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// Byte span of line `index`, excluding its terminator
    pub fn line_span(&self, text: &str, index: usize) -> Option<TextRange> {
        let start = *self.line_starts.get(index)?;
        let mut end = self.line_starts.get(index + 1).copied().unwrap_or(self.len);
        let bytes = text.as_bytes();
        if end > start && bytes.get(end - 1) == Some(&b'\n') {
            end -= 1;
        }
        if end > start && bytes.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some(TextRange::new(start, end))
    }

    pub fn offset_to_position(
        &self,
        text: &str,
        offset: usize,
        encoding: PositionEncoding,
    ) -> LinePosition {
        let offset = offset.min(text.len());
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        let character: usize = text
            .get(start..offset)
            .map(|prefix| prefix.chars().map(|c| encoding.width(c)).sum())
            .unwrap_or(offset - start);
        LinePosition::new(line as u32, character as u32)
    }

    /// Converts a position back to a byte offset
    ///
    /// Characters past the end of a line clamp to the line end; lines past
    /// the end of the text clamp to the text length.
    pub fn position_to_offset(
        &self,
        text: &str,
        position: LinePosition,
        encoding: PositionEncoding,
    ) -> usize {
        let Some(span) = self.line_span(text, position.line as usize) else {
            return text.len();
        };
        let wanted = position.character as usize;
        let mut units = 0;
        for (idx, ch) in text[span.start..span.end].char_indices() {
            if units >= wanted {
                return span.start + idx;
            }
            units += encoding.width(ch);
        }
        span.end
    }
}
