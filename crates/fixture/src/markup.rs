//! Lexical scanner for point markers, ranges and metadata blocks
//!
//! The scanner knows nothing about the analyzed language. It recognizes
//! `/*name*/`, `[|`, `|]`, `{|` and `|}` purely by character pairs and keeps
//! a cumulative count of stripped bytes so every recorded offset is already
//! in the coordinate space of the annotation-free output.

use crate::model::{Marker, MarkerData, RangeMarker};
use markcheck_core::{Error, Result, TextRange};
use serde_json::Value;

/// Stripped content of one file plus the annotations found in it
#[derive(Debug)]
pub(crate) struct ScannedFile {
    pub content: String,
    pub markers: Vec<Marker>,
    /// 1-based line and column of each marker in the raw text, parallel to `markers`
    pub marker_locations: Vec<(usize, usize)>,
    pub ranges: Vec<RangeMarker>,
}

#[derive(Debug, Clone, Copy)]
struct Location {
    /// Offset in stripped output
    position: usize,
    /// Byte index of the annotation in the raw text
    source: usize,
    line: usize,
    column: usize,
}

#[derive(Debug)]
struct OpenRange {
    location: Location,
    /// Index into the markers collected so far
    tag: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    InSlashStar,
    InMetadata,
}

fn is_marker_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '$' || c == '_'
}

struct Scanner<'a> {
    file: &'a str,
    raw: &'a str,
    output: String,
    markers: Vec<Marker>,
    marker_locations: Vec<(usize, usize)>,
    open_ranges: Vec<OpenRange>,
    ranges: Vec<RangeMarker>,
    difference: usize,
    last_flushed: usize,
}

impl Scanner<'_> {
    fn flush(&mut self, until: usize) {
        if until > self.last_flushed {
            self.output.push_str(&self.raw[self.last_flushed..until]);
        }
    }

    fn error(&self, location: Location, message: impl Into<String>) -> Error {
        Error::fixture_parse(self.file, location.line, location.column, message)
    }

    fn push_marker(&mut self, marker: Marker, at: Location) {
        self.markers.push(marker);
        self.marker_locations.push((at.line, at.column));
        if let Some(open) = self.open_ranges.last_mut() {
            open.tag = Some(self.markers.len() - 1);
        }
    }

    fn close_range(&mut self, end: usize, at: Location) -> Result<()> {
        let Some(open) = self.open_ranges.pop() else {
            return Err(self.error(at, "Found range end with no matching start."));
        };
        let (name, data) = match open.tag.map(|i| &self.markers[i]) {
            Some(marker) => (marker.name.clone(), marker.data.clone()),
            None => (None, None),
        };
        self.ranges.push(RangeMarker {
            name,
            file: self.file.to_string(),
            range: TextRange::new(open.location.position, end),
            data,
        });
        Ok(())
    }

    fn metadata_marker(&self, location: Location, text: &str) -> Result<Marker> {
        let value: Value = serde_json::from_str(&format!("{{ {text} }}"))
            .map_err(|_| self.error(location, format!("Unable to parse marker text {text}")))?;
        let data: MarkerData = match value {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(self.error(location, "Object markers can not be empty")),
        };
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Ok(Marker {
            name,
            file: self.file.to_string(),
            offset: location.position,
            data: Some(data),
        })
    }
}

/// Strips annotations from one file's raw text
///
/// Line and column in errors are 1-based and relative to `raw`.
pub(crate) fn scan_file(file: &str, raw: &str) -> Result<ScannedFile> {
    let mut scanner = Scanner {
        file,
        raw,
        output: String::with_capacity(raw.len()),
        markers: Vec::new(),
        marker_locations: Vec::new(),
        open_ranges: Vec::new(),
        ranges: Vec::new(),
        difference: 0,
        last_flushed: 0,
    };

    let bytes = raw.as_bytes();
    let mut state = State::Text;
    let mut open_marker: Option<Location> = None;
    // Previous character for two-character tokens. Range bars stay visible
    // so `[|]` reads as an empty range; marker delimiters are cleared.
    let mut previous: Option<char> = None;
    let mut last_char: Option<char> = None;
    let mut line: usize = 1;
    let mut column: usize = 1;

    for (i, current) in raw.char_indices() {
        // All tokens are two ASCII characters, so the first one starts at i - 1.
        // Range and metadata errors point at the second character.
        let token_start = Location {
            position: i.saturating_sub(1).saturating_sub(scanner.difference),
            source: i.saturating_sub(1),
            line,
            column,
        };
        let mut consumed = false;

        match state {
            State::Text => match (previous, current) {
                (Some('['), '|') => {
                    scanner.open_ranges.push(OpenRange {
                        location: token_start,
                        tag: None,
                    });
                    scanner.flush(i - 1);
                    scanner.last_flushed = i + 1;
                    scanner.difference += 2;
                }
                (Some('|'), ']') => {
                    // `[|]` shares its bar with the opening token
                    let shared = i - 1 < scanner.last_flushed;
                    let end = if shared {
                        token_start.position + 1
                    } else {
                        token_start.position
                    };
                    scanner.close_range(end, token_start)?;
                    scanner.flush(i - 1);
                    scanner.last_flushed = i + 1;
                    scanner.difference += if shared { 1 } else { 2 };
                }
                (Some('/'), '*') => {
                    state = State::InSlashStar;
                    open_marker = Some(Location {
                        column: column.saturating_sub(1).max(1),
                        ..token_start
                    });
                    consumed = true;
                }
                (Some('{'), '|') => {
                    state = State::InMetadata;
                    open_marker = Some(token_start);
                    scanner.flush(i - 1);
                    consumed = true;
                }
                _ => {}
            },
            State::InMetadata => {
                if let (Some('|'), '}', Some(start)) = (previous, current, open_marker) {
                    let text = raw[start.source + 2..i - 1].trim();
                    let marker = scanner.metadata_marker(start, text)?;
                    scanner.push_marker(marker, start);

                    scanner.last_flushed = i + 1;
                    scanner.difference += i + 1 - start.source;
                    open_marker = None;
                    state = State::Text;
                    consumed = true;
                }
            }
            State::InSlashStar => {
                if let (Some('*'), '/', Some(start)) = (previous, current, open_marker) {
                    let name = raw[start.source + 2..i - 1].trim();
                    let marker = Marker {
                        name: (!name.is_empty()).then(|| name.to_string()),
                        file: file.to_string(),
                        offset: start.position,
                        data: None,
                    };
                    scanner.push_marker(marker, start);

                    scanner.flush(start.source);
                    scanner.last_flushed = i + 1;
                    scanner.difference += i + 1 - start.source;
                    open_marker = None;
                    state = State::Text;
                    consumed = true;
                } else if !is_marker_name_char(current) {
                    let closing_next = current == '*' && bytes.get(i + 1) == Some(&b'/');
                    if !closing_next {
                        // An ordinary block comment: its text stays in the output
                        scanner.flush(i);
                        scanner.last_flushed = i;
                        open_marker = None;
                        state = State::Text;
                    }
                }
            }
        }

        match (last_char, current) {
            (Some('\r'), '\n') => {}
            (_, '\n') | (_, '\r') => {
                line += 1;
                column = 1;
            }
            _ => column += 1,
        }
        last_char = Some(current);
        previous = if consumed { None } else { Some(current) };
    }

    scanner.flush(raw.len());

    if let Some(open) = scanner.open_ranges.first() {
        return Err(scanner.error(open.location, "Unterminated range."));
    }
    if let Some(start) = open_marker {
        return Err(scanner.error(start, "Unterminated marker."));
    }

    Ok(ScannedFile {
        content: scanner.output,
        markers: scanner.markers,
        marker_locations: scanner.marker_locations,
        ranges: scanner.ranges,
    })
}
