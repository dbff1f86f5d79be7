//! Location results written into the file text they point at

use markcheck_core::{LineMap, TextRange};
use markcheck_service::LocationSpan;
use tracing::trace;

/// Lines kept on each side of a line carrying an annotation
const CONTEXT_LINES: usize = 4;

const SPAN_OPEN: &str = "[|";
const SPAN_CLOSE: &str = "|]";

/// A file as the session currently sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFile<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

/// Renders one query's locations
///
/// Files are written in `files` order, each result span wrapped in `[|…|]`.
/// The queried position is written as `marker_label`; its file is always
/// printed, after the others when no result falls into it. Results in files
/// the session does not know are skipped.
pub fn render_locations(
    files: &[SourceFile<'_>],
    marker_file: &str,
    marker_offset: usize,
    marker_label: &str,
    locations: &[LocationSpan],
) -> String {
    for location in locations {
        if location.span.is_none() || !files.iter().any(|f| f.path == location.file) {
            trace!(file = %location.file, "Skipping location outside the session");
        }
    }

    let mut blocks = Vec::new();
    let mut marker_written = false;
    for file in files {
        let spans: Vec<TextRange> = locations
            .iter()
            .filter(|loc| loc.file == file.path)
            .filter_map(|loc| loc.span)
            .collect();
        if spans.is_empty() {
            continue;
        }
        let marker = (file.path == marker_file).then_some(marker_offset);
        marker_written |= marker.is_some();
        blocks.push(render_file(file, &spans, marker, marker_label));
    }
    if !marker_written {
        if let Some(file) = files.iter().find(|f| f.path == marker_file) {
            blocks.push(render_file(file, &[], Some(marker_offset), marker_label));
        }
    }
    blocks.join("\n\n")
}

fn render_file(
    file: &SourceFile<'_>,
    spans: &[TextRange],
    marker: Option<usize>,
    marker_label: &str,
) -> String {
    let content = file.content;
    let mut sorted = spans.to_vec();
    sorted.sort();

    let mut details: Vec<(usize, &str)> = Vec::with_capacity(sorted.len() * 2 + 1);
    for span in &sorted {
        details.push((span.start.min(content.len()), SPAN_OPEN));
        details.push((span.end.min(content.len()), SPAN_CLOSE));
    }
    details.sort_by_key(|(offset, _)| *offset);
    if let Some(offset) = marker {
        let offset = offset.min(content.len());
        // after every token at the same offset
        let at = details.partition_point(|(o, _)| *o <= offset);
        details.insert(at, (offset, marker_label));
    }

    let line_map = LineMap::new(content);
    let line_count = line_map.line_count();
    let mut per_line: Vec<Vec<(usize, &str)>> = vec![Vec::new(); line_count];
    for &(offset, token) in &details {
        per_line[line_map.line_of(offset)].push((offset, token));
    }

    let mut keep = vec![false; line_count];
    for (line, tokens) in per_line.iter().enumerate() {
        if tokens.is_empty() {
            continue;
        }
        let last = (line + CONTEXT_LINES).min(line_count - 1);
        for kept in &mut keep[line.saturating_sub(CONTEXT_LINES)..=last] {
            *kept = true;
        }
    }

    let mut out = vec![format!("// === {} ===", file.path)];
    let mut line = 0;
    while line < line_count {
        if !keep[line] {
            let first = line;
            while line < line_count && !keep[line] {
                line += 1;
            }
            out.push(format!("// --- (line: {}) skipped ---", first + 1));
            continue;
        }
        let Some(span) = line_map.line_span(content, line) else {
            break;
        };
        let mut text = String::new();
        let mut cursor = span.start;
        for &(offset, token) in &per_line[line] {
            let at = offset.clamp(cursor, span.end);
            text.push_str(&content[cursor..at]);
            text.push_str(token);
            cursor = at;
        }
        text.push_str(&content[cursor..span.end]);
        out.push(format!("// {text}"));
        line += 1;
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use markcheck_core::LinePosition;
    use pretty_assertions::assert_eq;

    fn location(file: &str, start: usize, end: usize) -> LocationSpan {
        LocationSpan {
            file: file.to_string(),
            span: Some(TextRange::new(start, end)),
            start: LinePosition::new(0, 0),
            end: LinePosition::new(0, 0),
        }
    }

    #[test]
    fn test_marker_inside_span_at_same_offset() {
        let content = "const x = 1;\nx;";
        let files = [SourceFile {
            path: "/a.ts",
            content,
        }];
        let rendered = render_locations(
            &files,
            "/a.ts",
            6,
            "/*FIND ALL REFS*/",
            &[location("/a.ts", 6, 7), location("/a.ts", 13, 14)],
        );
        assert_eq!(
            rendered,
            "// === /a.ts ===\n// const [|/*FIND ALL REFS*/x|] = 1;\n// [|x|];"
        );
    }

    #[test]
    fn test_marker_file_without_results_comes_last() {
        let files = [
            SourceFile {
                path: "/a.ts",
                content: "export const x = 1;",
            },
            SourceFile {
                path: "/b.ts",
                content: "import { x } from './a';\nx;",
            },
        ];
        let rendered = render_locations(
            &files,
            "/b.ts",
            25,
            "/*GO TO DEFINITION*/",
            &[location("/a.ts", 13, 14), location("/c.ts", 0, 1)],
        );
        assert_eq!(
            rendered,
            "// === /a.ts ===\n// export const [|x|] = 1;\n\n\
             // === /b.ts ===\n// import { x } from './a';\n// /*GO TO DEFINITION*/x;"
        );
    }

    #[test]
    fn test_distant_lines_are_elided() {
        let content: String = (1..=20).map(|i| format!("line{i}\n")).collect();
        let target = content.find("line15").unwrap_or_default();
        let files = [SourceFile {
            path: "/a.ts",
            content: &content,
        }];
        let rendered = render_locations(
            &files,
            "/a.ts",
            0,
            "/*M*/",
            &[location("/a.ts", target, target + 6)],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "// /*M*/line1");
        assert_eq!(lines[5], "// line5");
        assert_eq!(lines[6], "// --- (line: 6) skipped ---");
        assert_eq!(lines[7], "// line11");
        assert!(rendered.contains("// [|line15|]\n"));
        assert_eq!(lines.last().copied(), Some("// --- (line: 20) skipped ---"));
    }
}
