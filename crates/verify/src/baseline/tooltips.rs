//! Hover and signature-help results drawn as boxes under the queried line

use super::locations::SourceFile;
use markcheck_core::{Error, LineMap, LinePosition, Result, TextRange};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const BAR_WIDTH: usize = 70;

/// One queried marker and what the service said about it
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipEntry {
    pub file: String,
    pub offset: usize,
    pub marker_name: String,
    /// Position of the marker as sent to the service
    pub position: LinePosition,
    /// Span to underline; one character at the marker when absent
    pub underline: Option<TextRange>,
    /// Tooltip text, one entry per line; empty when there was no result
    pub lines: Vec<String>,
    /// The normalized result, for the JSON dump
    pub item: Value,
}

fn split_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Character column of `offset` on `line`
fn column(content: &str, line_start: usize, offset: usize) -> usize {
    content
        .get(line_start..offset)
        .map_or(offset - line_start, |prefix| prefix.chars().count())
}

/// Draws every entry into a copy of its file and appends a JSON dump
///
/// Files come out in path order. Within a file the entries are inserted
/// bottom-up, so several markers on one line each get their own box under
/// it. `op_name` fills the placeholder shown when a marker had no result.
pub fn render_tooltips(
    files: &[SourceFile<'_>],
    entries: &[TooltipEntry],
    op_name: &str,
) -> Result<String> {
    let bar = format!("| {}", "-".repeat(BAR_WIDTH));
    let mut sorted: Vec<&TooltipEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.file.cmp(&b.file).then(b.offset.cmp(&a.offset)));

    let mut file_lines: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for entry in sorted {
        let file = files
            .iter()
            .find(|f| f.path == entry.file)
            .ok_or_else(|| Error::navigation(format!("File '{}' is not part of the project", entry.file)))?;
        let content = file.content;
        let line_map = LineMap::new(content);

        let range = entry.underline.unwrap_or_else(|| {
            let width = content
                .get(entry.offset..)
                .and_then(|rest| rest.chars().next())
                .map_or(1, char::len_utf8);
            TextRange::new(entry.offset, (entry.offset + width).min(content.len().max(entry.offset)))
        });
        let line = line_map.line_of(range.start);
        if line_map.line_of(range.end) != line && range.end > range.start {
            return Err(Error::assertion(format!(
                "Expected tooltip range {range} at /*{}*/ to be on a single line",
                entry.marker_name
            )));
        }
        let line_start = line_map.line_starts()[line];
        let start_column = column(content, line_start, range.start);
        let end_column = column(content, line_start, range.end).max(start_column + 1);
        let underline = format!(
            "{}{}",
            " ".repeat(start_column),
            "^".repeat(end_column - start_column)
        );

        let tooltip: Vec<String> = if entry.lines.is_empty() {
            vec![format!("No {op_name} at /*{}*/.", entry.marker_name)]
        } else {
            entry.lines.clone()
        };
        let mut inserted = Vec::with_capacity(tooltip.len() + 3);
        inserted.push(underline);
        inserted.push(bar.clone());
        inserted.extend(tooltip.into_iter().map(|l| format!("| {l}")));
        inserted.push(bar.clone());

        let lines = file_lines
            .entry(file.path)
            .or_insert_with(|| split_lines(content));
        let at = (line + 1).min(lines.len());
        lines.splice(at..at, inserted);
    }

    let mut blocks = Vec::with_capacity(file_lines.len());
    for (path, lines) in &file_lines {
        let mut block = format!("=== {path} ===\n");
        for line in lines {
            block.push_str("// ");
            block.push_str(line);
            block.push('\n');
        }
        blocks.push(block);
    }

    let dump: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "marker": {
                    "fileName": entry.file,
                    "position": entry.offset,
                    "name": entry.marker_name,
                    "LSPosition": {
                        "line": entry.position.line,
                        "character": entry.position.character,
                    },
                },
                "item": entry.item,
            })
        })
        .collect();
    let dump = serde_json::to_string_pretty(&dump)
        .map_err(|e| Error::with_context("serializing tooltip results", e))?;

    Ok(format!("{}\n\n{dump}", blocks.join("\n\n")))
}
