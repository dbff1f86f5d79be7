//! Editing session over one test's virtual project
//!
//! A [`Session`] is the only handle a test body gets on its project. It
//! tracks the active file, the cursor and an optional selection, and keeps
//! every marker and range in step with the edits it forwards to the service.

use markcheck_core::{Error, LineMap, Result, TextRange};
use markcheck_fixture::{Fixture, Marker, RangeMarker};
use markcheck_service::ServiceAdapter;
use markcheck_verify::BaselineStore;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// New position of `offset` after `[start, end)` was replaced by `inserted` bytes
pub fn shift_offset(offset: usize, start: usize, end: usize, inserted: usize) -> usize {
    if offset < start {
        offset
    } else if start == end {
        offset + inserted
    } else if offset >= end {
        offset - (end - start) + inserted
    } else {
        start
    }
}

pub struct Session {
    test_name: String,
    pub(crate) adapter: ServiceAdapter,
    files: Vec<String>,
    markers: Vec<Marker>,
    marker_index: HashMap<String, usize>,
    ranges: Vec<RangeMarker>,
    active_file: String,
    cursor: usize,
    selection_end: Option<usize>,
    pub(crate) baselines: BaselineStore,
    pub(crate) baseline_in_progress: bool,
    options: BTreeMap<String, String>,
}

impl Session {
    pub(crate) fn new(
        fixture: Fixture,
        adapter: ServiceAdapter,
        baselines: BaselineStore,
        options: BTreeMap<String, String>,
    ) -> Self {
        let files: Vec<String> = fixture.files().iter().map(|f| f.path.clone()).collect();
        let markers = fixture.markers().to_vec();
        let marker_index = markers
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.name.clone().map(|name| (name, i)))
            .collect();
        Self {
            test_name: fixture.name().to_string(),
            adapter,
            active_file: files.first().cloned().unwrap_or_default(),
            files,
            markers,
            marker_index,
            ranges: fixture.ranges().to_vec(),
            cursor: 0,
            selection_end: None,
            baselines,
            baseline_in_progress: false,
            options,
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Global options the service was configured with
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn adapter(&self) -> &ServiceAdapter {
        &self.adapter
    }

    pub fn baselines(&self) -> &BaselineStore {
        &self.baselines
    }

    // Navigation

    pub fn go_to_marker(&mut self, name: &str) -> Result<()> {
        let marker = self.marker(name)?.clone();
        self.go_to_marker_ref(&marker);
        Ok(())
    }

    /// Moves to the `index`th marker in fixture order, named or not
    pub fn go_to_marker_at(&mut self, index: usize) -> Result<()> {
        let marker = self
            .markers
            .get(index)
            .cloned()
            .ok_or_else(|| Error::navigation(format!("Marker index {index} out of range.")))?;
        self.go_to_marker_ref(&marker);
        Ok(())
    }

    pub(crate) fn go_to_marker_ref(&mut self, marker: &Marker) {
        trace!(marker = %marker.label(), file = %marker.file, offset = marker.offset, "goTo marker");
        self.active_file = marker.file.clone();
        self.cursor = marker.offset;
        self.selection_end = None;
    }

    pub fn go_to_range_start(&mut self, range: &RangeMarker) -> Result<()> {
        self.require_file(&range.file)?;
        self.active_file = range.file.clone();
        self.cursor = range.range.start;
        self.selection_end = None;
        Ok(())
    }

    pub fn go_to_position(&mut self, offset: usize) -> Result<()> {
        let content = self.active_content()?;
        if offset > content.len() {
            return Err(Error::navigation(format!(
                "Position {offset} is past the end of {} (length {}).",
                self.active_file,
                content.len()
            )));
        }
        if !content.is_char_boundary(offset) {
            return Err(Error::navigation(format!(
                "Position {offset} in {} is inside a character.",
                self.active_file
            )));
        }
        self.cursor = offset;
        self.selection_end = None;
        Ok(())
    }

    pub fn go_to_bof(&mut self) -> Result<()> {
        self.go_to_position(0)
    }

    pub fn go_to_eof(&mut self) -> Result<()> {
        let len = self.active_content()?.len();
        self.go_to_position(len)
    }

    pub fn go_to_file(&mut self, path: &str) -> Result<()> {
        self.require_file(path)?;
        debug!(file = path, "Switching active file");
        self.active_file = path.to_string();
        self.cursor = 0;
        self.selection_end = None;
        Ok(())
    }

    pub fn go_to_file_number(&mut self, index: usize) -> Result<()> {
        let path = self
            .files
            .get(index)
            .cloned()
            .ok_or_else(|| Error::navigation(format!("File index {index} out of range.")))?;
        self.go_to_file(&path)
    }

    /// Selects from one marker to another; both must be in the same file
    pub fn go_to_select(&mut self, start_marker: &str, end_marker: &str) -> Result<()> {
        let start = self.marker(start_marker)?.clone();
        let end = self.marker(end_marker)?.clone();
        if start.file != end.file {
            return Err(Error::navigation(format!(
                "Markers '{start_marker}' and '{end_marker}' are in different files."
            )));
        }
        self.select(&start.file, start.offset, end.offset)
    }

    pub fn go_to_select_range(&mut self, range: &RangeMarker) -> Result<()> {
        self.require_file(&range.file)?;
        self.select(&range.file, range.range.start, range.range.end)
    }

    /// Selects line `index` of the active file, without its line terminator
    pub fn select_line(&mut self, index: usize) -> Result<()> {
        let content = self.active_content()?;
        let span = LineMap::new(content).line_span(content, index).ok_or_else(|| {
            Error::navigation(format!(
                "Line {index} is out of range in {}.",
                self.active_file
            ))
        })?;
        let file = self.active_file.clone();
        self.select(&file, span.start, span.end)
    }

    fn select(&mut self, file: &str, start: usize, end: usize) -> Result<()> {
        if end < start {
            return Err(Error::navigation(format!(
                "Selection end {end} is before its start {start}."
            )));
        }
        self.active_file = file.to_string();
        self.cursor = start;
        self.selection_end = Some(end);
        Ok(())
    }

    // Editing

    /// Replaces the selection (if any) with `text` and moves past it
    pub fn insert(&mut self, text: &str) -> Result<()> {
        let start = self.cursor;
        let end = self.selection_end.take().unwrap_or(start);
        self.edit(start, end, text)?;
        self.cursor = start + text.len();
        Ok(())
    }

    pub fn insert_line(&mut self, text: &str) -> Result<()> {
        self.insert(&format!("{text}\n"))
    }

    /// Inserts `text` at the cursor and leaves the cursor where it was
    pub fn paste(&mut self, text: &str) -> Result<()> {
        let start = self.cursor;
        let end = self.selection_end.take().unwrap_or(start);
        self.edit(start, end, text)?;
        self.cursor = start;
        Ok(())
    }

    /// Replaces `length` bytes at `start` in the active file
    pub fn replace(&mut self, start: usize, length: usize, text: &str) -> Result<()> {
        let end = start + length;
        self.edit(start, end, text)?;
        self.cursor = shift_offset(self.cursor, start, end, text.len());
        self.selection_end = None;
        Ok(())
    }

    pub fn replace_line(&mut self, index: usize, text: &str) -> Result<()> {
        self.select_line(index)?;
        self.insert(text)
    }

    /// Deletes `count` characters before the cursor
    pub fn backspace(&mut self, count: usize) -> Result<()> {
        let end = self.cursor;
        let content = self.active_content()?;
        let before = content.get(..end).unwrap_or_default();
        let start = match count {
            0 => end,
            n => before
                .char_indices()
                .rev()
                .nth(n - 1)
                .map(|(i, _)| i)
                .ok_or_else(|| {
                    Error::navigation(format!(
                        "Cannot delete {count} characters before offset {end} in {}.",
                        self.active_file
                    ))
                })?,
        };
        self.selection_end = None;
        self.edit(start, end, "")?;
        self.cursor = start;
        Ok(())
    }

    fn edit(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        let file = self.active_file.clone();
        let len = self.active_content()?.len();
        if end > len {
            return Err(Error::navigation(format!(
                "Edit end {end} is past the end of {file} (length {len})."
            )));
        }
        self.adapter.apply_edit(&file, start, end, text)?;

        let inserted = text.len();
        for marker in self.markers.iter_mut().filter(|m| m.file == file) {
            marker.offset = shift_offset(marker.offset, start, end, inserted);
        }
        for range in self.ranges.iter_mut().filter(|r| r.file == file) {
            range.range = TextRange::new(
                shift_offset(range.range.start, start, end, inserted),
                shift_offset(range.range.end, start, end, inserted),
            );
        }
        Ok(())
    }

    // Projections

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn ranges(&self) -> &[RangeMarker] {
        &self.ranges
    }

    pub fn marker_names(&self) -> Vec<&str> {
        self.markers.iter().filter_map(|m| m.name.as_deref()).collect()
    }

    pub fn marker(&self, name: &str) -> Result<&Marker> {
        self.marker_index
            .get(name)
            .and_then(|&i| self.markers.get(i))
            .ok_or_else(|| Error::navigation(format!("Marker '{name}' not found.")))
    }

    pub fn ranges_in_file(&self, path: &str) -> Vec<&RangeMarker> {
        self.ranges.iter().filter(|r| r.file == path).collect()
    }

    pub fn range_named(&self, name: &str) -> Result<&RangeMarker> {
        self.ranges
            .iter()
            .find(|r| r.name.as_deref() == Some(name))
            .ok_or_else(|| Error::navigation(format!("Range '{name}' not found.")))
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn file_content(&self, path: &str) -> Result<&str> {
        self.adapter.content(path)
    }

    pub fn active_file(&self) -> &str {
        &self.active_file
    }

    pub fn active_content(&self) -> Result<&str> {
        self.adapter.content(&self.active_file)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<TextRange> {
        self.selection_end.map(|end| TextRange::new(self.cursor, end))
    }

    fn require_file(&self, path: &str) -> Result<()> {
        if self.adapter.documents().get(path).is_none() {
            return Err(Error::navigation(format!("File '{path}' not found.")));
        }
        Ok(())
    }

    /// Ends the test and shuts the service down
    pub fn dispose(self) -> Result<()> {
        debug!(test = %self.test_name, "Disposing session");
        self.adapter.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shift_before_edit_is_unchanged() {
        assert_eq!(shift_offset(2, 5, 8, 1), 2);
        assert_eq!(shift_offset(4, 5, 5, 3), 4);
    }

    #[test]
    fn test_shift_pure_insertion_moves_at_and_after() {
        assert_eq!(shift_offset(5, 5, 5, 3), 8);
        assert_eq!(shift_offset(9, 5, 5, 3), 12);
    }

    #[test]
    fn test_shift_replacement() {
        // [5, 8) replaced by one byte
        assert_eq!(shift_offset(8, 5, 8, 1), 6);
        assert_eq!(shift_offset(20, 5, 8, 1), 18);
        assert_eq!(shift_offset(6, 5, 8, 1), 5);
        assert_eq!(shift_offset(5, 5, 8, 1), 5);
    }

    #[test]
    fn test_shift_deletion_round_trips_insertion() {
        for offset in [0, 4, 5, 6, 10] {
            let inserted = shift_offset(offset, 5, 5, 3);
            assert_eq!(shift_offset(inserted, 5, 8, 0), offset);
        }
    }
}
