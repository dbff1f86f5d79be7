//! Verification entry points on [`Session`]

use crate::session::Session;
use markcheck_core::{Error, Result};
use markcheck_fixture::Marker;
use markcheck_service::{LocationSpan, ResponseItem};
use markcheck_verify::{
    render_locations, render_tooltips, unified_diff, verify_completion_list, verify_quick_info,
    BaselineBuilder, BaselineCommand, ExpectedList, SourceFile, TooltipEntry,
};
use serde_json::Value;
use tracing::debug;

/// Where a completion expectation applies
#[derive(Debug, Clone)]
pub enum MarkerInput {
    Name(String),
    Names(Vec<String>),
    Marker(Marker),
    /// The cursor as it is
    Current,
}

impl From<&str> for MarkerInput {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for MarkerInput {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&[&str]> for MarkerInput {
    fn from(names: &[&str]) -> Self {
        Self::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MarkerInput {
    fn from(names: [&str; N]) -> Self {
        Self::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Marker> for MarkerInput {
    fn from(marker: Marker) -> Self {
        Self::Marker(marker)
    }
}

impl From<&Marker> for MarkerInput {
    fn from(marker: &Marker) -> Self {
        Self::Marker(marker.clone())
    }
}

#[derive(Debug, Clone, Copy)]
enum LocationQuery {
    References,
    Definition,
}

impl Session {
    fn position_prefix(&self) -> String {
        format!("At position {}:{}: ", self.active_file(), self.cursor())
    }

    /// Completion expectation at each marker of `input`, or at the cursor
    ///
    /// `None` means no completion results are expected at all.
    pub fn verify_completions(
        &mut self,
        input: impl Into<MarkerInput>,
        expected: Option<&ExpectedList>,
    ) -> Result<()> {
        match input.into() {
            MarkerInput::Name(name) => {
                self.go_to_marker(&name)?;
                self.completions_here(&format!("At marker '{name}': "), expected)
            }
            MarkerInput::Names(names) => {
                for name in names {
                    self.go_to_marker(&name)?;
                    self.completions_here(&format!("At marker '{name}': "), expected)?;
                }
                Ok(())
            }
            MarkerInput::Marker(marker) => {
                self.go_to_marker_ref(&marker);
                self.completions_here(&format!("At marker '{}': ", marker.label()), expected)
            }
            MarkerInput::Current => {
                let prefix = self.position_prefix();
                self.completions_here(&prefix, expected)
            }
        }
    }

    fn completions_here(&mut self, prefix: &str, expected: Option<&ExpectedList>) -> Result<()> {
        if let Some(expected) = expected {
            expected.validate().map_err(|err| match err {
                Error::Assertion(message) => Error::assertion(format!("{prefix}{message}")),
                other => other,
            })?;
        }
        let path = self.active_file().to_string();
        let offset = self.cursor();
        let actual = self.adapter.completions(&path, offset)?;
        let adapter = &mut self.adapter;
        let mut resolver = |item: &ResponseItem| adapter.resolve(&path, item);
        verify_completion_list(prefix, actual.as_ref(), expected, &mut resolver)
    }

    pub fn verify_quick_info_at(
        &mut self,
        marker: &str,
        text: &str,
        documentation: Option<&str>,
    ) -> Result<()> {
        self.go_to_marker(marker)?;
        let path = self.active_file().to_string();
        let info = self.adapter.quick_info(&path, self.cursor())?;
        verify_quick_info(
            &format!("At marker '{marker}': "),
            info.as_ref(),
            text,
            documentation,
        )
    }

    pub fn verify_quick_info_exists(&mut self) -> Result<()> {
        let path = self.active_file().to_string();
        match self.adapter.quick_info(&path, self.cursor())? {
            Some(info) if !info.text.is_empty() => Ok(()),
            _ => Err(Error::assertion(format!(
                "{}Expected quick info but got none.",
                self.position_prefix()
            ))),
        }
    }

    pub fn verify_not_quick_info_exists(&mut self) -> Result<()> {
        let path = self.active_file().to_string();
        match self.adapter.quick_info(&path, self.cursor())? {
            Some(info) if !info.text.is_empty() => Err(Error::assertion(format!(
                "{}Expected no quick info but got '{}'.",
                self.position_prefix(),
                info.text
            ))),
            _ => Ok(()),
        }
    }

    pub fn verify_current_file_content(&self, text: &str) -> Result<()> {
        let actual = self.active_content()?;
        if actual == text {
            return Ok(());
        }
        Err(Error::assertion(format!(
            "Content of {} does not match.\n{}",
            self.active_file(),
            unified_diff(text, actual, "expected", "actual")
        )))
    }

    /// Snapshot of find-all-references at each named marker, or at every range
    pub fn verify_baseline_find_all_references(&mut self, markers: &[&str]) -> Result<()> {
        self.with_baseline(|session| {
            session.location_baseline(
                BaselineCommand::FindAllReferences,
                LocationQuery::References,
                markers,
            )
        })
    }

    /// Snapshot of go-to-definition at each named marker, or at every range
    pub fn verify_baseline_go_to_definition(&mut self, markers: &[&str]) -> Result<()> {
        self.with_baseline(|session| {
            session.location_baseline(
                BaselineCommand::GoToDefinition,
                LocationQuery::Definition,
                markers,
            )
        })
    }

    /// Snapshot of quick info at every named marker
    pub fn verify_baseline_hover(&mut self) -> Result<()> {
        self.with_baseline(|session| session.tooltip_baseline(BaselineCommand::Hover))
    }

    /// Snapshot of signature help at every named marker
    pub fn verify_baseline_signature_help(&mut self) -> Result<()> {
        self.with_baseline(|session| session.tooltip_baseline(BaselineCommand::SignatureHelp))
    }

    fn with_baseline<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.baseline_in_progress {
            return Err(Error::assertion("Another baseline is already in progress"));
        }
        self.baseline_in_progress = true;
        let result = body(self);
        self.baseline_in_progress = false;
        result
    }

    /// Targets of a location baseline as (label, file, offset)
    fn baseline_targets(&self, markers: &[&str]) -> Result<Vec<(String, String, usize)>> {
        if markers.is_empty() {
            return Ok(self
                .ranges()
                .iter()
                .map(|r| {
                    (
                        r.name.clone().unwrap_or_default(),
                        r.file.clone(),
                        r.range.start,
                    )
                })
                .collect());
        }
        markers
            .iter()
            .map(|name| {
                let marker = self.marker(name)?;
                Ok((name.to_string(), marker.file.clone(), marker.offset))
            })
            .collect()
    }

    fn source_files(&self) -> Vec<SourceFile<'_>> {
        let documents = self.adapter.documents();
        let mut paths: Vec<&str> = self.files().iter().map(String::as_str).collect();
        paths.extend(
            documents
                .paths()
                .filter(|p| !self.files().iter().any(|f| f.as_str() == *p)),
        );
        paths
            .into_iter()
            .filter_map(|path| {
                documents.get(path).map(|doc| SourceFile {
                    path,
                    content: doc.content(),
                })
            })
            .collect()
    }

    fn location_baseline(
        &mut self,
        command: BaselineCommand,
        query: LocationQuery,
        markers: &[&str],
    ) -> Result<()> {
        let mut builder = BaselineBuilder::new(command, self.test_name());
        for (label, file, offset) in self.baseline_targets(markers)? {
            let locations: Vec<LocationSpan> = match query {
                LocationQuery::References => self.adapter.references(&file, offset)?,
                LocationQuery::Definition => self.adapter.definition(&file, offset)?,
            };
            debug!(marker = %label, results = locations.len(), "Collected locations");
            let rendered = render_locations(
                &self.source_files(),
                &file,
                offset,
                command.marker_label(),
                &locations,
            );
            builder.add_result(&rendered);
        }
        let name = builder.file_name().to_string();
        self.baselines.run(&name, &builder.finish())
    }

    fn tooltip_baseline(&mut self, command: BaselineCommand) -> Result<()> {
        let targets: Vec<Marker> = self
            .markers()
            .iter()
            .filter(|m| m.name.is_some())
            .cloned()
            .collect();

        let mut entries = Vec::with_capacity(targets.len());
        for marker in targets {
            let position = self.adapter.position_of(&marker.file, marker.offset)?;
            let (underline, lines, item) = match command {
                BaselineCommand::SignatureHelp => {
                    match self.adapter.signature_help(&marker.file, marker.offset)? {
                        Some(help) => {
                            let display = help.display();
                            let lines = if display.is_empty() {
                                Vec::new()
                            } else {
                                display.lines().map(str::to_string).collect()
                            };
                            (None, lines, to_value(&help)?)
                        }
                        None => (None, Vec::new(), Value::Null),
                    }
                }
                _ => match self.adapter.quick_info(&marker.file, marker.offset)? {
                    Some(info) => {
                        let mut lines: Vec<String> =
                            info.text.lines().map(str::to_string).collect();
                        if !info.documentation.is_empty() {
                            lines.extend(info.documentation.lines().map(str::to_string));
                        }
                        (info.span, lines, to_value(&info)?)
                    }
                    None => (None, Vec::new(), Value::Null),
                },
            };
            entries.push(TooltipEntry {
                file: marker.file.clone(),
                offset: marker.offset,
                marker_name: marker.label(),
                position,
                underline,
                lines,
                item,
            });
        }

        let op_name = match command {
            BaselineCommand::SignatureHelp => "signature help",
            _ => "quickinfo",
        };
        let mut builder = BaselineBuilder::new(command, self.test_name());
        if !entries.is_empty() {
            builder.add_raw(render_tooltips(&self.source_files(), &entries, op_name)?);
        }
        let name = builder.file_name().to_string();
        self.baselines.run(&name, &builder.finish())
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::with_context("serializing baseline item", e))
}
