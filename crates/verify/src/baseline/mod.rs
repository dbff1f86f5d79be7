//! Golden-file snapshots of navigation and tooltip results
//!
//! A verification renders its result to text ([`locations`] or
//! [`tooltips`]), collects one section per queried marker in a
//! [`BaselineBuilder`], and hands the finished snapshot to a
//! [`BaselineStore`] for comparison with the stored reference.

pub mod locations;
pub mod store;
pub mod tooltips;

pub use locations::{render_locations, SourceFile};
pub use store::{BaselineMode, BaselineStore, PendingBaseline, NO_CONTENT};
pub use tooltips::{render_tooltips, TooltipEntry};

/// Separator between the sections of one snapshot
const SECTION_SEPARATOR: &str = "\n\n\n\n";

/// Which verification produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaselineCommand {
    FindAllReferences,
    GoToDefinition,
    Hover,
    SignatureHelp,
}

impl BaselineCommand {
    /// Subfolder of the reference and local directories
    pub fn folder(&self) -> &'static str {
        match self {
            Self::FindAllReferences => "findAllRef",
            Self::GoToDefinition => "goToDef",
            Self::Hover => "hover",
            Self::SignatureHelp => "signatureHelp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::FindAllReferences | Self::GoToDefinition => ".baseline.jsonc",
            Self::Hover | Self::SignatureHelp => ".baseline",
        }
    }

    /// Heading written above each queried marker's section
    pub fn section_name(&self) -> &'static str {
        match self {
            Self::FindAllReferences => "findAllReferences",
            Self::GoToDefinition => "goToDefinition",
            Self::Hover => "QuickInfo",
            Self::SignatureHelp => "SignatureHelp",
        }
    }

    /// Text standing in for the queried marker in location snapshots
    pub fn marker_label(&self) -> &'static str {
        match self {
            Self::FindAllReferences => "/*FIND ALL REFS*/",
            Self::GoToDefinition => "/*GO TO DEFINITION*/",
            Self::Hover => "/*QUICK INFO*/",
            Self::SignatureHelp => "/*SIGNATURE HELP*/",
        }
    }

    /// Path of the snapshot relative to the baseline directories
    pub fn file_name(&self, test_name: &str) -> String {
        format!(
            "{}/{}{}",
            self.folder(),
            baseline_name(test_name),
            self.extension()
        )
    }
}

/// Baseline name for a test: its last path segment without a `test` prefix
///
/// `tests::test_go_to_import` becomes `go_to_import`, `TestGoToImport`
/// becomes `goToImport`.
pub fn baseline_name(test_name: &str) -> String {
    let last = test_name.rsplit("::").next().unwrap_or(test_name);
    if let Some(rest) = last.strip_prefix("test_") {
        return rest.to_string();
    }
    match last.strip_prefix("Test") {
        Some(rest) if !rest.is_empty() => {
            let mut chars = rest.chars();
            chars
                .next()
                .map(|first| first.to_lowercase().chain(chars).collect())
                .unwrap_or_default()
        }
        _ => last.to_string(),
    }
}

/// Accumulates the sections of one snapshot
#[derive(Debug)]
pub struct BaselineBuilder {
    command: BaselineCommand,
    file_name: String,
    sections: Vec<String>,
}

impl BaselineBuilder {
    pub fn new(command: BaselineCommand, test_name: &str) -> Self {
        Self {
            command,
            file_name: command.file_name(test_name),
            sections: Vec::new(),
        }
    }

    pub fn command(&self) -> BaselineCommand {
        self.command
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Appends a section headed by the command name
    pub fn add_result(&mut self, body: &str) {
        self.sections.push(format!(
            "// === {} ===\n{}",
            self.command.section_name(),
            body
        ));
    }

    /// Appends text verbatim as its own section
    pub fn add_raw(&mut self, text: String) {
        self.sections.push(text);
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn finish(self) -> String {
        self.sections.join(SECTION_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_baseline_names() {
        assert_eq!(baseline_name("tests::test_go_to_import"), "go_to_import");
        assert_eq!(baseline_name("TestGoToImport"), "goToImport");
        assert_eq!(baseline_name("plain"), "plain");
        assert_eq!(
            BaselineCommand::GoToDefinition.file_name("test_imports"),
            "goToDef/imports.baseline.jsonc"
        );
        assert_eq!(
            BaselineCommand::Hover.file_name("test_hover_basic"),
            "hover/hover_basic.baseline"
        );
    }

    #[test]
    fn test_sections_are_separated() {
        let mut builder = BaselineBuilder::new(BaselineCommand::FindAllReferences, "test_x");
        builder.add_result("// === /a.ts ===\n// a");
        builder.add_result("// === /b.ts ===\n// b");
        assert_eq!(
            builder.finish(),
            "// === findAllReferences ===\n// === /a.ts ===\n// a\n\n\n\n\
             // === findAllReferences ===\n// === /b.ts ===\n// b"
        );
    }
}
