//! Parsed fixture data

use markcheck_core::TextRange;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Metadata attached through an inline `{| ... |}` block
pub type MarkerData = Map<String, Value>;

/// One analyzed source unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualFile {
    /// Normalized absolute path, `/`-separated
    pub path: String,
    /// Content with every annotation stripped
    pub content: String,
    /// File-scoped directives such as `emitthisfile`
    pub options: BTreeMap<String, String>,
    pub emit: bool,
}

/// Zero-width position in a fixture file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// `None` for `/**/` and for metadata blocks without a `"name"` entry
    pub name: Option<String>,
    pub file: String,
    /// Byte offset in stripped coordinates
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MarkerData>,
}

impl Marker {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Human label used in messages: the name, or the offset for anonymous markers
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("<anonymous at {}:{}>", self.file, self.offset),
        }
    }
}

/// Span delimited by `[|` and `|]`
///
/// A marker or metadata block written directly inside the range (and not in
/// a nested range) tags it with its name and data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeMarker {
    pub name: Option<String>,
    pub file: String,
    pub range: TextRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MarkerData>,
}

/// `// @link: target -> link`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symlink {
    pub target: String,
    pub link: String,
}

/// Options collected from pragma lines
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FixtureOptions {
    /// Explicitly written global options, lower-cased keys
    pub global: BTreeMap<String, String>,
    /// Explicitly written file-scoped directives, by normalized path
    pub per_file: BTreeMap<String, BTreeMap<String, String>>,
    pub symlinks: Vec<Symlink>,
    pub current_directory: Option<String>,
}

/// Result of parsing one fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    pub(crate) name: String,
    pub(crate) files: Vec<VirtualFile>,
    pub(crate) markers: Vec<Marker>,
    pub(crate) ranges: Vec<RangeMarker>,
    #[serde(skip)]
    pub(crate) marker_index: HashMap<String, usize>,
    pub(crate) options: FixtureOptions,
}

impl Fixture {
    /// Name of the test this fixture belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Files in declaration order
    pub fn files(&self) -> &[VirtualFile] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&VirtualFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// All markers, named and anonymous, in declaration order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.marker_index.get(name).map(|&i| &self.markers[i])
    }

    /// Names of all named markers in declaration order
    pub fn marker_names(&self) -> Vec<&str> {
        self.markers.iter().filter_map(|m| m.name.as_deref()).collect()
    }

    /// All ranges ordered by file declaration order, then by where they close
    pub fn ranges(&self) -> &[RangeMarker] {
        &self.ranges
    }

    pub fn options(&self) -> &FixtureOptions {
        &self.options
    }

    /// Whether a project config file (`tsconfig.json`/`jsconfig.json`) is among the files
    pub fn has_config_file(&self) -> bool {
        self.files.iter().any(|f| is_config_file(&f.path))
    }
}

pub(crate) fn is_config_file(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with("tsconfig.json") || lower.ends_with("jsconfig.json")
}
