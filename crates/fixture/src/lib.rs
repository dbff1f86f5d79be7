//! Fixture markup parsing for markcheck
//!
//! A fixture is a single string describing one or more virtual source files:
//!
//! ```text
//! // @strict: true
//! // @filename: /a.ts
//! export function [|helper|]() {}
//! // @filename: /b.ts
//! import { helper } from "./a";
//! /*call*/helper();
//! ```
//!
//! Parsing splits the text along `@filename` pragmas, collects option
//! pragmas, and strips point markers (`/*name*/`), ranges (`[| |]`) and
//! metadata blocks (`{| "name": "x" |}`) from each file while recording
//! their offsets in the stripped text.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod markup;
mod model;
mod options;
mod pragma;

pub use model::{
    Fixture, FixtureOptions, Marker, MarkerData, RangeMarker, Symlink, VirtualFile,
};
pub use options::{
    OptionRegistry, OptionScope, OptionSpec, CURRENT_DIRECTORY_PRAGMA, EMIT_THIS_FILE,
    FILENAME_PRAGMA, LINK_PRAGMA,
};

use markcheck_core::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Directory relative file names resolve against when no `@currentDirectory` is given
pub const ROOT_DIR: &str = "/";

/// Parses fixtures against an option registry
#[derive(Debug, Clone, Default)]
pub struct FixtureParser {
    registry: OptionRegistry,
}

impl FixtureParser {
    pub fn new(registry: OptionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    /// Parses `content` for the test called `test_name`
    ///
    /// `default_file_name` names the implicit file of a fixture that has no
    /// `@filename` pragma (see [`default_file_name`]).
    pub fn parse(&self, test_name: &str, content: &str, default_file_name: &str) -> Result<Fixture> {
        let split = pragma::split_fixture(content, default_file_name, &self.registry)?;
        let cwd = split.current_directory.as_deref().unwrap_or(ROOT_DIR);

        let mut files = Vec::with_capacity(split.sections.len());
        let mut markers = Vec::new();
        let mut marker_locations = Vec::new();
        let mut ranges = Vec::new();
        let mut per_file = BTreeMap::new();

        for section in split.sections {
            if section.name.is_empty() {
                return Err(Error::fixture_parse(
                    default_file_name,
                    1,
                    1,
                    "Empty file name in @filename pragma",
                ));
            }
            let path = normalize_path(&section.name, cwd);
            if files.iter().any(|f: &VirtualFile| f.path == path) {
                return Err(Error::fixture_parse(
                    &path,
                    1,
                    1,
                    format!("Duplicate file name: \"{path}\""),
                ));
            }

            let scanned = markup::scan_file(&path, &section.text)?;
            let emit = section
                .options
                .get(EMIT_THIS_FILE)
                .is_some_and(|v| v.eq_ignore_ascii_case("true"));
            if !section.options.is_empty() {
                per_file.insert(path.clone(), section.options.clone());
            }

            markers.extend(scanned.markers);
            marker_locations.extend(scanned.marker_locations);
            ranges.extend(scanned.ranges);
            files.push(VirtualFile {
                path,
                content: scanned.content,
                options: section.options,
                emit,
            });
        }

        let marker_index = index_marker_names(&markers, &marker_locations)?;

        let fixture = Fixture {
            name: test_name.to_string(),
            files,
            markers,
            ranges,
            marker_index,
            options: FixtureOptions {
                global: split.global,
                per_file,
                symlinks: split
                    .symlinks
                    .into_iter()
                    .map(|link| Symlink {
                        target: normalize_path(&link.target, cwd),
                        link: normalize_path(&link.link, cwd),
                    })
                    .collect(),
                current_directory: split.current_directory,
            },
        };

        if fixture.has_config_file() && !fixture.options.global.is_empty() {
            let config = fixture
                .files
                .iter()
                .find(|f| model::is_config_file(&f.path))
                .map(|f| f.path.clone())
                .unwrap_or_default();
            return Err(Error::fixture_parse(
                config,
                1,
                1,
                "It is not allowed to use global options along with config files.",
            ));
        }

        debug!(
            test = test_name,
            files = fixture.files.len(),
            markers = fixture.markers.len(),
            ranges = fixture.ranges.len(),
            "Parsed fixture"
        );
        Ok(fixture)
    }
}

/// Parses a fixture with the built-in option registry
pub fn parse_fixture(test_name: &str, content: &str) -> Result<Fixture> {
    FixtureParser::default().parse(test_name, content, &default_file_name(test_name, "ts"))
}

/// Marker names are unique across every file of a fixture
fn index_marker_names(
    markers: &[Marker],
    locations: &[(usize, usize)],
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (i, marker) in markers.iter().enumerate() {
        let Some(name) = &marker.name else { continue };
        if let Some(&existing) = index.get(name) {
            let first: &Marker = &markers[existing];
            let (line, column) = locations.get(i).copied().unwrap_or((1, 1));
            return Err(Error::fixture_parse(
                &marker.file,
                line,
                column,
                format!(
                    "Duplicate marker name: \"{name}\" at {}:{} and {}:{}",
                    marker.file, marker.offset, first.file, first.offset
                ),
            ));
        }
        index.insert(name.clone(), i);
    }
    Ok(index)
}

/// File name for the implicit file of a single-file fixture
///
/// The last path segment of the test name with a leading `test_` or `Test`
/// dropped and the first character lower-cased: `TestQuickInfo` becomes
/// `quickInfo.ts`.
pub fn default_file_name(test_name: &str, extension: &str) -> String {
    let base = test_name
        .rsplit("::")
        .next()
        .unwrap_or(test_name)
        .trim_start_matches("test_")
        .trim_start_matches("Test");
    let mut chars = base.chars();
    let stem: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "fixture".to_string(),
    };
    format!("{stem}.{extension}")
}

/// Resolves `name` against `cwd` and normalizes separators and dot segments
pub fn normalize_path(name: &str, cwd: &str) -> String {
    let name = name.replace('\\', "/");
    let joined = if name.starts_with('/') {
        name
    } else {
        format!("{}/{}", cwd.trim_end_matches('/'), name)
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a.ts", "/"), "/a.ts");
        assert_eq!(normalize_path("./src/../lib/a.ts", "/home"), "/home/lib/a.ts");
        assert_eq!(normalize_path("/x//y.ts", "/ignored"), "/x/y.ts");
        assert_eq!(normalize_path("dir\\file.ts", "/"), "/dir/file.ts");
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(default_file_name("test_completion_list", "ts"), "completion_list.ts");
        assert_eq!(default_file_name("TestQuickInfo", "ts"), "quickInfo.ts");
        assert_eq!(default_file_name("scenarios::Basic", "tsx"), "basic.tsx");
        assert_eq!(default_file_name("", "ts"), "fixture.ts");
    }

    #[test]
    fn test_duplicate_marker_across_files() {
        let err = parse_fixture(
            "dup",
            "// @filename: /a.ts\n/*m*/a\n// @filename: /b.ts\n/*m*/b",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate marker name: \"m\""));
        assert_eq!(err.kind(), "FixtureParseError");
    }

    #[test]
    fn test_duplicate_marker_reports_its_own_position() {
        let err = parse_fixture(
            "dup",
            "// @filename: /a.ts\nx/*m*/\n// @filename: /b.ts\nlet b;\n  /*m*/b",
        )
        .unwrap_err();
        assert!(
            err.to_string().starts_with("/b.ts (2,3): Duplicate marker name: \"m\""),
            "{err}"
        );
    }

    #[test]
    fn test_global_options_with_config_file_rejected() {
        let err = parse_fixture(
            "cfg",
            "// @strict: true\n// @filename: /tsconfig.json\n{}\n// @filename: /a.ts\nx",
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("It is not allowed to use global options along with config files."));
    }

    #[test]
    fn test_current_directory_resolves_relative_names() {
        let fixture = parse_fixture(
            "cwd",
            "// @currentDirectory: /home/src\n// @filename: a.ts\nx\n// @link: a.ts -> /lib/a.ts",
        )
        .expect("parse");
        assert_eq!(fixture.files()[0].path, "/home/src/a.ts");
        assert_eq!(fixture.options().symlinks[0].target, "/home/src/a.ts");
        assert_eq!(fixture.options().symlinks[0].link, "/lib/a.ts");
    }
}
