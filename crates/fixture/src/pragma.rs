//! Splitting a fixture into per-file sections along `// @name: value` lines

use crate::model::Symlink;
use crate::options::{
    OptionRegistry, OptionScope, CURRENT_DIRECTORY_PRAGMA, FILENAME_PRAGMA, LINK_PRAGMA,
};
use markcheck_core::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::trace;

static LINE_BREAK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\r?\n").ok());
static OPTION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^//\s*@(\w+)\s*:\s*([^\r\n]*)").ok());
static LINK_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^//\s*@[lL][iI][nN][kK]\s*:\s*([^\r\n]*?)\s*->\s*([^\r\n]*)").ok());

/// Raw, still annotated text of one file section
#[derive(Debug)]
pub(crate) struct RawSection {
    pub name: String,
    pub text: String,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub(crate) struct SplitFixture {
    pub sections: Vec<RawSection>,
    pub global: BTreeMap<String, String>,
    pub symlinks: Vec<Symlink>,
    pub current_directory: Option<String>,
}

#[derive(Default)]
struct Accumulator {
    name: Option<String>,
    lines: Vec<String>,
    options: BTreeMap<String, String>,
}

impl Accumulator {
    fn take(&mut self, name: String) -> RawSection {
        let section = RawSection {
            name,
            text: self.lines.join("\n"),
            options: std::mem::take(&mut self.options),
        };
        self.lines.clear();
        section
    }

    /// Whitespace and line comments only
    fn is_trivia(&self) -> bool {
        self.lines.iter().all(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || trimmed.starts_with("//")
        })
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    match LINE_BREAK.as_ref() {
        Some(re) => re.split(text).collect(),
        None => text.lines().collect(),
    }
}

/// Splits `text` into file sections and collects option pragmas
///
/// Text before the first `@filename` forms a file named `default_name`
/// unless it is trivia. A fixture without any `@filename` is a single file
/// named `default_name`.
pub(crate) fn split_fixture(
    text: &str,
    default_name: &str,
    registry: &OptionRegistry,
) -> Result<SplitFixture> {
    let option_re = OPTION_PATTERN
        .as_ref()
        .ok_or_else(|| Error::config("option pragma pattern failed to compile"))?;
    let link_re = LINK_PATTERN
        .as_ref()
        .ok_or_else(|| Error::config("link pragma pattern failed to compile"))?;

    let mut split = SplitFixture::default();
    let mut current = Accumulator::default();

    for (index, line) in split_lines(text).into_iter().enumerate() {
        if let Some(caps) = link_re.captures(line) {
            split.symlinks.push(Symlink {
                target: caps[1].trim().to_string(),
                link: caps[2].trim().to_string(),
            });
            continue;
        }

        let Some(caps) = option_re.captures(line) else {
            // Blank lines before a section's first content line are dropped
            if !(line.is_empty() && current.lines.is_empty()) {
                current.lines.push(line.to_string());
            }
            continue;
        };

        let key = caps[1].to_ascii_lowercase();
        let value = caps[2].trim().to_string();
        trace!(pragma = %key, %value, "option pragma");

        if key == FILENAME_PRAGMA {
            match current.name.take() {
                Some(previous) => split.sections.push(current.take(previous)),
                None if !current.is_trivia() => {
                    split.sections.push(current.take(default_name.to_string()))
                }
                None => {
                    current.take(String::new());
                }
            }
            current.name = Some(value);
            continue;
        }

        if key == LINK_PRAGMA {
            let file = current.name.as_deref().unwrap_or(default_name);
            return Err(Error::fixture_parse(
                file,
                index + 1,
                1,
                format!("Malformed link pragma, expected 'target -> link': {value}"),
            ));
        }

        if key == CURRENT_DIRECTORY_PRAGMA {
            split.current_directory = Some(value);
            continue;
        }

        match registry.scope(&key) {
            Some(OptionScope::File) => {
                current.options.insert(key, value);
            }
            Some(OptionScope::Global) => {
                if let Some(previous) = split.global.insert(key.clone(), value.clone()) {
                    if previous != value {
                        trace!(pragma = %key, %previous, "global option redeclared, last value wins");
                    }
                }
            }
            None => {
                let file = current.name.as_deref().unwrap_or(default_name);
                return Err(Error::fixture_parse(
                    file,
                    index + 1,
                    1,
                    format!("Unknown option pragma '@{}'", &caps[1]),
                ));
            }
        }
    }

    let last_name = current
        .name
        .take()
        .unwrap_or_else(|| default_name.to_string());
    // A trailing `@filename` with no content still declares an empty file
    split.sections.push(current.take(last_name));

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(text: &str) -> SplitFixture {
        split_fixture(text, "test.ts", &OptionRegistry::builtin()).expect("split should succeed")
    }

    fn names(split: &SplitFixture) -> Vec<&str> {
        split.sections.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_single_file_uses_default_name() {
        let result = split("let x = 1;\nx./**/");
        assert_eq!(names(&result), vec!["test.ts"]);
        assert_eq!(result.sections[0].text, "let x = 1;\nx./**/");
    }

    #[test]
    fn test_filename_pragmas_split_sections() {
        let result = split("// @Filename: /a.ts\nexport const a = 1;\n// @filename: b.ts\nimport { a } from './a';");
        assert_eq!(names(&result), vec!["/a.ts", "b.ts"]);
        assert_eq!(result.sections[0].text, "export const a = 1;");
        assert_eq!(result.sections[1].text, "import { a } from './a';");
    }

    #[test]
    fn test_crlf_lines_are_normalized() {
        let result = split("// @filename: a.ts\r\nline1\r\nline2");
        assert_eq!(result.sections[0].text, "line1\nline2");
    }

    #[test]
    fn test_leading_blank_lines_are_dropped() {
        let result = split("\n\nconst a = 1;\n\nconst b = 2;");
        assert_eq!(result.sections[0].text, "const a = 1;\n\nconst b = 2;");

        let result = split("// @filename: a.ts\n\n  \nx");
        assert_eq!(result.sections[0].text, "  \nx");
    }

    #[test]
    fn test_trivia_preamble_is_dropped() {
        let result = split("\n// leading comment\n// @filename: a.ts\nx");
        assert_eq!(names(&result), vec!["a.ts"]);
    }

    #[test]
    fn test_content_preamble_becomes_default_file() {
        let result = split("const pre = 1;\n// @filename: a.ts\nx");
        assert_eq!(names(&result), vec!["test.ts", "a.ts"]);
        assert_eq!(result.sections[0].text, "const pre = 1;");
    }

    #[test]
    fn test_global_and_file_options() {
        let result = split(
            "// @strict: true\n// @Target:  es2015  \n// @filename: a.ts\n// @emitThisFile: true\nx\n// @filename: b.ts\ny",
        );
        assert_eq!(result.global.get("strict").map(String::as_str), Some("true"));
        assert_eq!(result.global.get("target").map(String::as_str), Some("es2015"));
        assert_eq!(
            result.sections[0].options.get("emitthisfile").map(String::as_str),
            Some("true")
        );
        assert!(result.sections[1].options.is_empty());
    }

    #[test]
    fn test_symlink_and_current_directory() {
        let result = split("// @currentDirectory: /home/src\n// @link: /a/b.ts -> /c/b.ts\nx");
        assert_eq!(result.current_directory.as_deref(), Some("/home/src"));
        assert_eq!(
            result.symlinks,
            vec![Symlink {
                target: "/a/b.ts".to_string(),
                link: "/c/b.ts".to_string()
            }]
        );
        assert_eq!(result.sections[0].text, "x");
    }

    #[test]
    fn test_unknown_pragma_is_an_error() {
        let err = split_fixture("x\n// @bogus: 1", "test.ts", &OptionRegistry::builtin())
            .unwrap_err();
        assert_eq!(err.to_string(), "test.ts (2,1): Unknown option pragma '@bogus'");
    }

    #[test]
    fn test_pragma_must_start_the_line() {
        let result = split("let a = 1; // @strict: true");
        assert!(result.global.is_empty());
    }
}
