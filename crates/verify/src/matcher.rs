//! Completion list and quick-info verification
//!
//! Every discipline goes through the same pipeline: the expectation is
//! validated, expected items are completed from the call defaults, actual
//! items are completed from the response's own item defaults, and only then
//! are items compared. Failures come back as [`Error::Assertion`] with a
//! field-by-field listing and a unified diff.

use crate::defaults::apply_defaults;
use crate::diff::unified_diff;
use crate::expected::{ExpectedCompletion, ExpectedItem, ExpectedList};
use crate::field::Field;
use markcheck_core::{Error, Result};
use markcheck_service::{CompletionResponse, QuickInfo, ResponseItem};
use std::collections::BTreeSet;
use std::fmt::Debug;
use tracing::{debug, trace};

/// Fetches the resolved form of a completion item
pub trait ItemResolver {
    fn resolve(&mut self, item: &ResponseItem) -> Result<ResponseItem>;
}

impl<F> ItemResolver for F
where
    F: FnMut(&ResponseItem) -> Result<ResponseItem>,
{
    fn resolve(&mut self, item: &ResponseItem) -> Result<ResponseItem> {
        self(item)
    }
}

/// Resolver for responses whose items are already complete
pub fn no_resolve(item: &ResponseItem) -> Result<ResponseItem> {
    Ok(item.clone())
}

/// One compared field: its name, the expected rendering and the actual rendering
struct FieldLine {
    name: &'static str,
    expected: String,
    actual: String,
    matches: bool,
}

fn render<T: Debug>(value: Option<&T>) -> String {
    value.map_or_else(|| "<absent>".to_string(), |v| format!("{v:?}"))
}

fn field_line<T: PartialEq + Debug>(
    name: &'static str,
    expected: &Field<T>,
    actual: Option<&T>,
) -> Option<FieldLine> {
    if expected.is_unset() {
        return None;
    }
    Some(match expected.mismatch(actual) {
        None => FieldLine {
            name,
            expected: render(actual),
            actual: render(actual),
            matches: true,
        },
        Some((expected, actual)) => FieldLine {
            name,
            expected,
            actual,
            matches: false,
        },
    })
}

fn compare_item(expected: &ExpectedCompletion, actual: &ResponseItem) -> Vec<FieldLine> {
    let edit = actual.edit.as_ref();
    let preselect = actual.preselect.unwrap_or(false);
    [
        field_line("kind", &expected.kind, actual.kind.as_ref()),
        field_line("detail", &expected.detail, actual.detail.as_ref()),
        field_line("documentation", &expected.documentation, actual.documentation.as_ref()),
        field_line("sortText", &expected.sort_text, actual.sort_text.as_ref()),
        field_line("filterText", &expected.filter_text, actual.filter_text.as_ref()),
        field_line("insertText", &expected.insert_text, actual.insert_text.as_ref()),
        field_line("textEdit.newText", &expected.edit_text, edit.map(|e| &e.new_text)),
        field_line("textEdit.range", &expected.edit_range, edit.map(|e| &e.span)),
        field_line("commitCharacters", &expected.commit_characters, actual.commit_characters.as_ref()),
        field_line("labelDetails.detail", &expected.label_detail, actual.label_detail.as_ref()),
        field_line(
            "labelDetails.description",
            &expected.label_description,
            actual.label_description.as_ref(),
        ),
        field_line("deprecated", &expected.deprecated, Some(&actual.deprecated)),
        field_line("preselect", &expected.preselect, Some(&preselect)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn item_failure(prefix: &str, label: &str, lines: &[FieldLine]) -> Error {
    let mut message = format!("{prefix}Completion item '{label}' does not match.\n");
    for line in lines.iter().filter(|l| !l.matches) {
        message.push_str(&format!(
            "  {}: expected {}, actual {}\n",
            line.name, line.expected, line.actual
        ));
    }
    let project = |expected_side: bool| -> String {
        std::iter::once(format!("label: {label:?}\n"))
            .chain(lines.iter().map(|l| {
                let value = if expected_side { &l.expected } else { &l.actual };
                format!("{}: {value}\n", l.name)
            }))
            .collect()
    };
    let diff = unified_diff(&project(true), &project(false), "expected", "actual");
    message.push('\n');
    message.push_str(&diff);
    Error::assertion(message)
}

/// Checks one expected item against one actual item, resolving it first if needed
fn check_item(
    prefix: &str,
    expected: &ExpectedCompletion,
    actual: &ResponseItem,
    resolver: &mut dyn ItemResolver,
) -> Result<()> {
    let resolved;
    let actual = if expected.needs_resolve() {
        trace!(label = %actual.label, "Resolving completion item");
        resolved = resolver.resolve(actual)?;
        &resolved
    } else {
        actual
    };
    let lines = compare_item(expected, actual);
    if lines.iter().all(|l| l.matches) {
        Ok(())
    } else {
        Err(item_failure(prefix, &expected.label, &lines))
    }
}

fn label_lines<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    labels.into_iter().map(|l| format!("{l}\n")).collect()
}

fn check_labels(prefix: &str, expected: &[&str], actual: &[&str], what: &str) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    Err(Error::assertion(format!(
        "{prefix}{what} completion labels do not match.\n{}",
        unified_diff(
            &label_lines(expected.iter().copied()),
            &label_lines(actual.iter().copied()),
            "expected",
            "actual"
        )
    )))
}

/// Pairs each expected item with a distinct matching actual item
///
/// Compatibility is decided per (expected, actual) pair with the same label,
/// then a maximum bipartite matching is searched so an early expectation
/// cannot steal the only item a later one could match.
fn claim_items(
    prefix: &str,
    expected: &[ExpectedCompletion],
    actual: &[ResponseItem],
    resolver: &mut dyn ItemResolver,
) -> Result<()> {
    let mut compatible: Vec<Vec<usize>> = Vec::with_capacity(expected.len());
    let mut failures: Vec<Option<Error>> = Vec::with_capacity(expected.len());
    for item in expected {
        let candidates: Vec<usize> = (0..actual.len())
            .filter(|&i| actual[i].label == item.label)
            .collect();
        if candidates.is_empty() {
            return Err(Error::assertion(format!(
                "{prefix}Label '{}' not found in actual items.",
                item.label
            )));
        }

        let mut matches = Vec::new();
        let mut first_failure = None;
        for index in candidates {
            match check_item(prefix, item, &actual[index], resolver) {
                Ok(()) => matches.push(index),
                Err(err @ Error::Assertion(_)) => {
                    first_failure.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        compatible.push(matches);
        failures.push(first_failure);
    }

    let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
    for (index, item) in expected.iter().enumerate() {
        let mut visited = vec![false; actual.len()];
        if augment(index, &compatible, &mut owner, &mut visited) {
            continue;
        }
        let wanted = expected.iter().filter(|e| e.label == item.label).count();
        let present = actual.iter().filter(|a| a.label == item.label).count();
        if wanted > present {
            return Err(Error::assertion(format!(
                "{prefix}Label '{}' appears fewer times in actual items than expected.",
                item.label
            )));
        }
        return Err(match failures[index].take() {
            Some(err) => err,
            None => Error::assertion(format!(
                "{prefix}Label '{}' has no distinct matching item in actual items.",
                item.label
            )),
        });
    }
    Ok(())
}

/// Kuhn's augmenting path step: tries to give `expected` an actual item,
/// re-seating earlier owners when they have an alternative
fn augment(
    expected: usize,
    compatible: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &candidate in &compatible[expected] {
        if visited[candidate] {
            continue;
        }
        visited[candidate] = true;
        let free = match owner[candidate] {
            None => true,
            Some(previous) => augment(previous, compatible, owner, visited),
        };
        if free {
            owner[candidate] = Some(expected);
            return true;
        }
    }
    false
}

fn check_excludes(prefix: &str, excludes: &[String], actual: &[ResponseItem]) -> Result<()> {
    let excluded: BTreeSet<&str> = excludes.iter().map(String::as_str).collect();
    match actual.iter().find(|item| excluded.contains(item.label.as_str())) {
        Some(item) => Err(Error::assertion(format!(
            "{prefix}Label '{}' should not be in actual items but was found.",
            item.label
        ))),
        None => Ok(()),
    }
}

fn check_item_defaults(
    prefix: &str,
    expected: &ExpectedList,
    actual: &CompletionResponse,
) -> Result<()> {
    let (expected, actual) = match (&expected.item_defaults, &actual.item_defaults) {
        (None, None) => return Ok(()),
        (Some(_), None) => {
            return Err(Error::assertion(format!(
                "{prefix}Expected item defaults but the completion list has none."
            )))
        }
        (None, Some(_)) => {
            return Err(Error::assertion(format!(
                "{prefix}Completion list has item defaults but none were expected."
            )))
        }
        (Some(expected), Some(actual)) => (expected, actual),
    };
    let lines = [
        field_line(
            "itemDefaults.commitCharacters",
            &expected.commit_characters,
            actual.commit_characters.as_ref(),
        ),
        field_line("itemDefaults.editRange", &expected.edit_range, actual.edit_range.as_ref()),
    ];
    let failures: Vec<String> = lines
        .iter()
        .flatten()
        .filter(|l| !l.matches)
        .map(|l| format!("{}: expected {}, actual {}", l.name, l.expected, l.actual))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::assertion(format!("{prefix}{}", failures.join("\n"))))
    }
}

fn complete_expected(items: &[ExpectedItem], list: &ExpectedList) -> Vec<ExpectedCompletion> {
    items
        .iter()
        .map(|item| apply_defaults(item, list.item_defaults.as_ref()))
        .collect()
}

/// Verifies a completion response against an expectation
///
/// `prefix` is prepended to every failure message and usually names the
/// marker the request was made at. An absent expectation asserts that the
/// response is absent or empty.
pub fn verify_completion_list(
    prefix: &str,
    actual: Option<&CompletionResponse>,
    expected: Option<&ExpectedList>,
    resolver: &mut dyn ItemResolver,
) -> Result<()> {
    let Some(expected) = expected else {
        return match actual {
            Some(list) if !list.items.is_empty() => {
                let labels: Vec<&str> = list.items.iter().map(|i| i.label.as_str()).collect();
                Err(Error::assertion(format!(
                    "{prefix}Expected no completion results but got {} items: {}",
                    labels.len(),
                    labels.join(", ")
                )))
            }
            _ => Ok(()),
        };
    };
    expected.validate().map_err(|err| match err {
        Error::Assertion(message) => Error::assertion(format!("{prefix}{message}")),
        other => other,
    })?;

    let Some(actual) = actual else {
        return if expected.is_empty() {
            Ok(())
        } else {
            Err(Error::assertion(format!(
                "{prefix}Expected completion results but got none."
            )))
        };
    };
    if expected.is_empty() && actual.items.is_empty() {
        return Ok(());
    }

    if expected.is_incomplete != actual.is_incomplete {
        return Err(Error::assertion(format!(
            "{prefix}isIncomplete: expected {}, actual {}",
            expected.is_incomplete, actual.is_incomplete
        )));
    }
    check_item_defaults(prefix, expected, actual)?;

    let items: Vec<ResponseItem> = actual
        .items
        .iter()
        .cloned()
        .map(|item| item.with_list_defaults(actual.item_defaults.as_ref()))
        .collect();
    debug!(actual = items.len(), "Verifying completion list");

    let disciplines = &expected.items;
    if let Some(exact) = &disciplines.exact {
        let exact = complete_expected(exact, expected);
        let expected_labels: Vec<&str> = exact.iter().map(|i| i.label.as_str()).collect();
        let actual_labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        check_labels(prefix, &expected_labels, &actual_labels, "Exact")?;
        for (expected, actual) in exact.iter().zip(&items) {
            check_item(prefix, expected, actual, resolver)?;
        }
        return Ok(());
    }

    if let Some(unsorted) = &disciplines.unsorted {
        let unsorted = complete_expected(unsorted, expected);
        let mut expected_labels: Vec<&str> = unsorted.iter().map(|i| i.label.as_str()).collect();
        let mut actual_labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        expected_labels.sort_unstable();
        actual_labels.sort_unstable();
        check_labels(prefix, &expected_labels, &actual_labels, "Unsorted")?;
        return claim_items(prefix, &unsorted, &items, resolver);
    }

    if let Some(includes) = &disciplines.includes {
        let includes = complete_expected(includes, expected);
        claim_items(prefix, &includes, &items, resolver)?;
    }
    if let Some(excludes) = &disciplines.excludes {
        check_excludes(prefix, excludes, &items)?;
    }
    Ok(())
}

/// Verifies hover text and, when given, its documentation
pub fn verify_quick_info(
    prefix: &str,
    actual: Option<&QuickInfo>,
    text: &str,
    documentation: Option<&str>,
) -> Result<()> {
    let Some(actual) = actual else {
        return Err(Error::assertion(format!(
            "{prefix}Expected quick info but got none."
        )));
    };
    if actual.text != text {
        return Err(Error::assertion(format!(
            "{prefix}Quick info text does not match.\n{}",
            unified_diff(&format!("{text}\n"), &format!("{}\n", actual.text), "expected", "actual")
        )));
    }
    if let Some(documentation) = documentation {
        if actual.documentation != documentation {
            return Err(Error::assertion(format!(
                "{prefix}Quick info documentation does not match.\n{}",
                unified_diff(
                    &format!("{documentation}\n"),
                    &format!("{}\n", actual.documentation),
                    "expected",
                    "actual"
                )
            )));
        }
    }
    Ok(())
}
