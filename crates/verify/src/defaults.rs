//! Process-wide expectation defaults and their injection into expected items

use crate::expected::{ExpectedCompletion, ExpectedItem, ExpectedItemDefaults};
use crate::field::Field;
use std::sync::LazyLock;

/// Commit characters a service reports for ordinary identifier completions
pub static DEFAULT_COMMIT_CHARACTERS: LazyLock<Vec<String>> =
    LazyLock::new(|| [".", ",", ";"].iter().map(|c| c.to_string()).collect());

/// Sort text of items declared in the current scope
pub const SORT_TEXT_LOCATION_PRIORITY: &str = "11";

/// Completes an expected item from the call's declared defaults
///
/// A label shorthand only picks up the call defaults; a structured item also
/// gets the sort-text default. Fields already set are left alone, so applying
/// twice gives the same result as applying once.
pub fn apply_defaults(item: &ExpectedItem, defaults: Option<&ExpectedItemDefaults>) -> ExpectedCompletion {
    let (mut completed, structured) = match item {
        ExpectedItem::Label(label) => (ExpectedCompletion::new(label.clone()), false),
        ExpectedItem::Item(item) => (item.clone(), true),
    };

    if let Some(defaults) = defaults {
        completed.commit_characters = completed
            .commit_characters
            .or(defaults.commit_characters.clone());
        completed.edit_range = completed.edit_range.or(defaults.edit_range.clone());
    }
    if structured {
        completed.sort_text = completed
            .sort_text
            .or(Field::Value(SORT_TEXT_LOCATION_PRIORITY.to_string()));
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use markcheck_core::TextRange;
    use markcheck_service::EditSpan;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_label_shorthand_gets_call_defaults_only() {
        let completed = apply_defaults(&"x".into(), Some(&ExpectedItemDefaults::standard()));
        assert_eq!(
            completed.commit_characters,
            Field::Value(DEFAULT_COMMIT_CHARACTERS.clone())
        );
        assert_eq!(completed.edit_range, Field::Ignored);
        assert!(completed.sort_text.is_unset());
    }

    #[test]
    fn test_set_fields_are_kept() {
        let span = EditSpan::from(TextRange::new(1, 3));
        let item = ExpectedCompletion::new("x")
            .sort_text("15")
            .edit("x", span)
            .commit_characters(&[]);
        let completed = apply_defaults(&item.into(), Some(&ExpectedItemDefaults::standard()));
        assert_eq!(completed.sort_text, Field::Value("15".to_string()));
        assert_eq!(completed.edit_range, Field::Value(span));
        assert_eq!(completed.commit_characters, Field::Value(Vec::new()));
    }

    #[test]
    fn test_applying_twice_is_a_no_op() {
        let defaults = ExpectedItemDefaults::standard();
        let item: ExpectedItem = ExpectedCompletion::new("x").kind("field").into();
        let once = apply_defaults(&item, Some(&defaults));
        let twice = apply_defaults(&ExpectedItem::Item(once.clone()), Some(&defaults));
        assert_eq!(once, twice);
        assert_eq!(once.sort_text, Field::Value("11".to_string()));
    }

    #[test]
    fn test_no_call_defaults() {
        let completed = apply_defaults(&"x".into(), None);
        assert_eq!(completed, ExpectedCompletion::new("x"));
    }
}
