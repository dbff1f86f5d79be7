//! Declared expectations for a completion request

use crate::defaults::DEFAULT_COMMIT_CHARACTERS;
use crate::field::Field;
use markcheck_core::{Error, Result};
use markcheck_service::EditSpan;
use std::collections::BTreeSet;

/// Expected completion entry given as a partial record
///
/// Only fields that are not [`Field::Unset`] take part in the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedCompletion {
    pub label: String,
    pub kind: Field<String>,
    pub detail: Field<String>,
    pub documentation: Field<String>,
    pub sort_text: Field<String>,
    pub filter_text: Field<String>,
    pub insert_text: Field<String>,
    pub edit_text: Field<String>,
    pub edit_range: Field<EditSpan>,
    pub commit_characters: Field<Vec<String>>,
    pub label_detail: Field<String>,
    pub label_description: Field<String>,
    pub deprecated: Field<bool>,
    pub preselect: Field<bool>,
}

impl ExpectedCompletion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: impl Into<Field<String>>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<Field<String>>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn documentation(mut self, documentation: impl Into<Field<String>>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn sort_text(mut self, sort_text: impl Into<Field<String>>) -> Self {
        self.sort_text = sort_text.into();
        self
    }

    pub fn insert_text(mut self, insert_text: impl Into<Field<String>>) -> Self {
        self.insert_text = insert_text.into();
        self
    }

    /// Expects an edit writing `new_text` over `span`
    pub fn edit(mut self, new_text: impl Into<String>, span: impl Into<EditSpan>) -> Self {
        self.edit_text = Field::Value(new_text.into());
        self.edit_range = Field::Value(span.into());
        self
    }

    pub fn commit_characters(mut self, characters: &[&str]) -> Self {
        self.commit_characters = Field::Value(characters.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Field::Value(deprecated);
        self
    }

    /// Whether comparing this item needs the resolved form of the actual item
    pub fn needs_resolve(&self) -> bool {
        !self.detail.is_unset() || !self.documentation.is_unset()
    }
}

/// Either a bare label or a structured record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedItem {
    Label(String),
    Item(ExpectedCompletion),
}

impl ExpectedItem {
    pub fn label(&self) -> &str {
        match self {
            Self::Label(label) => label,
            Self::Item(item) => &item.label,
        }
    }
}

impl From<&str> for ExpectedItem {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for ExpectedItem {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<ExpectedCompletion> for ExpectedItem {
    fn from(item: ExpectedCompletion) -> Self {
        Self::Item(item)
    }
}

/// Expected list-level item defaults, also injected into expected items
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedItemDefaults {
    pub commit_characters: Field<Vec<String>>,
    pub edit_range: Field<EditSpan>,
}

impl ExpectedItemDefaults {
    /// The default commit characters and an edit range whose value is not checked
    pub fn standard() -> Self {
        Self {
            commit_characters: Field::Value(DEFAULT_COMMIT_CHARACTERS.clone()),
            edit_range: Field::Ignored,
        }
    }
}

/// Item expectations; which members are set selects the matching discipline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedItems {
    pub exact: Option<Vec<ExpectedItem>>,
    pub includes: Option<Vec<ExpectedItem>>,
    pub excludes: Option<Vec<String>>,
    pub unsorted: Option<Vec<ExpectedItem>>,
}

fn collect<I: Into<ExpectedItem>>(items: impl IntoIterator<Item = I>) -> Vec<ExpectedItem> {
    items.into_iter().map(Into::into).collect()
}

impl ExpectedItems {
    /// Same items in the same order, nothing else
    pub fn exact<I: Into<ExpectedItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            exact: Some(collect(items)),
            ..Default::default()
        }
    }

    /// Same items in any order, nothing else
    pub fn unsorted<I: Into<ExpectedItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            unsorted: Some(collect(items)),
            ..Default::default()
        }
    }

    /// At least these items
    pub fn includes<I: Into<ExpectedItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            includes: Some(collect(items)),
            ..Default::default()
        }
    }

    /// None of these labels
    pub fn excludes<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            excludes: Some(labels.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Adds an exclude set to an includes expectation
    pub fn and_excludes<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.excludes = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

/// One verification call's expectation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedList {
    pub is_incomplete: bool,
    pub item_defaults: Option<ExpectedItemDefaults>,
    pub items: ExpectedItems,
}

impl ExpectedList {
    pub fn new(items: ExpectedItems) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn with_item_defaults(mut self, defaults: ExpectedItemDefaults) -> Self {
        self.item_defaults = Some(defaults);
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.is_incomplete = true;
        self
    }

    /// Whether the expectation is satisfied by an absent or empty result
    pub fn is_empty(&self) -> bool {
        let empty = |items: &Option<Vec<ExpectedItem>>| items.as_ref().is_none_or(Vec::is_empty);
        empty(&self.items.exact)
            && empty(&self.items.includes)
            && empty(&self.items.unsorted)
            && self.items.excludes.as_ref().is_none_or(Vec::is_empty)
    }

    /// Rejects combinations of disciplines that cannot hold together
    pub fn validate(&self) -> Result<()> {
        let items = &self.items;
        let others = [
            ("includes", items.includes.is_some()),
            ("excludes", items.excludes.is_some()),
            ("unsorted", items.unsorted.is_some()),
        ];
        if items.exact.is_some() {
            if let Some((name, _)) = others.iter().find(|(_, set)| *set) {
                return Err(Error::assertion(format!(
                    "Expected exact completion list but also specified '{name}'."
                )));
            }
        }
        if items.unsorted.is_some() {
            if let Some((name, _)) = others[..2].iter().find(|(_, set)| *set) {
                return Err(Error::assertion(format!(
                    "Expected unsorted completion list but also specified '{name}'."
                )));
            }
        }

        if let (Some(includes), Some(excludes)) = (&items.includes, &items.excludes) {
            let excluded: BTreeSet<&str> = excludes.iter().map(String::as_str).collect();
            if let Some(label) = includes.iter().map(ExpectedItem::label).find(|l| excluded.contains(l)) {
                return Err(Error::assertion(format!(
                    "Label '{label}' is both included and excluded."
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_is_exclusive() {
        let list = ExpectedList::new(ExpectedItems {
            exact: Some(vec!["a".into()]),
            excludes: Some(vec!["b".to_string()]),
            ..Default::default()
        });
        let err = list.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected exact completion list but also specified 'excludes'."
        );
    }

    #[test]
    fn test_unsorted_rejects_includes() {
        let list = ExpectedList::new(ExpectedItems {
            unsorted: Some(vec!["a".into()]),
            includes: Some(vec!["b".into()]),
            ..Default::default()
        });
        assert!(list.validate().is_err());
    }

    #[test]
    fn test_include_exclude_contradiction() {
        let list = ExpectedList::new(
            ExpectedItems::includes([ExpectedCompletion::new("x").kind("field")]).and_excludes(["y", "x"]),
        );
        let err = list.validate().unwrap_err();
        assert_eq!(err.kind(), "AssertionFailure");
        assert_eq!(err.to_string(), "Label 'x' is both included and excluded.");
    }

    #[test]
    fn test_includes_with_excludes_is_valid() {
        let list = ExpectedList::new(ExpectedItems::includes(["a"]).and_excludes(["b"]));
        assert!(list.validate().is_ok());
        assert!(!list.is_empty());
        assert!(ExpectedList::new(ExpectedItems::exact(Vec::<&str>::new())).is_empty());
    }
}
