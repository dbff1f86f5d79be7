//! Three-state expectation for an optional response field

use std::fmt::Debug;

/// What an expectation says about one optional field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// Not mentioned; the field is not checked
    #[default]
    Unset,
    /// The field must be present, any value is accepted
    Ignored,
    /// The field must be present and equal
    Value(T),
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `self` unless it is `Unset`, in which case `fallback`
    pub fn or(self, fallback: Field<T>) -> Field<T> {
        match self {
            Self::Unset => fallback,
            other => other,
        }
    }
}

impl<T: PartialEq + Debug> Field<T> {
    /// Describes the mismatch between this expectation and `actual`, if any
    pub fn mismatch(&self, actual: Option<&T>) -> Option<(String, String)> {
        match (self, actual) {
            (Self::Unset, _) | (Self::Ignored, Some(_)) => None,
            (Self::Ignored, None) => Some(("<any value>".to_string(), "<absent>".to_string())),
            (Self::Value(expected), Some(actual)) if expected == actual => None,
            (Self::Value(expected), actual) => Some((
                format!("{expected:?}"),
                actual.map_or_else(|| "<absent>".to_string(), |a| format!("{a:?}")),
            )),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Field<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}
