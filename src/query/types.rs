//! Query-side value types: the candidate under repair and store results

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown to the model for an error list that was never checked.
pub const UNCHECKED_MARKER: &str = "N/A";

/// Errors believed to make the current candidate invalid.
///
/// `Unchecked` is the seed state before the first validation pass; it is
/// distinct from `Checked(vec![])`, which means "checked, no errors".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorList {
    #[default]
    Unchecked,
    Checked(Vec<String>),
}

impl ErrorList {
    pub fn checked<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Checked(errors.into_iter().map(Into::into).collect())
    }

    /// True only once a check has come back with zero errors.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Checked(errors) if errors.is_empty())
    }

    /// Number of known errors; the unchecked sentinel counts as one.
    pub fn len(&self) -> usize {
        match self {
            Self::Unchecked => 1,
            Self::Checked(errors) => errors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_resolved()
    }

    /// Lines to show the model, with the sentinel rendered as `N/A`.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Self::Unchecked => vec![UNCHECKED_MARKER],
            Self::Checked(errors) => errors.iter().map(String::as_str).collect(),
        }
    }
}

/// The current best guess at a runnable query and the errors against it.
///
/// Repairs replace the whole pair; nothing patches a candidate in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub query: String,
    pub errors: ErrorList,
}

impl Candidate {
    /// A freshly synthesized query that has not been validated yet.
    pub fn fresh(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            errors: ErrorList::Unchecked,
        }
    }

    pub fn new(query: impl Into<String>, errors: ErrorList) -> Self {
        Self {
            query: query.into(),
            errors,
        }
    }
}

/// Rows returned by the graph store.
///
/// Shape is store-defined: usually a list of row objects, occasionally a
/// single object. Contents are never validated beyond presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows(Vec<Value>),
    Single(Value),
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::Rows(Vec::new())
    }

    /// Executed, but nothing came back.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Rows(rows) => rows.is_empty(),
            Self::Single(value) => value.is_null(),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Single(value) if value.is_null() => 0,
            Self::Single(_) => 1,
        }
    }

    /// View the result as a single JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Rows(rows) => Value::Array(rows.clone()),
            Self::Single(value) => value.clone(),
        }
    }

    /// Serialization handed to answer synthesis.
    ///
    /// A one-row result is unwrapped to that row; anything else is
    /// serialized whole.
    pub fn context_string(&self) -> String {
        match self {
            Self::Rows(rows) if rows.len() == 1 => rows[0].to_string(),
            Self::Rows(rows) => Value::Array(rows.clone()).to_string(),
            Self::Single(value) => value.to_string(),
        }
    }
}

impl From<Value> for QueryResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(rows) => Self::Rows(rows),
            other => Self::Single(other),
        }
    }
}
