//! Typed mutation commands for node fields
//!
//! A closed set of update commands replaces free-form field-name dispatch:
//! an invalid field is unrepresentable, not a runtime condition.

use crate::domain::node::Status;

/// Update command for one scalar node field.
///
/// List fields (`atp`, `signposts`, `triggers`) are mutated through the
/// list-item operations on `AppState`, addressed by [`ListField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Name(String),
    Description(String),
    Status(Status),
    CompletionCondition(String),
    ProgressBoard(String),
    ContentBoard(String),
}

/// Selector for the string-list fields of a strategy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Atp,
    Signposts,
    Triggers,
}

impl ListField {
    /// Minimum number of entries the field must keep.
    /// Only `atp` carries a structural minimum.
    pub fn min_len(&self) -> usize {
        match self {
            ListField::Atp => 1,
            ListField::Signposts | ListField::Triggers => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListField::Atp => "atp",
            ListField::Signposts => "signposts",
            ListField::Triggers => "triggers",
        }
    }
}
