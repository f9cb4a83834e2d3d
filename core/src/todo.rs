//! Domain types for todos.
//!
//! The pipeline distinguishes between a [`TodoDraft`] (a create intent, no
//! identity yet) and a [`Todo`] (a persisted record with an assigned
//! identity). Drafts are what travel through the message log; records are
//! owned by the persistence service and never constructed by the pipeline
//! itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted todo.
///
/// Identities are assigned by the persistence service at create time, never
/// by the publishing side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TodoId` from a UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A create intent for a todo, before any identity has been assigned.
///
/// This is the unit that is serialized onto the message log. Unknown fields
/// are rejected at decode time so malformed-but-coercible payloads fail
/// deterministically instead of being silently accepted.
///
/// # Examples
///
/// ```
/// use todo_pipeline_core::todo::TodoDraft;
///
/// let draft: TodoDraft = serde_json::from_str(
///     r#"{"title":"buy milk","done":false}"#,
/// ).unwrap();
/// assert_eq!(draft.title, "buy milk");
/// assert!(!draft.done);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TodoDraft {
    /// Title of the todo.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the todo is already done.
    #[serde(default)]
    pub done: bool,
}

impl TodoDraft {
    /// Creates a draft with just a title.
    #[must_use]
    pub const fn new(title: String) -> Self {
        Self {
            title,
            description: None,
            done: false,
        }
    }
}

/// A persisted todo record with an assigned identity.
///
/// Owned and mutated exclusively by the persistence service; the pipeline
/// treats it as opaque.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, assigned at create time.
    pub id: TodoId,
    /// Title of the todo.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Whether the todo is done.
    pub done: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a record from a draft with a freshly assigned identity.
    #[must_use]
    pub fn from_draft(id: TodoId, draft: TodoDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            done: draft.done,
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn draft_deserializes_with_defaults() {
        let draft: TodoDraft = serde_json::from_str(r#"{"title":"buy milk"}"#).unwrap();
        assert_eq!(draft.title, "buy milk");
        assert_eq!(draft.description, None);
        assert!(!draft.done);
    }

    #[test]
    fn draft_rejects_unknown_fields() {
        let result = serde_json::from_str::<TodoDraft>(r#"{"title":"x","id":42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn draft_requires_title() {
        let result = serde_json::from_str::<TodoDraft>(r#"{"done":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn record_keeps_draft_fields() {
        let draft = TodoDraft {
            title: "write docs".to_string(),
            description: Some("for the pipeline".to_string()),
            done: false,
        };
        let id = TodoId::new();
        let now = Utc::now();
        let todo = Todo::from_draft(id, draft.clone(), now);

        assert_eq!(todo.id, id);
        assert_eq!(todo.title, draft.title);
        assert_eq!(todo.description, draft.description);
        assert_eq!(todo.done, draft.done);
        assert_eq!(todo.created_at, now);
    }

    #[test]
    fn todo_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = TodoId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
