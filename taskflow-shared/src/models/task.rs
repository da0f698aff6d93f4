use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A task owned by the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: i64,
    /// Short title shown in lists.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the task has been completed.
    #[serde(default)]
    pub completed: bool,
    /// Creation time as reported by the server (no timezone).
    pub created_at: NaiveDateTime,
}

/// Payload for `POST /tasks/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskCreate {
    /// Title of the new task.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial completion state.
    #[serde(default)]
    pub completed: bool,
}

impl TaskCreate {
    /// A new, not yet completed task.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            completed: false,
        }
    }
}

/// Partial update for `PUT /tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskUpdate {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New completion state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// An update that only marks the task as completed.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            completed: Some(true),
            ..Self::default()
        }
    }

    /// Returns `true` when the update would not change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}
