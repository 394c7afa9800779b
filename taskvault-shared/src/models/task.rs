/// Task model and task input types
///
/// Every task references exactly one owning user and is only reachable
/// through that user's session: all lookups go through an ownership
/// predicate, never a bare id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     description TEXT NOT NULL,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Task record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// What needs to be done (trimmed, non-empty)
    pub description: String,

    /// Completion flag
    pub is_completed: bool,

    /// Owning user; the only path through which this task is reachable
    #[serde(rename = "owner")]
    pub owner_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// The owner is never part of the input; it is forced to the authenticated
/// caller. A body that tries to pass one is rejected during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewTask {
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Fields a task owner may change
///
/// Restricted to {description, isCompleted}; any other field fails
/// deserialization before a mutation is attempted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

impl Task {
    /// Builds a task owned by `owner_id` from validated input
    ///
    /// Rejects a description that is empty after trimming.
    pub fn create(owner_id: Uuid, draft: NewTask) -> CoreResult<Self> {
        let description = draft.description.trim().to_string();
        if description.is_empty() {
            return Err(CoreError::invalid("description", "Description is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            description,
            is_completed: draft.is_completed,
            owner_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an allowed-field update in place
    pub fn apply(&mut self, update: TaskUpdate) -> CoreResult<()> {
        if let Some(description) = update.description {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(CoreError::invalid("description", "Description is required"));
            }
            self.description = description;
        }
        if let Some(is_completed) = update.is_completed {
            self.is_completed = is_completed;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
