//! Task records.

use crate::error::{CoreError, CoreResult};
use crate::types::{now_millis, TaskId, UserId};
use serde::{Deserialize, Serialize};

/// Synchronization state of a task record.
///
/// Server-persisted tasks are always `Synced`: once the server accepts
/// a write it is authoritative. The other states exist for records that
/// mirror client-side bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// The record is in its durable, acknowledged form.
    Synced,
    /// A client-side change has not been replayed yet.
    Pending,
    /// Replay of a client-side change failed.
    Failed,
}

/// A unit of work owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Short summary. Never empty for a persisted task.
    pub title: String,
    /// Full description. Never empty for a persisted task.
    pub body: String,
    /// The authenticated user who created the task. Immutable.
    pub owner_id: UserId,
    /// Whether the task has been completed.
    pub completed: bool,
    /// Synchronization state; `Synced` for everything the server persists.
    pub sync_status: SyncStatus,
    /// Number of sync attempts recorded against this task.
    pub retry_count: u32,
    /// Timestamp of the most recent sync attempt (epoch millis).
    pub last_sync_attempt: u64,
    /// Optional client-assigned correlation id from the offline queue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
    /// Creation timestamp (epoch millis).
    pub created_at: u64,
    /// Last-update timestamp (epoch millis).
    pub updated_at: u64,
}

impl Task {
    /// Creates a new task for `owner`.
    ///
    /// Title and body are trimmed; an empty result in either is a
    /// [`CoreError::Validation`] and nothing is persisted.
    pub fn new(
        owner: UserId,
        title: &str,
        body: &str,
        origin_id: Option<String>,
    ) -> CoreResult<Self> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title must not be empty"));
        }
        if body.is_empty() {
            return Err(CoreError::validation("body must not be empty"));
        }

        let now = now_millis();
        Ok(Self {
            id: TaskId::new(),
            title: title.to_string(),
            body: body.to_string(),
            owner_id: owner,
            completed: false,
            sync_status: SyncStatus::Synced,
            retry_count: 0,
            last_sync_attempt: now,
            origin_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update.
    ///
    /// Identity, owner, and creation time are preserved; the sync status
    /// is forced back to `Synced` because the server copy is
    /// authoritative after any accepted write.
    pub fn apply_patch(&mut self, patch: &TaskPatch) -> CoreResult<()> {
        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CoreError::validation("title must not be empty"));
            }
            self.title = title.to_string();
        }
        if let Some(body) = &patch.body {
            let body = body.trim();
            if body.is_empty() {
                return Err(CoreError::validation("body must not be empty"));
            }
            self.body = body.to_string();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.sync_status = SyncStatus::Synced;
        self.updated_at = now_millis();
        Ok(())
    }

    /// Flips the completed flag.
    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
        self.updated_at = now_millis();
    }
}

/// Input for creating one task, as submitted by a client.
///
/// Owner ids are never client-supplied: a payload that carries one is
/// rejected outright rather than silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskInput {
    /// Task title.
    #[serde(default)]
    pub title: String,
    /// Task body.
    #[serde(default)]
    pub body: String,
    /// Optional client correlation id. Older clients send `originalId`.
    #[serde(alias = "originalId")]
    pub origin_id: Option<String>,
    /// Initial completed flag (bulk imports may carry finished items).
    #[serde(default)]
    pub completed: bool,
    #[serde(default, alias = "userId")]
    owner_id: Option<serde_json::Value>,
}

impl NewTaskInput {
    /// Builds an input from title and body, for callers assembling
    /// batches in code rather than from wire payloads.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Sets the client correlation id.
    #[must_use]
    pub fn with_origin_id(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    /// Rejects payloads that try to set the owner.
    pub fn reject_client_owner(&self) -> CoreResult<()> {
        if self.owner_id.is_some() {
            return Err(CoreError::validation(
                "ownerId is derived from the authenticated caller and must not be supplied",
            ));
        }
        Ok(())
    }
}

/// A partial update to an existing task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New body, if changing.
    pub body: Option<String>,
    /// New completed flag, if changing.
    pub completed: Option<bool>,
    #[serde(default, alias = "userId")]
    owner_id: Option<serde_json::Value>,
}

impl TaskPatch {
    /// Rejects payloads that try to reassign the owner.
    pub fn reject_client_owner(&self) -> CoreResult<()> {
        if self.owner_id.is_some() {
            return Err(CoreError::validation(
                "ownerId is immutable and must not be supplied",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_synced() {
        let task = Task::new(UserId::new(), "write spec", "full draft", None).unwrap();
        assert_eq!(task.sync_status, SyncStatus::Synced);
        assert!(!task.completed);
        assert_eq!(task.retry_count, 0);
    }

    #[test]
    fn empty_title_rejected() {
        let err = Task::new(UserId::new(), "   ", "body", None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn empty_body_rejected() {
        let err = Task::new(UserId::new(), "title", "", None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn title_and_body_are_trimmed() {
        let task = Task::new(UserId::new(), "  a  ", "  b  ", None).unwrap();
        assert_eq!(task.title, "a");
        assert_eq!(task.body, "b");
    }

    #[test]
    fn toggle_twice_returns_to_original() {
        let mut task = Task::new(UserId::new(), "t", "b", None).unwrap();
        let original = task.completed;
        task.toggle_complete();
        task.toggle_complete();
        assert_eq!(task.completed, original);
    }

    #[test]
    fn patch_preserves_identity_and_owner() {
        let owner = UserId::new();
        let mut task = Task::new(owner, "t", "b", None).unwrap();
        let id = task.id;
        let created = task.created_at;

        let patch: TaskPatch =
            serde_json::from_value(serde_json::json!({"title": "new", "completed": true}))
                .unwrap();
        task.apply_patch(&patch).unwrap();

        assert_eq!(task.id, id);
        assert_eq!(task.owner_id, owner);
        assert_eq!(task.created_at, created);
        assert_eq!(task.title, "new");
        assert!(task.completed);
        assert_eq!(task.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn patch_with_empty_title_rejected() {
        let mut task = Task::new(UserId::new(), "t", "b", None).unwrap();
        let patch: TaskPatch =
            serde_json::from_value(serde_json::json!({"title": "  "})).unwrap();
        assert!(task.apply_patch(&patch).is_err());
    }

    #[test]
    fn client_supplied_owner_rejected() {
        let input: NewTaskInput =
            serde_json::from_value(serde_json::json!({"title": "t", "body": "b", "userId": 1}))
                .unwrap();
        assert!(input.reject_client_owner().is_err());

        let patch: TaskPatch =
            serde_json::from_value(serde_json::json!({"ownerId": "abc"})).unwrap();
        assert!(patch.reject_client_owner().is_err());
    }

    #[test]
    fn bulk_input_accepts_legacy_original_id() {
        let input: NewTaskInput = serde_json::from_value(serde_json::json!({
            "title": "t", "body": "b", "originalId": "c-3"
        }))
        .unwrap();
        assert_eq!(input.origin_id.as_deref(), Some("c-3"));
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = Task::new(UserId::new(), "t", "b", Some("c-1".into())).unwrap();
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("ownerId").is_some());
        assert!(json.get("syncStatus").is_some());
        assert_eq!(json["originId"], "c-1");
        assert_eq!(json["syncStatus"], "synced");
    }
}
