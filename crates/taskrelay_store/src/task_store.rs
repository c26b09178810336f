//! Task store contract.

use serde::Serialize;
use taskrelay_core::{CoreResult, Task, TaskId, TaskPatch, UserId};

/// Aggregate counts over one owner's tasks.
///
/// Computed fresh on every call; callers must never cache these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// All tasks belonging to the owner.
    pub total: u64,
    /// Tasks with the completed flag set.
    pub completed: u64,
    /// Tasks whose sync status is `pending`.
    pub pending: u64,
    /// Tasks whose sync status is `failed`.
    pub failed: u64,
    /// Tasks whose sync status is `synced`.
    pub synced: u64,
}

/// Durable collection of task records, keyed by server-assigned id and
/// filterable by owner.
///
/// Ownership is enforced here rather than in each caller: `get`,
/// `update`, `toggle_complete`, and `delete` take the caller's
/// authenticated identity and fail with `PermissionDenied` on a
/// mismatch. `list` and `stats` are pre-filtered by owner.
///
/// # Implementors
///
/// [`RelayStore`](crate::RelayStore), over either journal.
pub trait TaskStore: Send + Sync {
    /// Persists a validated task.
    fn insert(&self, task: Task) -> CoreResult<Task>;

    /// Fetches a task by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no record exists; `PermissionDenied` if the record
    /// belongs to a different owner.
    fn get(&self, id: TaskId, owner: UserId) -> CoreResult<Task>;

    /// Lists the owner's tasks, most recently created first.
    ///
    /// Returns the requested page and the total match count. `completed`
    /// narrows to (un)finished tasks when set.
    fn list(
        &self,
        owner: UserId,
        completed: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> CoreResult<(Vec<Task>, usize)>;

    /// Applies a partial update and returns the new record.
    ///
    /// Forces `syncStatus=synced`; id, owner, and creation time are
    /// preserved.
    fn update(&self, id: TaskId, owner: UserId, patch: &TaskPatch) -> CoreResult<Task>;

    /// Flips the completed flag and returns the new record.
    fn toggle_complete(&self, id: TaskId, owner: UserId) -> CoreResult<Task>;

    /// Deletes a task.
    fn delete(&self, id: TaskId, owner: UserId) -> CoreResult<()>;

    /// Aggregate counts over the owner's tasks, read fresh.
    fn stats(&self, owner: UserId) -> CoreResult<TaskStats>;
}
