//! Reconciliation result types.

use serde::Serialize;
use taskrelay_core::{EntryId, Task, TaskId};
use taskrelay_store::{LedgerStats, TaskStats};

/// One successfully replayed operation from a submitted batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    /// The client's correlation id for the operation.
    pub original_id: String,
    /// Id of the task the replay created, when the operation was a task
    /// mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Outcome tag.
    pub status: &'static str,
}

/// One failed operation from a submitted batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    /// The client's correlation id, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    /// Human-readable error text.
    pub error: String,
}

/// Outcome of one submitted batch.
///
/// Every operation in the batch lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Operations that replayed successfully, in submission order.
    pub synced: Vec<BatchItem>,
    /// Operations that failed, in submission order.
    pub errors: Vec<BatchError>,
}

/// One ledger entry processed by a retry or auto-sync sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepItem {
    /// The ledger entry's id.
    pub id: EntryId,
    /// Outcome tag (`retried_successfully` or `auto_synced`).
    pub status: &'static str,
}

/// One ledger entry a sweep failed to replay.
#[derive(Debug, Clone, Serialize)]
pub struct SweepError {
    /// The ledger entry's id.
    pub id: EntryId,
    /// Human-readable error text.
    pub error: String,
}

/// Outcome of a retry or auto-sync sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Entries advanced to `synced` by this sweep.
    pub items: Vec<SweepItem>,
    /// Entries that failed again.
    pub errors: Vec<SweepError>,
}

/// Outcome of a bulk task creation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateReport {
    /// The created tasks, in submission order.
    pub synced: Vec<Task>,
    /// Items that failed validation, in submission order.
    pub errors: Vec<BatchError>,
}

/// Combined task and ledger aggregates for the sync dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOverview {
    /// The caller's task counts.
    pub tasks: TaskStats,
    /// Global ledger counts.
    pub pending_data: LedgerStats,
}
