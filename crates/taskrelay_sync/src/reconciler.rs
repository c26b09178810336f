//! The reconciler.

use crate::report::{
    BatchError, BatchItem, BatchReport, CreateReport, SweepError, SweepItem, SweepReport,
    SyncOverview,
};
use std::sync::Arc;
use taskrelay_core::{
    ClientMeta, CoreError, CoreResult, EntryStatus, LedgerEntry, NewTaskInput, OperationKind,
    SubmittedOperation, Task, TaskId, UserId,
};
use taskrelay_store::{LedgerStore, TaskStore};
use tracing::{debug, warn};

/// Orchestrates replay of ledger entries against the task store.
///
/// All replay paths funnel through the same per-entry logic; they differ
/// only in which bucket they draw from and which statuses they may
/// claim. Batch items are processed sequentially in submission order:
/// the client's offline queue is causally ordered and must replay FIFO.
pub struct Reconciler {
    tasks: Arc<dyn TaskStore>,
    ledger: Arc<dyn LedgerStore>,
}

impl Reconciler {
    /// Creates a reconciler over the two stores.
    pub fn new(tasks: Arc<dyn TaskStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { tasks, ledger }
    }

    /// Accepts a batch of client-recorded operations and replays each.
    ///
    /// Every operation is appended to the ledger before anything else;
    /// per-item failures are captured and reported, never escalated.
    /// Each submitted operation lands in exactly one of the report's two
    /// lists.
    pub fn submit_batch(
        &self,
        owner: UserId,
        batch: &[SubmittedOperation],
        meta: &ClientMeta,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for op in batch {
            let entry = match self.ledger.append(LedgerEntry::new(owner, op, meta)) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "failed to record ledger entry");
                    report.errors.push(BatchError {
                        original_id: op.id.clone(),
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            match self.replay(&entry) {
                Ok(task_id) => match self.ledger.mark_synced(entry.id) {
                    Ok(_) => report.synced.push(BatchItem {
                        original_id: entry.client_id,
                        task_id,
                        status: "synced",
                    }),
                    Err(err) => report.errors.push(BatchError {
                        original_id: Some(entry.client_id),
                        error: err.to_string(),
                    }),
                },
                Err(err) => {
                    if let Err(mark_err) = self.ledger.mark_failed(entry.id, &err.to_string()) {
                        warn!(entry = %entry.id, error = %mark_err, "failed to record replay failure");
                    }
                    report.errors.push(BatchError {
                        original_id: Some(entry.client_id),
                        error: err.to_string(),
                    });
                }
            }
        }

        debug!(
            synced = report.synced.len(),
            errors = report.errors.len(),
            "batch reconciled"
        );
        report
    }

    /// Replays the terminal-failure bucket.
    ///
    /// Entries are reattempted even past their retry ceiling. The
    /// ceiling only gates the automatic sweep; an explicit retry request
    /// is an operator decision.
    pub fn retry_failed(&self) -> CoreResult<SweepReport> {
        let bucket = self.ledger.query_failed()?;
        Ok(self.sweep(
            bucket,
            &[EntryStatus::Failed, EntryStatus::Pending],
            "retried_successfully",
        ))
    }

    /// Replays the pending bucket.
    ///
    /// Intended to run periodically (service-worker callback or an
    /// external scheduler); silently advances entries from `pending` to
    /// `synced` or `failed`.
    pub fn auto_sync(&self) -> CoreResult<SweepReport> {
        let bucket = self.ledger.query_pending()?;
        Ok(self.sweep(bucket, &[EntryStatus::Pending], "auto_synced"))
    }

    fn sweep(
        &self,
        bucket: Vec<LedgerEntry>,
        claimable: &[EntryStatus],
        outcome: &'static str,
    ) -> SweepReport {
        let mut report = SweepReport::default();

        for entry in bucket {
            // The claim is a compare-and-set: if a concurrent sweep got
            // here first the entry is no longer in a claimable status
            // and is skipped, so each attempt is processed exactly once.
            let claimed = match self.ledger.claim_processing(entry.id, claimable) {
                Ok(Some(claimed)) => claimed,
                Ok(None) => {
                    debug!(entry = %entry.id, "entry claimed by another sweep, skipping");
                    continue;
                }
                Err(err) => {
                    report.errors.push(SweepError {
                        id: entry.id,
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            match self.replay(&claimed) {
                Ok(_) => match self.ledger.mark_synced(claimed.id) {
                    Ok(_) => report.items.push(SweepItem {
                        id: claimed.id,
                        status: outcome,
                    }),
                    Err(err) => report.errors.push(SweepError {
                        id: claimed.id,
                        error: err.to_string(),
                    }),
                },
                Err(err) => {
                    if let Err(mark_err) = self.ledger.mark_failed(claimed.id, &err.to_string()) {
                        warn!(entry = %claimed.id, error = %mark_err, "failed to record replay failure");
                    }
                    report.errors.push(SweepError {
                        id: claimed.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Replays one ledger entry. Returns the created task's id when the
    /// operation was a task mutation.
    fn replay(&self, entry: &LedgerEntry) -> CoreResult<Option<TaskId>> {
        match OperationKind::classify(&entry.endpoint) {
            OperationKind::CreateTask => {
                let input: NewTaskInput =
                    serde_json::from_value(entry.payload.clone()).map_err(|err| {
                        CoreError::validation(format!("invalid task payload: {err}"))
                    })?;
                input.reject_client_owner()?;

                let task = Task::new(
                    entry.owner_id,
                    &input.title,
                    &input.body,
                    Some(entry.client_id.clone()),
                )?;
                let task = self.tasks.insert(task)?;
                Ok(Some(task.id))
            }
            // Not interpreted by the reconciler; the ledger entry itself
            // is the durable record.
            OperationKind::Unknown => Ok(None),
        }
    }

    /// Creates many tasks in one call, items independent of each other.
    ///
    /// This is the bulk-import path: no ledger entries are written, and
    /// a validation failure in one item never aborts the rest.
    pub fn batch_create(&self, owner: UserId, items: Vec<NewTaskInput>) -> CreateReport {
        let mut report = CreateReport::default();

        for input in items {
            let created = input.reject_client_owner().and_then(|()| {
                let mut task = Task::new(
                    owner,
                    &input.title,
                    &input.body,
                    input.origin_id.clone(),
                )?;
                // Bulk imports may carry already-finished items.
                task.completed = input.completed;
                self.tasks.insert(task)
            });

            match created {
                Ok(task) => report.synced.push(task),
                Err(err) => report.errors.push(BatchError {
                    original_id: input.origin_id.clone(),
                    error: err.to_string(),
                }),
            }
        }

        report
    }

    /// Deletes synced ledger entries older than `days`.
    pub fn purge_older_than(&self, days: u64) -> CoreResult<u64> {
        self.ledger.purge_older_than(days)
    }

    /// Fresh task and ledger aggregates for the caller.
    pub fn overview(&self, owner: UserId) -> CoreResult<SyncOverview> {
        Ok(SyncOverview {
            tasks: self.tasks.stats(owner)?,
            pending_data: self.ledger.stats()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrelay_core::{EntryId, HttpMethod};
    use taskrelay_store::{LedgerStats, RelayStore, StatusFilter};

    fn setup() -> (Arc<RelayStore>, Reconciler) {
        let store = Arc::new(RelayStore::in_memory());
        let reconciler = Reconciler::new(store.clone(), store.clone());
        (store, reconciler)
    }

    /// A ledger whose durable log is unreachable; every call fails.
    struct OfflineLedger;

    impl LedgerStore for OfflineLedger {
        fn append(&self, _entry: LedgerEntry) -> CoreResult<LedgerEntry> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn get(&self, _id: EntryId) -> CoreResult<LedgerEntry> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn claim_processing(
            &self,
            _id: EntryId,
            _expected: &[EntryStatus],
        ) -> CoreResult<Option<LedgerEntry>> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn mark_synced(&self, _id: EntryId) -> CoreResult<LedgerEntry> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn mark_failed(&self, _id: EntryId, _error: &str) -> CoreResult<LedgerEntry> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn query_pending(&self) -> CoreResult<Vec<LedgerEntry>> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn query_failed(&self) -> CoreResult<Vec<LedgerEntry>> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn list(
            &self,
            _filter: StatusFilter,
            _limit: usize,
            _offset: usize,
        ) -> CoreResult<(Vec<LedgerEntry>, usize)> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn stats(&self) -> CoreResult<LedgerStats> {
            Err(CoreError::storage("ledger log unavailable"))
        }
        fn purge_older_than(&self, _days: u64) -> CoreResult<u64> {
            Err(CoreError::storage("ledger log unavailable"))
        }
    }

    fn task_op(id: &str, title: &str, body: &str) -> SubmittedOperation {
        SubmittedOperation {
            id: Some(id.into()),
            url: "/api/tasks".into(),
            method: HttpMethod::Post,
            endpoint: "/tasks".into(),
            payload: serde_json::json!({"title": title, "body": body}),
        }
    }

    #[test]
    fn batch_outcome_partitions_the_batch() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        let batch = vec![
            task_op("c-1", "valid", "body"),
            task_op("c-2", "", "body"), // empty title
        ];
        let report = reconciler.submit_batch(owner, &batch, &ClientMeta::default());

        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.synced.len() + report.errors.len(), batch.len());
        assert_eq!(report.synced[0].original_id, "c-1");
        assert!(report.synced[0].task_id.is_some());
        assert_eq!(report.errors[0].original_id.as_deref(), Some("c-2"));

        // Exactly one task was persisted.
        let (_, total) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn ledger_append_failure_still_accounts_for_every_item() {
        let tasks = Arc::new(RelayStore::in_memory());
        let reconciler = Reconciler::new(tasks.clone(), Arc::new(OfflineLedger));
        let owner = UserId::new();

        let batch = vec![task_op("c-1", "t", "b"), task_op("c-2", "t2", "b2")];
        let report = reconciler.submit_batch(owner, &batch, &ClientMeta::default());

        assert!(report.synced.is_empty());
        assert_eq!(report.errors.len(), batch.len());

        // An operation whose ledger entry could not be recorded is never
        // replayed against the task store.
        let (_, total) = TaskStore::list(tasks.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn every_operation_gets_a_ledger_entry() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        let batch = vec![task_op("c-1", "ok", "body"), task_op("c-2", "", "body")];
        reconciler.submit_batch(owner, &batch, &ClientMeta::default());

        let stats = LedgerStore::stats(store.as_ref()).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.synced, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn created_task_carries_correlation_id() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        reconciler.submit_batch(owner, &[task_op("c-7", "t", "b")], &ClientMeta::default());

        let (page, _) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(page[0].origin_id.as_deref(), Some("c-7"));
    }

    #[test]
    fn unknown_endpoint_is_recorded_and_acknowledged() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        let op = SubmittedOperation {
            id: Some("c-1".into()),
            url: "/api/notes".into(),
            method: HttpMethod::Post,
            endpoint: "/notes".into(),
            payload: serde_json::json!({"text": "not a task"}),
        };
        let report = reconciler.submit_batch(owner, &[op], &ClientMeta::default());

        assert_eq!(report.synced.len(), 1);
        assert!(report.synced[0].task_id.is_none());

        // No task created, but the ledger holds the synced record.
        let (_, total) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 0);
        assert_eq!(LedgerStore::stats(store.as_ref()).unwrap().synced, 1);
    }

    #[test]
    fn payload_with_client_owner_is_rejected() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        let mut op = task_op("c-1", "t", "b");
        op.payload = serde_json::json!({"title": "t", "body": "b", "userId": 1});
        let report = reconciler.submit_batch(owner, &[op], &ClientMeta::default());

        assert!(report.synced.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].error.contains("ownerId"));
        let (_, total) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn retry_failed_replays_the_bucket() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        // One bad item lands in the failed bucket.
        reconciler.submit_batch(owner, &[task_op("c-1", "", "b")], &ClientMeta::default());
        let failed = store.query_failed().unwrap();
        assert_eq!(failed.len(), 1);

        // Still broken on retry: payload unchanged.
        let report = reconciler.retry_failed().unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.errors.len(), 1);

        // Retry attempts keep counting past the ceiling.
        for _ in 0..4 {
            reconciler.retry_failed().unwrap();
        }
        let entry = LedgerStore::get(store.as_ref(), failed[0].id).unwrap();
        assert!(entry.retry_count > entry.max_retries);
    }

    #[test]
    fn retry_on_empty_bucket_is_a_no_op() {
        let (store, reconciler) = setup();

        let report = reconciler.retry_failed().unwrap();
        assert!(report.items.is_empty());
        assert!(report.errors.is_empty());
        assert_eq!(LedgerStore::stats(store.as_ref()).unwrap().total, 0);
    }

    #[test]
    fn auto_sync_advances_pending_entries() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        // Seed a pending entry directly, as if a previous flush crashed
        // between the ledger append and the replay.
        let entry = LedgerEntry::new(owner, &task_op("c-9", "t", "b"), &ClientMeta::default());
        LedgerStore::append(store.as_ref(), entry).unwrap();

        let report = reconciler.auto_sync().unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].status, "auto_synced");

        let (_, total) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(LedgerStore::stats(store.as_ref()).unwrap().synced, 1);
    }

    #[test]
    fn synced_entries_are_never_replayed_again() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        reconciler.submit_batch(owner, &[task_op("c-1", "t", "b")], &ClientMeta::default());
        let (_, before) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();

        // Neither sweep picks up the already-synced entry.
        let retry = reconciler.retry_failed().unwrap();
        let auto = reconciler.auto_sync().unwrap();
        assert!(retry.items.is_empty() && retry.errors.is_empty());
        assert!(auto.items.is_empty() && auto.errors.is_empty());

        let (_, after) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn batch_create_processes_items_independently() {
        let (store, reconciler) = setup();
        let owner = UserId::new();

        let items = vec![
            NewTaskInput::new("one", "body").with_origin_id("a"),
            NewTaskInput::new("", "body").with_origin_id("b"),
            NewTaskInput::new("three", "body"),
        ];
        let report = reconciler.batch_create(owner, items);

        assert_eq!(report.synced.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].original_id.as_deref(), Some("b"));

        let (_, total) = TaskStore::list(store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn overview_combines_both_stores() {
        let (_store, reconciler) = setup();
        let owner = UserId::new();

        reconciler.submit_batch(
            owner,
            &[task_op("c-1", "t", "b"), task_op("c-2", "", "b")],
            &ClientMeta::default(),
        );

        let overview = reconciler.overview(owner).unwrap();
        assert_eq!(overview.tasks.total, 1);
        assert_eq!(overview.pending_data.total, 2);
        assert_eq!(overview.pending_data.failed, 1);
    }

    #[test]
    fn purge_is_delegated() {
        let (_store, reconciler) = setup();
        assert_eq!(reconciler.purge_older_than(30).unwrap(), 0);
    }
}
