//! The store engine.

use crate::journal::{Collection, FileJournal, FileStoreConfig, Journal, NullJournal};
use crate::ledger_store::{LedgerStats, LedgerStore, StatusFilter};
use crate::task_store::{TaskStats, TaskStore};
use crate::user_store::UserStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use taskrelay_core::{
    CoreError, CoreResult, EntryId, EntryStatus, LedgerEntry, Task, TaskId, TaskPatch, User,
    UserId, MILLIS_PER_DAY,
};
use tracing::debug;

/// One journal line: a full-record upsert or a deletion by id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum LogRecord<T> {
    /// The record's new durable form.
    Put {
        /// Full record state after the mutation.
        record: T,
    },
    /// The record no longer exists.
    Delete {
        /// String form of the record's id.
        id: String,
    },
}

#[derive(Default)]
struct State {
    // Insertion order doubles as creation order: ids are assigned with
    // monotonic timestamps, and replay preserves the original order.
    tasks: Vec<Task>,
    entries: Vec<LedgerEntry>,
    users: Vec<User>,
}

/// The storage engine behind every TaskRelay collection.
///
/// Records live in memory behind a [`parking_lot::RwLock`]; every
/// mutation is appended to the configured [`Journal`] while the write
/// lock is held, so concurrent writers see per-record atomicity. There
/// are no multi-record transactions.
///
/// Implements [`TaskStore`], [`LedgerStore`], and [`UserStore`]; hand an
/// `Arc<RelayStore>` to each consumer.
pub struct RelayStore {
    state: RwLock<State>,
    journal: Box<dyn Journal>,
}

impl RelayStore {
    /// Creates an ephemeral store for tests and the no-database dev mode.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(State::default()),
            journal: Box::new(NullJournal),
        }
    }

    /// Opens (or creates) a file-backed store under `dir`.
    ///
    /// Replays the collection logs into memory, then holds the
    /// directory's exclusive lock for the store's lifetime.
    ///
    /// # Errors
    ///
    /// Fails if the directory is unusable, locked, or a log line cannot
    /// be decoded. All of these are fatal at startup.
    pub fn open(dir: &Path, config: FileStoreConfig) -> CoreResult<Self> {
        let mut state = State::default();

        for line in FileJournal::read_log(dir, Collection::Tasks)? {
            match serde_json::from_str::<LogRecord<Task>>(&line)? {
                LogRecord::Put { record } => upsert(&mut state.tasks, record, |t| t.id.to_string()),
                LogRecord::Delete { id } => state.tasks.retain(|t| t.id.to_string() != id),
            }
        }
        for line in FileJournal::read_log(dir, Collection::Ledger)? {
            match serde_json::from_str::<LogRecord<LedgerEntry>>(&line)? {
                LogRecord::Put { record } => {
                    upsert(&mut state.entries, record, |e| e.id.to_string());
                }
                LogRecord::Delete { id } => state.entries.retain(|e| e.id.to_string() != id),
            }
        }
        for line in FileJournal::read_log(dir, Collection::Users)? {
            match serde_json::from_str::<LogRecord<User>>(&line)? {
                LogRecord::Put { record } => upsert(&mut state.users, record, |u| u.id.to_string()),
                LogRecord::Delete { id } => state.users.retain(|u| u.id.to_string() != id),
            }
        }

        debug!(
            tasks = state.tasks.len(),
            entries = state.entries.len(),
            users = state.users.len(),
            "store replayed from {}",
            dir.display()
        );

        let journal = FileJournal::open(dir, &config)?;
        Ok(Self {
            state: RwLock::new(state),
            journal: Box::new(journal),
        })
    }

    fn log_put<T: Serialize>(&self, collection: Collection, record: &T) -> CoreResult<()> {
        let line = serde_json::to_string(&LogRecord::Put { record })?;
        self.journal.append(collection, &line)
    }

    fn log_delete(&self, collection: Collection, id: String) -> CoreResult<()> {
        let line = serde_json::to_string(&LogRecord::<()>::Delete { id })?;
        self.journal.append(collection, &line)
    }
}

fn upsert<T>(records: &mut Vec<T>, record: T, key: impl Fn(&T) -> String) {
    let id = key(&record);
    match records.iter().position(|existing| key(existing) == id) {
        Some(index) => records[index] = record,
        None => records.push(record),
    }
}

fn task_not_found(id: TaskId) -> CoreError {
    CoreError::NotFound(format!("no task with id {id}"))
}

fn entry_not_found(id: EntryId) -> CoreError {
    CoreError::NotFound(format!("no ledger entry with id {id}"))
}

/// Membership test for the terminal-failure bucket: explicitly failed,
/// or a pending entry that exhausted its automatic retries. Synced and
/// in-flight entries never qualify, which is what keeps replay
/// idempotent at the query level.
fn in_failed_bucket(entry: &LedgerEntry) -> bool {
    match entry.status {
        EntryStatus::Failed => true,
        EntryStatus::Pending => entry.retry_count >= entry.max_retries,
        EntryStatus::Synced | EntryStatus::Processing => false,
    }
}

impl TaskStore for RelayStore {
    fn insert(&self, task: Task) -> CoreResult<Task> {
        let mut state = self.state.write();
        self.log_put(Collection::Tasks, &task)?;
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn get(&self, id: TaskId, owner: UserId) -> CoreResult<Task> {
        let state = self.state.read();
        let task = state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| task_not_found(id))?;
        if task.owner_id != owner {
            return Err(CoreError::PermissionDenied(
                "task belongs to another user".into(),
            ));
        }
        Ok(task.clone())
    }

    fn list(
        &self,
        owner: UserId,
        completed: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> CoreResult<(Vec<Task>, usize)> {
        let state = self.state.read();
        let matches: Vec<&Task> = state
            .tasks
            .iter()
            .rev() // newest first
            .filter(|t| t.owner_id == owner)
            .filter(|t| completed.map_or(true, |wanted| t.completed == wanted))
            .collect();
        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    fn update(&self, id: TaskId, owner: UserId, patch: &TaskPatch) -> CoreResult<Task> {
        let mut state = self.state.write();
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| task_not_found(id))?;
        if state.tasks[index].owner_id != owner {
            return Err(CoreError::PermissionDenied(
                "task belongs to another user".into(),
            ));
        }

        let mut updated = state.tasks[index].clone();
        updated.apply_patch(patch)?;
        self.log_put(Collection::Tasks, &updated)?;
        state.tasks[index] = updated.clone();
        Ok(updated)
    }

    fn toggle_complete(&self, id: TaskId, owner: UserId) -> CoreResult<Task> {
        let mut state = self.state.write();
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| task_not_found(id))?;
        if state.tasks[index].owner_id != owner {
            return Err(CoreError::PermissionDenied(
                "task belongs to another user".into(),
            ));
        }

        let mut updated = state.tasks[index].clone();
        updated.toggle_complete();
        self.log_put(Collection::Tasks, &updated)?;
        state.tasks[index] = updated.clone();
        Ok(updated)
    }

    fn delete(&self, id: TaskId, owner: UserId) -> CoreResult<()> {
        let mut state = self.state.write();
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| task_not_found(id))?;
        if state.tasks[index].owner_id != owner {
            return Err(CoreError::PermissionDenied(
                "task belongs to another user".into(),
            ));
        }

        self.log_delete(Collection::Tasks, id.to_string())?;
        state.tasks.remove(index);
        Ok(())
    }

    fn stats(&self, owner: UserId) -> CoreResult<TaskStats> {
        use taskrelay_core::SyncStatus;

        let state = self.state.read();
        let mut stats = TaskStats::default();
        for task in state.tasks.iter().filter(|t| t.owner_id == owner) {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            }
            match task.sync_status {
                SyncStatus::Synced => stats.synced += 1,
                SyncStatus::Pending => stats.pending += 1,
                SyncStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }
}

impl LedgerStore for RelayStore {
    fn append(&self, entry: LedgerEntry) -> CoreResult<LedgerEntry> {
        let mut state = self.state.write();
        self.log_put(Collection::Ledger, &entry)?;
        state.entries.push(entry.clone());
        Ok(entry)
    }

    fn get(&self, id: EntryId) -> CoreResult<LedgerEntry> {
        let state = self.state.read();
        state
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| entry_not_found(id))
    }

    fn claim_processing(
        &self,
        id: EntryId,
        expected: &[EntryStatus],
    ) -> CoreResult<Option<LedgerEntry>> {
        let mut state = self.state.write();
        let index = state
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| entry_not_found(id))?;

        if !expected.contains(&state.entries[index].status) {
            // Another sweep claimed this entry first.
            return Ok(None);
        }

        let mut claimed = state.entries[index].clone();
        claimed.begin_attempt();
        self.log_put(Collection::Ledger, &claimed)?;
        state.entries[index] = claimed.clone();
        Ok(Some(claimed))
    }

    fn mark_synced(&self, id: EntryId) -> CoreResult<LedgerEntry> {
        let mut state = self.state.write();
        let index = state
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| entry_not_found(id))?;

        let mut updated = state.entries[index].clone();
        updated.mark_synced();
        self.log_put(Collection::Ledger, &updated)?;
        state.entries[index] = updated.clone();
        Ok(updated)
    }

    fn mark_failed(&self, id: EntryId, error: &str) -> CoreResult<LedgerEntry> {
        let mut state = self.state.write();
        let index = state
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| entry_not_found(id))?;

        let mut updated = state.entries[index].clone();
        updated.mark_failed(error);
        self.log_put(Collection::Ledger, &updated)?;
        state.entries[index] = updated.clone();
        Ok(updated)
    }

    fn query_pending(&self) -> CoreResult<Vec<LedgerEntry>> {
        let state = self.state.read();
        // Insertion order is oldest-first, which is the FIFO replay order.
        Ok(state
            .entries
            .iter()
            .filter(|e| e.is_retryable_pending())
            .cloned()
            .collect())
    }

    fn query_failed(&self) -> CoreResult<Vec<LedgerEntry>> {
        let state = self.state.read();
        Ok(state
            .entries
            .iter()
            .filter(|e| in_failed_bucket(e))
            .cloned()
            .collect())
    }

    fn list(
        &self,
        filter: StatusFilter,
        limit: usize,
        offset: usize,
    ) -> CoreResult<(Vec<LedgerEntry>, usize)> {
        let state = self.state.read();
        let matches: Vec<&LedgerEntry> = state
            .entries
            .iter()
            .rev() // newest first
            .filter(|e| filter.matches(e.status))
            .collect();
        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    fn stats(&self) -> CoreResult<LedgerStats> {
        let state = self.state.read();
        let mut stats = LedgerStats::default();
        for entry in &state.entries {
            stats.total += 1;
            match entry.status {
                EntryStatus::Pending => stats.pending += 1,
                EntryStatus::Processing => stats.processing += 1,
                EntryStatus::Synced => stats.synced += 1,
                EntryStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    fn purge_older_than(&self, days: u64) -> CoreResult<u64> {
        let cutoff = taskrelay_core::now_millis().saturating_sub(days.saturating_mul(MILLIS_PER_DAY));

        let mut state = self.state.write();
        let doomed: Vec<EntryId> = state
            .entries
            .iter()
            .filter(|e| {
                e.status == EntryStatus::Synced
                    && e.synced_at.is_some_and(|synced_at| synced_at < cutoff)
            })
            .map(|e| e.id)
            .collect();

        for id in &doomed {
            self.log_delete(Collection::Ledger, id.to_string())?;
        }
        state.entries.retain(|e| !doomed.contains(&e.id));

        Ok(doomed.len() as u64)
    }
}

impl UserStore for RelayStore {
    fn insert(&self, user: User) -> CoreResult<User> {
        let mut state = self.state.write();
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(CoreError::validation("username or email already exists"));
        }

        self.log_put(Collection::Users, &user)?;
        state.users.push(user.clone());
        Ok(user)
    }

    fn get(&self, id: UserId) -> CoreResult<User> {
        let state = self.state.read();
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("no user with id {id}")))
    }

    fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let state = self.state.read();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }
}
