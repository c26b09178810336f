//! Pending-operation ledger contract.

use serde::Serialize;
use taskrelay_core::{CoreResult, EntryId, EntryStatus, LedgerEntry};

/// Status filter for ledger listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// No filtering.
    All,
    /// Entries in exactly this status.
    Only(EntryStatus),
}

impl StatusFilter {
    /// Parses a filter from a query-string value (`all` or a status name).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s == "all" {
            return Some(Self::All);
        }
        EntryStatus::parse(s).map(Self::Only)
    }

    /// Whether the given status passes this filter.
    #[must_use]
    pub fn matches(&self, status: EntryStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status == *wanted,
        }
    }
}

/// Aggregate counts over all ledger entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Every entry in the ledger.
    pub total: u64,
    /// Entries awaiting replay.
    pub pending: u64,
    /// Entries claimed by an in-flight attempt.
    pub processing: u64,
    /// Entries replayed successfully.
    pub synced: u64,
    /// Entries whose last attempt failed.
    pub failed: u64,
}

/// Durable log of client-submitted operations awaiting or having
/// undergone replay, with retry bookkeeping.
///
/// Entries reference tasks only loosely, by client correlation id; an
/// entry can outlive or be unrelated to any task.
pub trait LedgerStore: Send + Sync {
    /// Stores a new entry.
    fn append(&self, entry: LedgerEntry) -> CoreResult<LedgerEntry>;

    /// Fetches an entry by id.
    fn get(&self, id: EntryId) -> CoreResult<LedgerEntry>;

    /// Claims an entry for a replay attempt.
    ///
    /// Atomically moves the entry to `processing`, incrementing the
    /// retry count and stamping the attempt, but only if its current
    /// status is still one of `expected`. Returns `None` when another
    /// sweep got there first; the caller must then skip the entry.
    fn claim_processing(
        &self,
        id: EntryId,
        expected: &[EntryStatus],
    ) -> CoreResult<Option<LedgerEntry>>;

    /// Records a successful replay: `synced` plus a synced-at stamp.
    fn mark_synced(&self, id: EntryId) -> CoreResult<LedgerEntry>;

    /// Records a failed replay: `failed` plus the error text.
    fn mark_failed(&self, id: EntryId, error: &str) -> CoreResult<LedgerEntry>;

    /// Entries eligible for the automatic sweep: status `pending` and
    /// retry count below the ceiling, oldest first so the earliest
    /// offline actions replay first.
    fn query_pending(&self) -> CoreResult<Vec<LedgerEntry>>;

    /// The terminal-failure bucket: status `failed` OR retry count at or
    /// past the ceiling, whatever the status field says.
    ///
    /// Deliberately a superset check, not a pure status filter.
    fn query_failed(&self) -> CoreResult<Vec<LedgerEntry>>;

    /// Pages through entries, newest first.
    fn list(
        &self,
        filter: StatusFilter,
        limit: usize,
        offset: usize,
    ) -> CoreResult<(Vec<LedgerEntry>, usize)>;

    /// Aggregate counts, read fresh.
    fn stats(&self) -> CoreResult<LedgerStats>;

    /// Deletes `synced` entries older than the cutoff.
    ///
    /// Never touches pending, processing, or failed entries regardless
    /// of age; those require explicit operator action. Returns the
    /// number of deleted entries.
    fn purge_older_than(&self, days: u64) -> CoreResult<u64>;
}
