//! Pending-operation ledger entries.
//!
//! Every mutation a client recorded while offline becomes one ledger
//! entry when the batch reaches the server. The entry tracks the replay
//! outcome and retry bookkeeping; it references a task only loosely via
//! the client correlation id, never by foreign key.

use crate::types::{now_millis, EntryId, UserId};
use serde::{Deserialize, Serialize};

/// Default number of automatic replay attempts before an entry lands in
/// the terminal-failure bucket.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP method recorded for an offline operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Remove.
    Delete,
    /// Partial update.
    Patch,
}

/// Replay state of a ledger entry.
///
/// Transitions are monotone except for explicit retry:
/// `pending → processing → {synced | failed}` and
/// `failed → processing → {synced | failed}` on manual retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Awaiting replay.
    Pending,
    /// Claimed by an in-flight replay attempt.
    Processing,
    /// Replayed successfully.
    Synced,
    /// The last replay attempt failed.
    Failed,
}

impl EntryStatus {
    /// Parses a status filter from a query string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "synced" => Some(Self::Synced),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Client/device metadata captured alongside a submitted batch.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    /// The submitting client's User-Agent header.
    pub user_agent: Option<String>,
    /// The submitting client's network origin.
    pub remote_addr: Option<String>,
}

/// One operation recorded by a client while offline, as submitted in a
/// sync batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedOperation {
    /// Client-assigned correlation id.
    pub id: Option<String>,
    /// Target URL the client would have called.
    pub url: String,
    /// HTTP method of the recorded call.
    pub method: HttpMethod,
    /// Logical endpoint tag (e.g. `/tasks`).
    pub endpoint: String,
    /// Opaque operation payload.
    #[serde(rename = "data")]
    pub payload: serde_json::Value,
}

/// A durable record of one offline-originated mutation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Server-assigned identifier.
    pub id: EntryId,
    /// Target URL recorded by the client.
    pub url: String,
    /// HTTP method recorded by the client.
    pub method: HttpMethod,
    /// Logical endpoint tag; interpreted via
    /// [`OperationKind`](crate::OperationKind) during replay.
    pub endpoint: String,
    /// Opaque operation payload.
    pub payload: serde_json::Value,
    /// Client-supplied correlation id.
    pub client_id: String,
    /// The authenticated user who submitted the batch. Replay creates
    /// tasks under this owner.
    pub owner_id: UserId,
    /// Replay state.
    pub status: EntryStatus,
    /// Number of replay attempts so far.
    pub retry_count: u32,
    /// Attempt ceiling for the automatic pending sweep.
    pub max_retries: u32,
    /// Timestamp of the most recent attempt (epoch millis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_retry: Option<u64>,
    /// Error text from the most recent failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the entry was successfully replayed (epoch millis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<u64>,
    /// Submitting client's User-Agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Submitting client's network origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    /// Creation timestamp (epoch millis).
    pub created_at: u64,
}

impl LedgerEntry {
    /// Creates a new entry in `Pending` status.
    ///
    /// Operations without a client correlation id get the creation
    /// timestamp as a fallback id, so the caller can still match
    /// results back to its queue by position.
    #[must_use]
    pub fn new(owner: UserId, op: &SubmittedOperation, meta: &ClientMeta) -> Self {
        let now = now_millis();
        Self {
            id: EntryId::new(),
            url: op.url.clone(),
            method: op.method,
            endpoint: op.endpoint.clone(),
            payload: op.payload.clone(),
            client_id: op.id.clone().unwrap_or_else(|| now.to_string()),
            owner_id: owner,
            status: EntryStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_retry: None,
            error: None,
            synced_at: None,
            user_agent: meta.user_agent.clone(),
            remote_addr: meta.remote_addr.clone(),
            created_at: now,
        }
    }

    /// True once the entry belongs to the terminal-failure bucket:
    /// explicitly failed, or out of automatic retries regardless of the
    /// status field.
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        self.status == EntryStatus::Failed || self.retry_count >= self.max_retries
    }

    /// True if the automatic pending sweep may still pick this entry up.
    #[must_use]
    pub fn is_retryable_pending(&self) -> bool {
        self.status == EntryStatus::Pending && self.retry_count < self.max_retries
    }

    /// Starts a replay attempt: moves to `Processing`, counts the
    /// attempt, stamps it.
    pub fn begin_attempt(&mut self) {
        self.status = EntryStatus::Processing;
        self.retry_count += 1;
        self.last_retry = Some(now_millis());
    }

    /// Records a successful replay.
    pub fn mark_synced(&mut self) {
        self.status = EntryStatus::Synced;
        self.synced_at = Some(now_millis());
    }

    /// Records a failed replay with its error text.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = EntryStatus::Failed;
        self.error = Some(error.into());
        self.last_retry = Some(now_millis());
    }
}
