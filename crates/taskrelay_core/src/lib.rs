//! # TaskRelay Core
//!
//! Domain model for the TaskRelay offline-sync backend.
//!
//! This crate defines:
//! - Task records and their validation rules
//! - Pending-operation ledger entries and their status machine
//! - The operation-kind classification used during replay
//! - The error taxonomy shared by every layer
//!
//! No I/O happens here; storage and transport live in sibling crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod ledger;
mod op;
mod task;
mod types;
mod user;

pub use error::{CoreError, CoreResult};
pub use ledger::{
    ClientMeta, EntryStatus, HttpMethod, LedgerEntry, SubmittedOperation, DEFAULT_MAX_RETRIES,
};
pub use op::OperationKind;
pub use task::{NewTaskInput, SyncStatus, Task, TaskPatch};
pub use types::{now_millis, EntryId, TaskId, UserId, MILLIS_PER_DAY};
pub use user::User;
