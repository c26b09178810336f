//! # TaskRelay Store
//!
//! Storage contracts and engines for the TaskRelay backend.
//!
//! This crate provides:
//! - The [`TaskStore`], [`LedgerStore`], and [`UserStore`] contracts
//! - [`RelayStore`], the single engine implementing all three, backed by
//!   a pluggable [`Journal`]
//! - Two journals: [`NullJournal`] (ephemeral, for tests and dev mode)
//!   and [`FileJournal`] (append-only JSON-lines log per collection)
//!
//! # Durability model
//!
//! Records live in memory; every mutation is appended to the journal
//! before the call returns. The file journal rebuilds the full state by
//! replaying its logs at open. Per-record writes are atomic at the line
//! level; there are no multi-record transactions.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod journal;
mod ledger_store;
mod store;
mod task_store;
mod user_store;

pub use journal::{Collection, FileJournal, FileStoreConfig, Journal, NullJournal};
pub use ledger_store::{LedgerStats, LedgerStore, StatusFilter};
pub use store::RelayStore;
pub use task_store::{TaskStats, TaskStore};
pub use user_store::UserStore;
