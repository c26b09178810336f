//! # TaskRelay Sync
//!
//! The offline-sync reconciliation engine.
//!
//! Clients queue mutations while disconnected and submit them as an
//! ordered batch once back online. The [`Reconciler`] replays each
//! operation against the task store, records the outcome on the
//! pending-operation ledger, and drives the retry and cleanup policy:
//!
//! 1. Every submitted operation becomes a ledger entry first.
//! 2. Operations that denote a task mutation are decoded and applied.
//! 3. Outcomes are written back per entry; a failure never aborts the
//!    rest of the batch.
//!
//! The ledger append and the task write are two separate persistence
//! steps: this engine is best-effort / at-least-once, and the client
//! keeps its own copy until it sees a synced acknowledgment.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod reconciler;
mod report;

pub use reconciler::Reconciler;
pub use report::{
    BatchError, BatchItem, BatchReport, CreateReport, SweepError, SweepItem, SweepReport,
    SyncOverview,
};
