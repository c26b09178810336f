//! Shared application state.

use crate::auth::TokenIssuer;
use std::sync::Arc;
use std::time::Instant;
use taskrelay_core::UserId;
use taskrelay_store::{LedgerStore, RelayStore, TaskStore, UserStore};
use taskrelay_sync::Reconciler;

/// The authenticated caller, attached to the request by the auth
/// middleware.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Task store.
    pub tasks: Arc<dyn TaskStore>,
    /// Pending-operation ledger.
    pub ledger: Arc<dyn LedgerStore>,
    /// User store.
    pub users: Arc<dyn UserStore>,
    /// The reconciliation engine.
    pub reconciler: Arc<Reconciler>,
    /// Token issuer/verifier.
    pub tokens: Arc<TokenIssuer>,
    /// Process start, for the health endpoint's uptime.
    pub started_at: Instant,
}

impl AppState {
    /// Wires the state from one [`RelayStore`] serving all collections.
    pub fn new(store: Arc<RelayStore>, tokens: TokenIssuer) -> Self {
        let tasks: Arc<dyn TaskStore> = store.clone();
        let ledger: Arc<dyn LedgerStore> = store.clone();
        let users: Arc<dyn UserStore> = store;
        Self::with_stores(tasks, ledger, users, tokens)
    }

    /// Wires the state from independently injected stores.
    pub fn with_stores(
        tasks: Arc<dyn TaskStore>,
        ledger: Arc<dyn LedgerStore>,
        users: Arc<dyn UserStore>,
        tokens: TokenIssuer,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(tasks.clone(), ledger.clone()));
        Self {
            tasks,
            ledger,
            users,
            reconciler,
            tokens: Arc::new(tokens),
            started_at: Instant::now(),
        }
    }
}
