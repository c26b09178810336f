//! Router assembly.

use crate::handlers::{auth, meta, sync, tasks};
use crate::middleware::require_auth;
use crate::state::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use axum::Router;

/// Builds the full application router.
///
/// Everything under `/api` except registration and login sits behind
/// the bearer-token middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/stats", get(tasks::stats))
        .route("/tasks/sync", post(tasks::sync_batch))
        .route(
            "/tasks/:id",
            get(tasks::get_one).put(tasks::update).delete(tasks::remove),
        )
        .route("/tasks/:id/toggle", patch(tasks::toggle))
        .route("/sync/pending", post(sync::submit).get(sync::list_pending))
        .route("/sync/retry", post(sync::retry))
        .route("/sync/stats", get(sync::stats))
        .route("/sync/clean", delete(sync::clean))
        .route("/sync/auto", post(sync::auto_sync))
        .route("/auth/me", get(auth::me))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    Router::new()
        .route("/", get(meta::root))
        .route("/health", get(meta::health))
        .nest("/api", public.merge(protected))
        .fallback(meta::not_found)
        .with_state(state)
}
