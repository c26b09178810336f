//! Sync reconciliation handlers.

use super::{parse_body, DEFAULT_LIMIT};
use crate::envelope::{self, ApiFailure, ApiResult, Pagination};
use crate::state::{AppState, CurrentUser};
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use taskrelay_core::{ClientMeta, CoreError, SubmittedOperation};
use taskrelay_store::StatusFilter;

fn client_meta(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> ClientMeta {
    ClientMeta {
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(String::from),
        remote_addr: peer.map(|info| info.0.to_string()),
    }
}

/// `POST /api/sync/pending`: submit an offline batch for replay.
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> ApiResult {
    #[derive(Deserialize)]
    struct SubmitBody {
        #[serde(rename = "pendingData")]
        pending_data: Vec<SubmittedOperation>,
    }

    let SubmitBody { pending_data } = parse_body(&body)?;
    if pending_data.is_empty() {
        return Err(ApiFailure(CoreError::validation(
            "pendingData must be a non-empty array",
        )));
    }

    let meta = client_meta(&headers, peer.as_ref());
    let report = state
        .reconciler
        .submit_batch(user.0, &pending_data, &meta);

    Ok(envelope::ok_with_message(
        format!("Processed {} items", report.synced.len()),
        report,
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PendingQuery {
    status: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

/// `GET /api/sync/pending`: page through ledger entries.
pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> ApiResult {
    let status = query.status.as_deref().unwrap_or("pending");
    let filter = StatusFilter::parse(status).ok_or_else(|| {
        ApiFailure(CoreError::validation(format!(
            "unknown status filter: {status}"
        )))
    })?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let (items, total) = state.ledger.list(filter, limit, offset)?;
    Ok(envelope::page(items, Pagination::new(total, limit, offset)))
}

/// `POST /api/sync/retry`: replay the terminal-failure bucket.
pub async fn retry(State(state): State<AppState>) -> ApiResult {
    let report = state.reconciler.retry_failed()?;
    Ok(envelope::ok_with_message(
        format!("Retried {} items", report.items.len()),
        json!({"retried": report.items, "errors": report.errors}),
    ))
}

/// `GET /api/sync/stats`: combined task and ledger aggregates.
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult {
    let overview = state.reconciler.overview(user.0)?;
    Ok(envelope::ok(overview))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CleanQuery {
    #[serde(rename = "daysOld")]
    days_old: Option<u64>,
}

/// `DELETE /api/sync/clean`: purge old synced ledger entries.
pub async fn clean(
    State(state): State<AppState>,
    Query(query): Query<CleanQuery>,
) -> ApiResult {
    let days = query.days_old.unwrap_or(30);
    let deleted_count = state.reconciler.purge_older_than(days)?;
    Ok(envelope::ok_with_message(
        format!("Deleted {deleted_count} old records"),
        json!({"deletedCount": deleted_count}),
    ))
}

/// `POST /api/sync/auto`: sweep the pending bucket.
pub async fn auto_sync(State(state): State<AppState>) -> ApiResult {
    let report = state.reconciler.auto_sync()?;
    Ok(envelope::ok_with_message(
        "Auto sync completed",
        json!({"synced": report.items, "errors": report.errors}),
    ))
}
