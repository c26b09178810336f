//! Response envelopes.
//!
//! Every response body is `{success, message?, data?, error?}` plus a
//! `pagination` block on list endpoints, so offline clients can parse
//! outcomes uniformly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use taskrelay_core::CoreError;

/// Pagination block for list endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total records matching the filter.
    pub total: usize,
    /// Requested page size.
    pub limit: usize,
    /// Requested page start.
    pub offset: usize,
    /// Whether another page exists past this one.
    pub has_more: bool,
}

impl Pagination {
    /// Builds the block; `has_more` is true iff `offset + limit < total`.
    #[must_use]
    pub fn new(total: usize, limit: usize, offset: usize) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// `200 {success: true, data}`.
pub fn ok(data: impl Serialize) -> Response {
    Json(json!({"success": true, "data": data})).into_response()
}

/// `200 {success: true, message, data}`.
pub fn ok_with_message(message: impl Into<String>, data: impl Serialize) -> Response {
    Json(json!({"success": true, "message": message.into(), "data": data})).into_response()
}

/// `201 {success: true, message, data}`.
pub fn created(message: impl Into<String>, data: impl Serialize) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "message": message.into(), "data": data})),
    )
        .into_response()
}

/// `200 {success: true, message}`.
pub fn message_only(message: impl Into<String>) -> Response {
    Json(json!({"success": true, "message": message.into()})).into_response()
}

/// `200 {success: true, data, pagination}`.
pub fn page(data: impl Serialize, pagination: Pagination) -> Response {
    Json(json!({"success": true, "data": data, "pagination": pagination})).into_response()
}

/// Failure envelope with an explicit status.
pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"success": false, "message": message.into()})),
    )
        .into_response()
}

/// A domain error on its way out as an HTTP response.
///
/// Handlers return `Result<Response, ApiFailure>` so `?` works on any
/// store or reconciler call.
#[derive(Debug)]
pub struct ApiFailure(pub CoreError);

impl From<CoreError> for ApiFailure {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::Authentication(_) => StatusCode::UNAUTHORIZED,
            CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // The error text is passed through for diagnostics; a stack
        // trace never is.
        (
            status,
            Json(json!({
                "success": false,
                "message": self.0.to_string(),
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

/// Handler result alias.
pub type ApiResult = Result<Response, ApiFailure>;
