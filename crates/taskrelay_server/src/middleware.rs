//! Request middleware.

use crate::envelope::{failure, ApiFailure};
use crate::state::{AppState, CurrentUser};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Bearer-token gate for all owner-scoped routes.
///
/// On success the verified subject is attached to the request as
/// [`CurrentUser`]; handlers never see an unauthenticated request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let Some(token) = token else {
        return failure(StatusCode::UNAUTHORIZED, "Authentication token required");
    };

    match state.tokens.verify(token) {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(err) => ApiFailure(err).into_response(),
    }
}
