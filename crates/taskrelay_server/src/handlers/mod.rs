//! Request handlers.
//!
//! Handlers are thin: they decode the request, call into the domain,
//! and wrap the outcome in the response envelope. Anything interesting
//! happens in the stores and the reconciler.

pub mod auth;
pub mod meta;
pub mod sync;
pub mod tasks;

use crate::envelope::ApiFailure;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use taskrelay_core::CoreError;

/// Decodes a JSON request body, mapping parse failures onto the
/// envelope's 400 shape instead of the framework's plain-text reject.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiFailure> {
    serde_json::from_slice(body)
        .map_err(|err| ApiFailure(CoreError::validation(format!("invalid request body: {err}"))))
}

/// Default page size for list endpoints.
pub(crate) const DEFAULT_LIMIT: usize = 50;
