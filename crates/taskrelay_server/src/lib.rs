//! # TaskRelay Server
//!
//! HTTP API surface for the TaskRelay offline-sync backend.
//!
//! This crate provides:
//! - The axum router over the task, ledger, and auth endpoints
//! - Bearer-token authentication middleware (HMAC-SHA256 tokens)
//! - The `{success, message?, data?, error?}` response envelope
//! - The `taskrelay-server` binary
//!
//! # Architecture
//!
//! Handlers are thin adapters over `taskrelay_store` and
//! `taskrelay_sync`; all owner-scoping decisions happen in those
//! crates. The server's own responsibilities are decoding, the
//! envelope, status-code mapping, and authentication.
//!
//! # Authentication
//!
//! All `/api` routes except `/api/auth/register` and `/api/auth/login`
//! require `Authorization: Bearer <token>`. The owner id is always the
//! verified token subject; request bodies that try to supply one are
//! rejected.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod envelope;
mod handlers;
mod middleware;
mod routes;
mod state;

pub use auth::{generate_salt, hash_password, verify_password, AuthConfig, TokenIssuer};
pub use config::ServerConfig;
pub use envelope::{ApiFailure, ApiResult, Pagination};
pub use routes::build_router;
pub use state::{AppState, CurrentUser};
