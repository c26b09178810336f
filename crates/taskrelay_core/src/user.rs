//! Registered users.

use crate::types::{now_millis, UserId};
use serde::{Deserialize, Serialize};

/// A registered user. Owner of tasks; subject of issued bearer tokens.
///
/// The password never leaves the auth layer: only the salted hash is
/// stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier; the owner id on tasks.
    pub id: UserId,
    /// Unique display name.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Salted SHA-256 of the password, hex-encoded.
    pub password_hash: String,
    /// Per-user random salt, hex-encoded.
    pub salt: String,
    /// Registration timestamp (epoch millis).
    pub created_at: u64,
}

impl User {
    /// Creates a user record with an already-computed password hash.
    #[must_use]
    pub fn new(username: String, email: String, password_hash: String, salt: String) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            password_hash,
            salt,
            created_at: now_millis(),
        }
    }
}
