//! Registration, login, and identity handlers.
//!
//! Passwords are hashed before they touch the store. Tokens are
//! stateless, so there is no logout endpoint; clients just drop the
//! token.

use super::parse_body;
use crate::auth::{generate_salt, hash_password, verify_password};
use crate::envelope::{self, ApiFailure, ApiResult};
use crate::state::{AppState, CurrentUser};
use axum::body::Bytes;
use axum::extract::State;
use axum::Extension;
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskrelay_core::{CoreError, User};

#[derive(Serialize)]
struct Profile {
    id: String,
    username: String,
    email: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// `POST /api/auth/register`.
pub async fn register(State(state): State<AppState>, body: Bytes) -> ApiResult {
    #[derive(Deserialize)]
    struct RegisterBody {
        #[serde(default)]
        username: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        password: String,
    }

    let input: RegisterBody = parse_body(&body)?;
    let username = input.username.trim();
    let email = input.email.trim();
    if username.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(ApiFailure(CoreError::validation(
            "username, email, and password are required",
        )));
    }

    let salt = generate_salt();
    let password_hash = hash_password(&salt, &input.password);
    let user = state.users.insert(User::new(
        username.to_string(),
        email.to_string(),
        password_hash,
        salt,
    ))?;

    let token = state.tokens.issue(user.id);
    Ok(envelope::created(
        "User registered successfully",
        json!({"user": Profile::from(&user), "token": token}),
    ))
}

/// `POST /api/auth/login`.
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult {
    #[derive(Deserialize)]
    struct LoginBody {
        #[serde(default)]
        email: String,
        #[serde(default)]
        password: String,
    }

    let input: LoginBody = parse_body(&body)?;
    if input.email.is_empty() || input.password.is_empty() {
        return Err(ApiFailure(CoreError::validation(
            "email and password are required",
        )));
    }

    // The same message for unknown email and wrong password, so login
    // probing cannot tell accounts apart.
    let invalid = || ApiFailure(CoreError::Authentication("Invalid credentials".into()));

    let user = state
        .users
        .find_by_email(input.email.trim())?
        .ok_or_else(invalid)?;
    if !verify_password(&user, &input.password) {
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id);
    Ok(envelope::ok_with_message(
        "Login successful",
        json!({"user": Profile::from(&user), "token": token}),
    ))
}

/// `GET /api/auth/me`.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult {
    let user = state.users.get(user.0)?;
    Ok(envelope::ok(json!({"user": Profile::from(&user)})))
}
