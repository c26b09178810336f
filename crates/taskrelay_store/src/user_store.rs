//! User store contract.

use taskrelay_core::{CoreResult, User, UserId};

/// Durable collection of registered users.
pub trait UserStore: Send + Sync {
    /// Persists a new user.
    ///
    /// # Errors
    ///
    /// `Validation` if the username or email is already taken.
    fn insert(&self, user: User) -> CoreResult<User>;

    /// Fetches a user by id.
    fn get(&self, id: UserId) -> CoreResult<User>;

    /// Looks a user up by login email.
    fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;
}
