//! Error taxonomy shared by every layer.

use thiserror::Error;

/// Result type for domain operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while operating on the task store, the ledger,
/// or the reconciler.
///
/// The variants line up with the API's status-code contract: validation
/// problems are client errors, storage problems are server errors, and
/// the server layer maps each variant onto exactly one HTTP status.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required field is missing or empty, or a disallowed field was
    /// supplied by the client.
    #[error("validation error: {0}")]
    Validation(String),

    /// The bearer token is missing, malformed, expired, or invalid.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The caller does not own the record it tried to touch.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No record exists for the given identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// The durable store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Convenience constructor for validation failures.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Convenience constructor for storage failures.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::Authentication(_)
                | CoreError::PermissionDenied(_)
                | CoreError::NotFound(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Storage(_))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Storage(format!("record encoding: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(CoreError::validation("empty title").is_client_error());
        assert!(CoreError::NotFound("task".into()).is_client_error());
        assert!(CoreError::storage("disk full").is_server_error());
        assert!(!CoreError::storage("disk full").is_client_error());
    }

    #[test]
    fn error_display() {
        let err = CoreError::PermissionDenied("task belongs to another user".into());
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(CoreError::from(io), CoreError::Storage(_)));
    }
}
