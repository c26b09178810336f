//! # TaskRelay Testkit
//!
//! Shared fixtures for workspace tests: pre-wired stores with automatic
//! cleanup and builders for submitted-operation batches.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;
use taskrelay_core::{HttpMethod, SubmittedOperation, Task, UserId};
use taskrelay_store::{FileStoreConfig, RelayStore, TaskStore};
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Arc<RelayStore>,
    // Kept alive so the data directory outlives file-backed tests.
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(RelayStore::in_memory()),
            _temp_dir: None,
        }
    }

    /// Creates a file-backed test store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let config = FileStoreConfig {
            create_if_missing: true,
            sync_on_commit: false,
        };
        let store = RelayStore::open(temp_dir.path(), config)
            .expect("failed to open file-backed store");
        Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Persists `count` tasks for `owner`, titled `task 0..count`.
    pub fn seed_tasks(&self, owner: UserId, count: usize) -> Vec<Task> {
        (0..count)
            .map(|i| {
                let task = Task::new(owner, &format!("task {i}"), "seeded", None)
                    .expect("seed task is valid");
                TaskStore::insert(self.store.as_ref(), task).expect("seed insert")
            })
            .collect()
    }
}

/// Builds a create-task operation the way offline clients record them.
pub fn task_operation(client_id: &str, title: &str, body: &str) -> SubmittedOperation {
    SubmittedOperation {
        id: Some(client_id.to_string()),
        url: "/api/tasks".to_string(),
        method: HttpMethod::Post,
        endpoint: "/tasks".to_string(),
        payload: serde_json::json!({"title": title, "body": body}),
    }
}

/// Builds an operation targeting an endpoint the reconciler does not
/// interpret.
pub fn opaque_operation(client_id: &str, endpoint: &str) -> SubmittedOperation {
    SubmittedOperation {
        id: Some(client_id.to_string()),
        url: format!("/api{endpoint}"),
        method: HttpMethod::Post,
        endpoint: endpoint.to_string(),
        payload: serde_json::json!({"opaque": true}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_empty() {
        let fixture = TestStore::memory();
        let owner = UserId::new();
        let (page, total) =
            TaskStore::list(fixture.store.as_ref(), owner, None, 50, 0).unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn seeded_tasks_are_visible() {
        let fixture = TestStore::memory();
        let owner = UserId::new();
        fixture.seed_tasks(owner, 3);

        let (_, total) = TaskStore::list(fixture.store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 3);
    }

    #[test]
    fn file_store_fixture_works() {
        let fixture = TestStore::file();
        let owner = UserId::new();
        fixture.seed_tasks(owner, 1);

        let (_, total) = TaskStore::list(fixture.store.as_ref(), owner, None, 50, 0).unwrap();
        assert_eq!(total, 1);
    }
}
