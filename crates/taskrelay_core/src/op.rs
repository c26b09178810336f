//! Operation-kind classification for replay dispatch.

/// The logical kind of a recorded offline operation.
///
/// Replay dispatches on this enum rather than comparing endpoint
/// strings inline, so adding an operation kind is a compile-time
/// decision: every `match` on this type must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// The operation creates a task.
    CreateTask,
    /// An endpoint the reconciler does not interpret. The ledger entry
    /// is still recorded and acknowledged.
    Unknown,
}

impl OperationKind {
    /// Classifies a logical endpoint tag.
    ///
    /// `/posts` is the tag older clients used for the same create-task
    /// operation and stays accepted.
    #[must_use]
    pub fn classify(endpoint: &str) -> Self {
        match endpoint {
            "/tasks" | "/posts" => Self::CreateTask,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_endpoints_classify_as_create() {
        assert_eq!(OperationKind::classify("/tasks"), OperationKind::CreateTask);
        assert_eq!(OperationKind::classify("/posts"), OperationKind::CreateTask);
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(OperationKind::classify("/notes"), OperationKind::Unknown);
        assert_eq!(OperationKind::classify(""), OperationKind::Unknown);
        assert_eq!(OperationKind::classify("/tasks/1"), OperationKind::Unknown);
    }
}
