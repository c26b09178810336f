//! Property tests for list pagination.

use proptest::prelude::*;
use std::sync::Arc;
use taskrelay_core::{Task, UserId};
use taskrelay_store::{RelayStore, TaskStore};

fn store_with_tasks(owner: UserId, count: usize) -> Arc<RelayStore> {
    let store = Arc::new(RelayStore::in_memory());
    for i in 0..count {
        let task = Task::new(owner, &format!("task {i}"), "body", None).unwrap();
        store.insert(task).unwrap();
    }
    store
}

proptest! {
    #[test]
    fn page_size_and_has_more_are_consistent(
        total in 0usize..40,
        limit in 1usize..20,
        offset in 0usize..60,
    ) {
        let owner = UserId::new();
        let store = store_with_tasks(owner, total);

        let (page, reported_total) = store.list(owner, None, limit, offset).unwrap();

        prop_assert_eq!(reported_total, total);
        prop_assert_eq!(page.len(), total.saturating_sub(offset).min(limit));

        // hasMore is defined as offset + limit < total; an offset past
        // the end always reports an empty page with nothing more.
        let has_more = offset + limit < total;
        if offset >= total {
            prop_assert!(page.is_empty());
            prop_assert!(!has_more);
        }
        if has_more {
            prop_assert_eq!(page.len(), limit);
        }
    }

    #[test]
    fn pages_tile_the_full_listing(total in 0usize..30, limit in 1usize..10) {
        let owner = UserId::new();
        let store = store_with_tasks(owner, total);

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let (page, _) = store.list(owner, None, limit, offset).unwrap();
            if page.is_empty() {
                break;
            }
            offset += page.len();
            seen.extend(page.into_iter().map(|t| t.id));
        }

        prop_assert_eq!(seen.len(), total);
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), total);
    }
}
