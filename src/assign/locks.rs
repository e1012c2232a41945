//! In-process mutual exclusion keyed by task chain.
//!
//! Two assignments inside the same parent chain run one after the other, so
//! the second one sees the counter written by the first.

use crate::types::TaskId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of per-root mutexes. Entries are dropped once nobody holds them.
#[derive(Debug, Default)]
pub struct ChainLocks {
    slots: Mutex<HashMap<TaskId, Arc<Mutex<()>>>>,
}

impl ChainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the mutex for `root`.
    pub fn with_chain<T>(&self, root: TaskId, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(root).or_default())
        };

        let result = {
            let _guard = lock(&slot);
            f()
        };

        let mut slots = lock(&self.slots);
        // Registry + our clone: nobody else is waiting on this root.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(&root);
        }
        result
    }

    /// Number of roots currently tracked.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A panic inside a chain section leaves no state behind to protect.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
