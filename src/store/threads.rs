//! Thread collection that raises lifecycle events on its members.

use crate::model::{PostId, ThreadHandle};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Tracked collection of threads.
///
/// Adding a thread raises [`ThreadEvent::Added`](crate::model::ThreadEvent::Added)
/// on it; removing raises `Removed`. Events are raised after the collection
/// borrow is released so handlers may query the registry.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: RefCell<BTreeMap<PostId, ThreadHandle>>,
}

impl ThreadRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `thread`, replacing any thread with the same id, and raise `Added` on it.
    pub fn add(&self, thread: ThreadHandle) {
        let id = thread.id();
        let previous = self
            .threads
            .borrow_mut()
            .insert(id, Rc::clone(&thread));
        debug!(thread = %id, replaced = previous.is_some(), "thread added");
        thread.notify_added();
    }

    /// Stop tracking thread `id` and raise `Removed` on it. `None` if it was not tracked.
    pub fn remove(&self, id: PostId) -> Option<ThreadHandle> {
        let removed = self.threads.borrow_mut().remove(&id);
        if let Some(thread) = &removed {
            debug!(thread = %id, "thread removed");
            thread.notify_removed();
        }
        removed
    }

    /// Tracked thread `id`.
    pub fn get(&self, id: PostId) -> Option<ThreadHandle> {
        self.threads.borrow().get(&id).cloned()
    }

    /// Tracked thread ids in ascending order.
    pub fn ids(&self) -> Vec<PostId> {
        self.threads.borrow().keys().copied().collect()
    }

    /// Number of tracked threads.
    pub fn len(&self) -> usize {
        self.threads.borrow().len()
    }

    /// Whether no thread is tracked.
    pub fn is_empty(&self) -> bool {
        self.threads.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Thread, ThreadAttributes, ThreadEvent};

    fn id(n: u64) -> PostId {
        PostId::new(n).expect("non-zero id")
    }

    #[test]
    fn add_and_remove_raise_lifecycle_events() {
        let registry = ThreadRegistry::new();
        let thread = Thread::new(ThreadAttributes::new(id(1)));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = thread.subscribe(move |event| sink.borrow_mut().push(*event));

        registry.add(Rc::clone(&thread));
        assert_eq!(registry.len(), 1);
        let removed = registry.remove(id(1));

        assert!(removed.is_some());
        assert!(registry.is_empty());
        assert_eq!(*seen.borrow(), vec![ThreadEvent::Added, ThreadEvent::Removed]);
    }

    #[test]
    fn handler_may_query_registry_during_add() {
        let registry = Rc::new(ThreadRegistry::new());
        let thread = Thread::new(ThreadAttributes::new(id(4)));
        let found = Rc::new(RefCell::new(false));

        let lookup = Rc::downgrade(&registry);
        let flag = Rc::clone(&found);
        let _sub = thread.subscribe_once(move |_| {
            if let Some(registry) = lookup.upgrade() {
                *flag.borrow_mut() = registry.get(id(4)).is_some();
            }
        });
        registry.add(thread);

        assert!(*found.borrow());
    }

    #[test]
    fn removing_unknown_thread_returns_none() {
        let registry = ThreadRegistry::new();
        assert!(registry.remove(id(8)).is_none());
    }
}
