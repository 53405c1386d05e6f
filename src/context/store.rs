//! Context storage and scoped installation.

use super::snapshot::{ContextMap, ContextSnapshot};
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Option<Arc<ContextMap>>> = const { RefCell::new(None) };
}

/// Read/replace access to an ambient context.
///
/// Implementations must keep contexts isolated per thread (or per logical
/// execution); the only sanctioned way to move a context between threads is a
/// snapshot carried by the task itself.
pub trait ContextStore: Send + Sync + 'static {
    fn current(&self) -> ContextSnapshot;

    /// Replace the context. An absent snapshot behaves like [`ContextStore::clear`].
    fn install(&self, snapshot: &ContextSnapshot);

    fn clear(&self);
}

/// The process-wide thread-local context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalContext;

impl ContextStore for ThreadLocalContext {
    fn current(&self) -> ContextSnapshot {
        CURRENT.with(|current| ContextSnapshot::from_shared(current.borrow().clone()))
    }

    fn install(&self, snapshot: &ContextSnapshot) {
        CURRENT.with(|current| *current.borrow_mut() = snapshot.shared());
    }

    fn clear(&self) {
        CURRENT.with(|current| *current.borrow_mut() = None);
    }
}

// Mutations copy the map when a snapshot still shares it, so captured
// snapshots never observe later writes.
pub(super) fn put(key: String, value: String) {
    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        let entries = current.get_or_insert_with(Default::default);
        Arc::make_mut(entries).insert(key, value);
    });
}

pub(super) fn get(key: &str) -> Option<String> {
    CURRENT.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|entries| entries.get(key).cloned())
    })
}

pub(super) fn remove(key: &str) -> Option<String> {
    CURRENT.with(|current| {
        current
            .borrow_mut()
            .as_mut()
            .and_then(|entries| Arc::make_mut(entries).remove(key))
    })
}

/// Installs a snapshot for the lifetime of the guard.
///
/// On drop the context that was current at [`ContextScope::enter`] is put back,
/// whether the scope ends normally or by a panic unwinding through it.
#[must_use = "the previous context is restored as soon as the scope is dropped"]
pub struct ContextScope<'a, S: ContextStore + ?Sized> {
    store: &'a S,
    previous: ContextSnapshot,
}

impl<'a, S: ContextStore + ?Sized> ContextScope<'a, S> {
    pub fn enter(store: &'a S, snapshot: &ContextSnapshot) -> Self {
        let previous = store.current();
        store.install(snapshot);
        Self { store, previous }
    }

    /// Context that will be restored when the scope ends.
    pub fn previous(&self) -> &ContextSnapshot {
        &self.previous
    }
}

impl<S: ContextStore + ?Sized> Drop for ContextScope<'_, S> {
    fn drop(&mut self) {
        self.store.install(&self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;
    use std::panic;
    use std::thread;

    #[test]
    fn test_put_after_capture_does_not_mutate_snapshot() {
        context::clear();
        context::put("key", "v1");
        let captured = context::current();

        context::put("key", "v2");

        assert_eq!(captured.get("key"), Some("v1"));
        assert_eq!(context::get("key").as_deref(), Some("v2"));
        context::clear();
    }

    #[test]
    fn test_contexts_do_not_leak_across_threads() {
        context::clear();
        context::put("owner", "main");

        let seen = thread::spawn(context::current).join().unwrap();

        assert!(seen.is_absent());
        assert_eq!(context::get("owner").as_deref(), Some("main"));
        context::clear();
    }

    #[test]
    fn test_remove_keeps_context_present() {
        context::clear();
        context::put("key", "value");
        assert_eq!(context::remove("key").as_deref(), Some("value"));

        let current = context::current();
        assert!(!current.is_absent());
        assert!(current.is_empty());
        assert_eq!(context::remove("missing"), None);
        context::clear();
    }

    #[test]
    fn test_scopes_nest_and_restore() {
        context::clear();
        context::put("level", "outer");
        let inner: ContextSnapshot = [("level", "inner")].into_iter().collect();

        {
            let scope = ContextScope::enter(&ThreadLocalContext, &inner);
            assert_eq!(scope.previous().get("level"), Some("outer"));
            assert_eq!(context::get("level").as_deref(), Some("inner"));

            {
                let _absent = ContextScope::enter(&ThreadLocalContext, &ContextSnapshot::absent());
                assert!(context::current().is_absent());
            }

            assert_eq!(context::get("level").as_deref(), Some("inner"));
        }

        assert_eq!(context::get("level").as_deref(), Some("outer"));
        context::clear();
    }

    #[test]
    fn test_scope_restores_absent_context_after_panic() {
        context::clear();
        let snapshot: ContextSnapshot = [("key", "value")].into_iter().collect();

        let result = panic::catch_unwind(|| {
            let _scope = ContextScope::enter(&ThreadLocalContext, &snapshot);
            assert_eq!(context::get("key").as_deref(), Some("value"));
            panic!("task body failed");
        });

        assert!(result.is_err());
        assert!(context::current().is_absent());
    }
}
