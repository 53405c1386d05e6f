//! # Ambient Logging Context
//!
//! A per-thread key/value map (the mapped diagnostic context) that logging code
//! reads to decorate its output with correlation fields such as request ids.
//!
//! ## Overview
//!
//! - [`ContextSnapshot`]: immutable copy of a context, or the explicit
//!   absence of one. An empty map and "no context" are different values.
//! - [`ContextStore`]: the seam decorators use to read and replace the ambient
//!   context. [`ThreadLocalContext`] is the process default.
//! - [`ContextScope`]: installs a snapshot and restores the previous context
//!   when dropped, including during unwinding.
//!
//! ## Usage
//!
//! ```rust
//! use ambient_executors::context;
//!
//! context::put("request_id", "r-42");
//! let snapshot = context::current();
//! assert_eq!(snapshot.get("request_id"), Some("r-42"));
//!
//! context::clear();
//! assert!(context::current().is_absent());
//! ```

pub mod snapshot;
pub mod store;

pub use snapshot::{ContextMap, ContextSnapshot};
pub use store::{ContextScope, ContextStore, ThreadLocalContext};

/// Snapshot of the calling thread's context.
pub fn current() -> ContextSnapshot {
    ThreadLocalContext.current()
}

/// Replace the calling thread's context. Installing an absent snapshot clears it.
pub fn install(snapshot: &ContextSnapshot) {
    ThreadLocalContext.install(snapshot)
}

/// Remove every entry, leaving the thread with no context at all.
pub fn clear() {
    ThreadLocalContext.clear()
}

/// Set `key` on the calling thread, creating the context if absent.
pub fn put(key: impl Into<String>, value: impl Into<String>) {
    store::put(key.into(), value.into())
}

pub fn get(key: &str) -> Option<String> {
    store::get(key)
}

/// Remove `key`, returning its previous value.
pub fn remove(key: &str) -> Option<String> {
    store::remove(key)
}
