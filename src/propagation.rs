//! # Context Propagation
//!
//! Decorator that carries the submitting thread's logging context into the
//! worker that runs the task.
//!
//! On submission the current context is captured as a [`ContextSnapshot`] and
//! moved into the task. On the worker the snapshot replaces whatever context
//! the worker had (an absent snapshot clears it), the task body runs, and the
//! worker's own context is put back afterwards, even when the body panics.
//!
//! Only work submitted through the decorator is covered: continuations that a
//! runtime schedules on its own bypass it.
//!
//! ## Usage
//!
//! ```rust
//! use ambient_executors::context;
//! use ambient_executors::executor::{ExecutorExt, ExecutorService};
//! use ambient_executors::propagation::decorate_service;
//! use ambient_executors::test_helpers::FixedThreadPool;
//! use std::sync::Arc;
//!
//! let pool: Arc<dyn ExecutorService> = Arc::new(FixedThreadPool::new(1).unwrap());
//! let executor = decorate_service(pool);
//!
//! context::put("request_id", "r-7");
//! let seen = executor.submit(|| context::get("request_id")).unwrap().join();
//! assert_eq!(seen, Ok(Some("r-7".to_string())));
//! # context::clear();
//! # executor.shutdown();
//! ```

use crate::config::ContextConfig;
use crate::context::{ContextScope, ContextSnapshot, ContextStore, ThreadLocalContext};
use crate::executor::{Executor, ExecutorResult, ExecutorService, Task};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug_span, Span};

/// Wrap `executor` so its tasks run with the submitter's context.
///
/// Returns `executor` itself when it already propagates context.
pub fn decorate_executor(executor: Arc<dyn Executor>) -> Arc<dyn Executor> {
    if executor.propagates_context() {
        executor
    } else {
        Arc::new(ContextExecutor::new(executor))
    }
}

/// [`decorate_executor`] for executors with a lifecycle.
pub fn decorate_service(executor: Arc<dyn ExecutorService>) -> Arc<dyn ExecutorService> {
    if executor.propagates_context() {
        executor
    } else {
        Arc::new(ContextExecutor::new(executor))
    }
}

/// Context-propagating decorator over any [`Executor`].
///
/// Lifecycle calls pass straight through when the delegate is an
/// [`ExecutorService`].
#[derive(Debug, Clone)]
pub struct ContextExecutor<E, S = ThreadLocalContext> {
    delegate: E,
    store: S,
    trace_spans: bool,
}

impl<E: Executor> ContextExecutor<E> {
    pub fn new(delegate: E) -> Self {
        Self::with_store(delegate, ThreadLocalContext)
    }

    pub fn with_config(delegate: E, config: &ContextConfig) -> Self {
        let mut executor = Self::new(delegate);
        executor.trace_spans = config.trace_spans;
        executor
    }
}

impl<E: Executor, S: ContextStore + Clone> ContextExecutor<E, S> {
    /// Decorate with a non-default context store.
    pub fn with_store(delegate: E, store: S) -> Self {
        Self {
            delegate,
            store,
            trace_spans: false,
        }
    }

    /// Run each task body inside a `task_context` span carrying the snapshot.
    pub fn trace_spans(mut self, enabled: bool) -> Self {
        self.trace_spans = enabled;
        self
    }

    pub fn delegate(&self) -> &E {
        &self.delegate
    }
}

impl<E: Executor, S: ContextStore + Clone> Executor for ContextExecutor<E, S> {
    fn execute(&self, task: Task) -> ExecutorResult<()> {
        let snapshot = self.store.current();
        let store = self.store.clone();
        let trace_spans = self.trace_spans;
        self.delegate
            .execute(Box::new(move || run_with_context(&store, &snapshot, trace_spans, task)))
    }

    fn propagates_context(&self) -> bool {
        true
    }
}

impl<E: ExecutorService, S: ContextStore + Clone> ExecutorService for ContextExecutor<E, S> {
    fn shutdown(&self) {
        self.delegate.shutdown()
    }

    fn shutdown_now(&self) -> Vec<Task> {
        self.delegate.shutdown_now()
    }

    fn is_shutdown(&self) -> bool {
        self.delegate.is_shutdown()
    }

    fn is_terminated(&self) -> bool {
        self.delegate.is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        self.delegate.await_termination(timeout)
    }
}

fn run_with_context<S: ContextStore>(
    store: &S,
    snapshot: &ContextSnapshot,
    trace_spans: bool,
    task: Task,
) {
    // Declared first so it drops last: the span closes before the worker's
    // context comes back.
    let _scope = ContextScope::enter(store, snapshot);
    let span = if trace_spans {
        debug_span!("task_context", context = %snapshot)
    } else {
        Span::none()
    };
    let _entered = span.enter();
    task();
}
