//! # Task Execution Abstraction
//!
//! The executor traits that every decorator in this crate consumes and
//! implements. The crate never schedules work itself: a caller hands in an
//! existing executor (a thread pool, a tokio runtime handle) and the decorators
//! wrap each task before passing it on.
//!
//! ## Architecture
//!
//! ```text
//! Executor              fire-and-forget submission
//! └── ExecutorService   + shutdown / shutdown_now / await_termination
//!
//! ExecutorExt           future-returning submit() for any Executor
//! ```

pub mod handle;
pub mod tokio_adapter;

pub use handle::TaskHandle;
pub use tokio_adapter::TokioExecutor;

use std::sync::Arc;
use std::time::Duration;

/// A unit of work. A panic escaping the closure is the task's failure.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;

/// Errors raised at submission time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task rejected by {executor}: {reason}")]
    Rejected { executor: String, reason: String },

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

impl ExecutorError {
    pub fn rejected(executor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            executor: executor.into(),
            reason: reason.into(),
        }
    }
}

/// How a submitted task ended, as observed through its [`TaskHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// The task was dropped without running (rejected or drained on shutdown).
    #[error("Task was cancelled before it ran")]
    Cancelled,
}

/// Accepts tasks for asynchronous execution.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task) -> ExecutorResult<()>;

    /// Whether submissions already carry the submitter's ambient context
    /// into the worker. Decorating such an executor again is a no-op.
    fn propagates_context(&self) -> bool {
        false
    }
}

/// An executor with a managed lifecycle.
pub trait ExecutorService: Executor {
    /// Stop accepting tasks; already-queued tasks still run.
    fn shutdown(&self);

    /// Stop accepting tasks and return the queued tasks that never started.
    fn shutdown_now(&self) -> Vec<Task>;

    fn is_shutdown(&self) -> bool;

    /// True once shut down and every started task has finished.
    fn is_terminated(&self) -> bool;

    /// Block until terminated or until `timeout` elapses. Returns whether the
    /// executor terminated.
    fn await_termination(&self, timeout: Duration) -> bool;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Task) -> ExecutorResult<()> {
        (**self).execute(task)
    }

    fn propagates_context(&self) -> bool {
        (**self).propagates_context()
    }
}

impl<E: ExecutorService + ?Sized> ExecutorService for Arc<E> {
    fn shutdown(&self) {
        (**self).shutdown()
    }

    fn shutdown_now(&self) -> Vec<Task> {
        (**self).shutdown_now()
    }

    fn is_shutdown(&self) -> bool {
        (**self).is_shutdown()
    }

    fn is_terminated(&self) -> bool {
        (**self).is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        (**self).await_termination(timeout)
    }
}

/// Future-returning submission, available on every [`Executor`].
pub trait ExecutorExt: Executor {
    /// Submit `work` and get a handle to its result.
    ///
    /// The value returned by `work` reaches the handle unchanged; a panic
    /// resolves it with [`TaskError::Panicked`].
    fn submit<F, T>(&self, work: F) -> ExecutorResult<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (completion, handle) = handle::channel();
        self.execute(Box::new(move || completion.complete(work)))?;
        Ok(handle)
    }
}

impl<E: Executor + ?Sized> ExecutorExt for E {}
