//! Executor over a tokio runtime's blocking pool.

use super::{Executor, ExecutorError, ExecutorResult, Task};
use tokio::runtime::Handle;

/// Runs each task with [`Handle::spawn_blocking`], so blocking task bodies
/// never stall the async workers.
///
/// Lifecycle belongs to the runtime, hence this is only an [`Executor`].
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime the caller is running in.
    pub fn current() -> ExecutorResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| ExecutorError::InvalidArgument(format!("no tokio runtime: {e}")))
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: Task) -> ExecutorResult<()> {
        // Detached: results travel through TaskHandle, not the JoinHandle.
        drop(self.handle.spawn_blocking(task));
        Ok(())
    }
}
