//! Result handles for submitted tasks.

use super::TaskError;
use futures::channel::oneshot;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

type Outcome<T> = Result<T, TaskError>;

pub(crate) fn channel<T>() -> (Completion<T>, TaskHandle<T>) {
    let (sender, receiver) = oneshot::channel();
    (Completion { sender }, TaskHandle { receiver })
}

/// Producer side, moved into the task closure.
pub(crate) struct Completion<T> {
    sender: oneshot::Sender<Outcome<T>>,
}

impl<T> Completion<T> {
    pub(crate) fn complete<F: FnOnce() -> T>(self, work: F) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(work))
            .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())));
        // The caller may have dropped the handle; nobody is left to tell.
        let _ = self.sender.send(outcome);
    }
}

/// Handle to the eventual result of a submitted task.
///
/// Await it from async code or [`TaskHandle::join`] it from a plain thread.
/// If the task is dropped without running the handle resolves with
/// [`TaskError::Cancelled`].
#[must_use = "dropping the handle discards the task's result"]
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

impl<T> TaskHandle<T> {
    /// Block the current thread until the task completes.
    pub fn join(self) -> Outcome<T> {
        futures::executor::block_on(self)
    }

    /// The result if the task already completed, `None` while it is pending.
    pub fn try_join(&mut self) -> Option<Outcome<T>> {
        match self.receiver.try_recv() {
            Ok(Some(outcome)) => Some(outcome),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(TaskError::Cancelled)),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Cancelled)))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
