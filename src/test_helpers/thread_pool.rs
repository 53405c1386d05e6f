//! Fixed-size worker pool implementing [`ExecutorService`].

use crate::executor::handle::panic_message;
use crate::executor::{Executor, ExecutorError, ExecutorResult, ExecutorService, Task};
use crate::logging::log_error;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A pool of `n` threads draining one unbounded FIFO queue.
///
/// A panicking task is logged and its worker keeps going. `shutdown_now`
/// cannot interrupt a running task; it only stops workers from picking up
/// more and hands back what was still queued.
pub struct FixedThreadPool {
    sender: Mutex<Option<Sender<Task>>>,
    receiver: Receiver<Task>,
    shared: Arc<Shared>,
}

struct Shared {
    stop_now: AtomicBool,
    live_workers: Mutex<usize>,
    terminated: Condvar,
}

impl FixedThreadPool {
    pub fn new(threads: usize) -> ExecutorResult<Self> {
        if threads == 0 {
            return Err(ExecutorError::InvalidArgument(
                "thread pool needs at least one worker".to_string(),
            ));
        }

        let (sender, receiver) = channel::unbounded::<Task>();
        let shared = Arc::new(Shared {
            stop_now: AtomicBool::new(false),
            live_workers: Mutex::new(0),
            terminated: Condvar::new(),
        });

        for index in 0..threads {
            let worker_receiver = receiver.clone();
            let worker_shared = Arc::clone(&shared);
            *shared.live_workers.lock() += 1;
            let spawned = thread::Builder::new()
                .name(format!("pool-worker-{index}"))
                .spawn(move || worker_loop(worker_receiver, worker_shared));
            if let Err(e) = spawned {
                *shared.live_workers.lock() -= 1;
                log_error("FixedThreadPool", "spawn_worker", &e.to_string(), None);
                // dropping the sender releases the workers already started
                return Err(ExecutorError::WorkerSpawn(e.to_string()));
            }
        }
        debug!(threads, "Started fixed thread pool");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            shared,
        })
    }
}

impl std::fmt::Debug for FixedThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedThreadPool")
            .field("queued", &self.receiver.len())
            .field("live_workers", &*self.shared.live_workers.lock())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn worker_loop(receiver: Receiver<Task>, shared: Arc<Shared>) {
    while !shared.stop_now.load(Ordering::Acquire) {
        let Ok(task) = receiver.recv() else {
            break;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            warn!(
                worker = thread::current().name().unwrap_or("unnamed"),
                panic = %panic_message(payload.as_ref()),
                "Task panicked"
            );
        }
    }

    let mut live = shared.live_workers.lock();
    *live -= 1;
    if *live == 0 {
        shared.terminated.notify_all();
    }
}

impl Executor for FixedThreadPool {
    fn execute(&self, task: Task) -> ExecutorResult<()> {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(ExecutorError::rejected("FixedThreadPool", "pool is shut down"));
        };
        sender
            .send(task)
            .map_err(|_| ExecutorError::rejected("FixedThreadPool", "all workers have exited"))
    }
}

impl ExecutorService for FixedThreadPool {
    fn shutdown(&self) {
        self.sender.lock().take();
    }

    fn shutdown_now(&self) -> Vec<Task> {
        self.shared.stop_now.store(true, Ordering::Release);
        self.sender.lock().take();
        self.receiver.try_iter().collect()
    }

    fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn is_terminated(&self) -> bool {
        self.is_shutdown() && *self.shared.live_workers.lock() == 0
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut live = self.shared.live_workers.lock();
        while *live > 0 {
            if self.shared.terminated.wait_until(&mut live, deadline).timed_out() {
                return *live == 0;
            }
        }
        true
    }
}

impl Drop for FixedThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
