//! Waiting/running task counters.

use crate::registry::ExecutorStats;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free task counters for one executor.
///
/// Each counter is individually exact under any amount of concurrent
/// mutation. The pair is not updated as one transaction, so a reader racing a
/// `task_started` may see the two values at slightly different instants.
#[derive(Debug, Default)]
pub struct TaskCounter {
    waiting: AtomicU64,
    running: AtomicU64,
    completed: AtomicU64,
    busy_nanos: AtomicU64,
}

/// Monotonic timestamp taken when a task starts running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StartMark(Instant);

impl StartMark {
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub waiting: u64,
    pub running: u64,
    pub completed: u64,
    pub busy_time_ms: u64,
}

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_added(&self) {
        self.waiting.fetch_add(1, Ordering::AcqRel);
    }

    /// Move one task from waiting to running.
    pub fn task_started(&self) -> StartMark {
        decrement(&self.waiting);
        self.running.fetch_add(1, Ordering::AcqRel);
        StartMark(Instant::now())
    }

    pub fn task_finished(&self, mark: StartMark) {
        decrement(&self.running);
        self.completed.fetch_add(1, Ordering::AcqRel);
        let busy = u64::try_from(mark.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.busy_nanos.fetch_add(busy, Ordering::Relaxed);
    }

    /// A waiting task that will never start.
    pub fn task_discarded(&self) {
        decrement(&self.waiting);
    }

    /// Start a task and finish it when the returned guard drops.
    pub fn start(&self) -> RunningTask<'_> {
        RunningTask {
            counter: self,
            mark: self.task_started(),
        }
    }

    pub fn running_tasks_count(&self) -> u64 {
        self.running.load(Ordering::Acquire)
    }

    pub fn waiting_tasks_count(&self) -> u64 {
        self.waiting.load(Ordering::Acquire)
    }

    pub fn completed_tasks_count(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Sum of the run time of every finished task.
    pub fn total_busy_time(&self) -> Duration {
        Duration::from_nanos(self.busy_nanos.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            waiting: self.waiting_tasks_count(),
            running: self.running_tasks_count(),
            completed: self.completed_tasks_count(),
            busy_time_ms: u64::try_from(self.total_busy_time().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl ExecutorStats for TaskCounter {
    fn running_tasks_count(&self) -> u64 {
        TaskCounter::running_tasks_count(self)
    }

    fn waiting_tasks_count(&self) -> u64 {
        TaskCounter::waiting_tasks_count(self)
    }

    fn completed_tasks_count(&self) -> u64 {
        TaskCounter::completed_tasks_count(self)
    }
}

// Saturating so an unbalanced caller can't wrap the counter around.
fn decrement(counter: &AtomicU64) {
    let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| {
        debug_assert!(value > 0, "task counter decremented below zero");
        Some(value.saturating_sub(1))
    });
}

/// A started task. Dropping the guard finishes it exactly once, on every exit
/// path including unwinding.
#[must_use = "the task is counted as finished as soon as the guard drops"]
#[derive(Debug)]
pub struct RunningTask<'a> {
    counter: &'a TaskCounter,
    mark: StartMark,
}

impl Drop for RunningTask<'_> {
    fn drop(&mut self) {
        self.counter.task_finished(self.mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lifecycle_transitions() {
        let counter = TaskCounter::new();

        counter.task_added();
        assert_eq!((counter.waiting_tasks_count(), counter.running_tasks_count()), (1, 0));

        let mark = counter.task_started();
        assert_eq!((counter.waiting_tasks_count(), counter.running_tasks_count()), (0, 1));

        counter.task_finished(mark);
        assert_eq!((counter.waiting_tasks_count(), counter.running_tasks_count()), (0, 0));
        assert_eq!(counter.completed_tasks_count(), 1);
    }

    #[test]
    fn test_guard_finishes_on_panic() {
        let counter = TaskCounter::new();
        counter.task_added();

        let result = panic::catch_unwind(|| {
            let _running = counter.start();
            panic!("task body failed");
        });

        assert!(result.is_err());
        assert_eq!(counter.running_tasks_count(), 0);
        assert_eq!(counter.completed_tasks_count(), 1);
    }

    #[test]
    fn test_discarded_task_leaves_waiting() {
        let counter = TaskCounter::new();
        counter.task_added();
        counter.task_added();

        counter.task_discarded();

        assert_eq!(counter.waiting_tasks_count(), 1);
        assert_eq!(counter.completed_tasks_count(), 0);
    }

    #[test]
    fn test_busy_time_accumulates() {
        let counter = TaskCounter::new();
        counter.task_added();
        {
            let _running = counter.start();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(counter.total_busy_time() >= Duration::from_millis(5));
        assert!(counter.snapshot().busy_time_ms >= 5);
    }

    #[test]
    fn test_no_lost_updates_under_contention() {
        let counter = Arc::new(TaskCounter::new());
        let threads = 8;
        let per_thread = 1_000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        counter.task_added();
                        let _running = counter.start();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.waiting_tasks_count(), 0);
        assert_eq!(counter.running_tasks_count(), 0);
        assert_eq!(counter.completed_tasks_count(), threads * per_thread);
    }
}
