//! Count-down latch with timed waits.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Releases waiters once `count_down` has been called `count` times.
#[derive(Debug)]
pub struct CountDownLatch {
    remaining: Mutex<usize>,
    released: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining > 0 {
            *remaining -= 1;
            if *remaining == 0 {
                self.released.notify_all();
            }
        }
    }

    pub fn count(&self) -> usize {
        *self.remaining.lock()
    }

    /// Wait for the count to reach zero. Returns false on timeout.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            if self.released.wait_until(&mut remaining, deadline).timed_out() {
                return *remaining == 0;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_releases_after_count_reaches_zero() {
        let latch = Arc::new(CountDownLatch::new(2));
        let worker = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                latch.count_down();
                latch.count_down();
            })
        };

        assert!(latch.wait(Duration::from_secs(5)));
        worker.join().unwrap();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn test_wait_times_out() {
        let latch = CountDownLatch::new(1);
        assert!(!latch.wait(Duration::from_millis(20)));
    }
}
