//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(10);

static NEXT_ADDRESS: AtomicUsize = AtomicUsize::new(0);

/// An address no other test in this binary uses, so tests can share the
/// process-wide registry.
pub fn unique_address(service: &str) -> String {
    let id = NEXT_ADDRESS.fetch_add(1, Ordering::Relaxed);
    format!("base.test:service={service},instance={id}")
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
