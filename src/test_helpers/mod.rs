//! # Test Helpers
//!
//! Reference executors and synchronisation aids shared by unit tests,
//! integration tests and documentation examples. The pool here exists so the
//! decorators have something real to wrap; it makes no attempt at being a
//! tuned production pool.

pub mod latch;
pub mod thread_pool;

pub use latch::CountDownLatch;
pub use thread_pool::FixedThreadPool;
