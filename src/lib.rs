#![allow(clippy::doc_markdown)] // Allow technical terms like MDC in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Ambient Executors
//!
//! Decorators for task executors that change only metadata and telemetry,
//! never scheduling.
//!
//! ## Overview
//!
//! - **Context propagation**: the logging context of the submitting thread is
//!   captured at submission and installed in the worker for the duration of
//!   the task, after which the worker's own context is restored.
//! - **Monitoring**: waiting and running tasks are counted and published under
//!   an object-name address in a management registry, from construction until
//!   shutdown.
//!
//! Both decorators wrap an executor the caller already has and compose in any
//! order.
//!
//! ## Module Organization
//!
//! - [`context`] - Per-thread logging context and scoped installation
//! - [`executor`] - Executor traits, task handles, tokio adapter
//! - [`propagation`] - Context-propagating decorator
//! - [`monitoring`] - Task counters and the monitored executor
//! - [`registry`] - Management registry and object-name addresses
//! - [`config`] - Configuration loading
//! - [`logging`] - Structured logging setup
//! - [`error`] - Crate-level error type
//! - [`test_helpers`] - Reference thread pool and latch for tests
//!
//! ## Quick Start
//!
//! ```rust
//! use ambient_executors::context;
//! use ambient_executors::executor::{ExecutorExt, ExecutorService};
//! use ambient_executors::monitoring::MonitoredExecutor;
//! use ambient_executors::propagation::decorate_service;
//! use ambient_executors::registry::{platform_registry, ManagementRegistry, WAITING_TASKS_COUNT};
//! use ambient_executors::test_helpers::FixedThreadPool;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let pool: Arc<dyn ExecutorService> = Arc::new(FixedThreadPool::new(2).unwrap());
//! let monitored = MonitoredExecutor::new(pool, "quickstart:service=workers");
//! let executor = decorate_service(monitored);
//!
//! context::put("request_id", "r-1");
//! let seen = executor.submit(|| context::get("request_id")).unwrap().join();
//! assert_eq!(seen, Ok(Some("r-1".to_string())));
//!
//! let registry = platform_registry();
//! assert_eq!(registry.attribute("quickstart:service=workers", WAITING_TASKS_COUNT), Ok(0));
//!
//! executor.shutdown();
//! assert!(executor.await_termination(Duration::from_secs(5)));
//! assert!(!registry.is_registered("quickstart:service=workers"));
//! # context::clear();
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod monitoring;
pub mod propagation;
pub mod registry;
pub mod test_helpers;

pub use config::{ContextConfig, ExecutorsConfig, MonitoringConfig};
pub use context::{ContextScope, ContextSnapshot, ContextStore, ThreadLocalContext};
pub use error::{AmbientError, Result};
pub use executor::{
    Executor, ExecutorError, ExecutorExt, ExecutorResult, ExecutorService, Task, TaskError,
    TaskHandle, TokioExecutor,
};
pub use monitoring::{MonitoredExecutor, MonitoringError, TaskCounter};
pub use propagation::{decorate_executor, decorate_service, ContextExecutor};
pub use registry::{
    platform_registry, ExecutorStats, InMemoryRegistry, ManagementRegistry, ObjectName,
    RegistryError,
};
