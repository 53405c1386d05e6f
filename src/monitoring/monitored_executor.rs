//! Executor decorator that counts waiting and running tasks and publishes the
//! counts under an address in a [`ManagementRegistry`].

use super::{MonitoringError, TaskCounter};
use crate::config::MonitoringConfig;
use crate::executor::{Executor, ExecutorResult, ExecutorService, Task};
use crate::logging::log_registry_operation;
use crate::registry::{platform_registry, ExecutorStats, ManagementRegistry};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Monitored wrapper around an [`ExecutorService`].
///
/// Construction registers a live view of the counters; `shutdown` and
/// `shutdown_now` remove it before delegating. Registry failures are logged
/// and remembered, never returned: the executor stays fully usable, only
/// without external visibility.
pub struct MonitoredExecutor {
    delegate: Arc<dyn ExecutorService>,
    address: String,
    counter: Arc<TaskCounter>,
    stats: Arc<dyn ExecutorStats>,
    registry: Arc<dyn ManagementRegistry>,
    registered: AtomicBool,
    registration_error: Option<MonitoringError>,
    unregistration_error: Mutex<Option<MonitoringError>>,
}

impl MonitoredExecutor {
    /// Monitor `delegate` under `address` in the [`platform_registry`].
    pub fn new(delegate: Arc<dyn ExecutorService>, address: impl Into<String>) -> Arc<Self> {
        Self::with_registry(delegate, address, platform_registry())
    }

    pub fn with_registry(
        delegate: Arc<dyn ExecutorService>,
        address: impl Into<String>,
        registry: Arc<dyn ManagementRegistry>,
    ) -> Arc<Self> {
        Self::build(delegate, address.into(), registry, true)
    }

    /// Monitor under `"{domain}:service={name}"` with the configured domain.
    /// Registration is skipped entirely when monitoring is disabled.
    pub fn named(
        delegate: Arc<dyn ExecutorService>,
        name: &str,
        config: &MonitoringConfig,
    ) -> Arc<Self> {
        Self::build(delegate, config.address_for(name), platform_registry(), config.enabled)
    }

    fn build(
        delegate: Arc<dyn ExecutorService>,
        address: String,
        registry: Arc<dyn ManagementRegistry>,
        register: bool,
    ) -> Arc<Self> {
        let counter = Arc::new(TaskCounter::new());
        let stats: Arc<dyn ExecutorStats> = counter.clone();

        let registration_error = if register {
            match registry.register(&address, Arc::clone(&stats)) {
                Ok(()) => {
                    log_registry_operation("register", &address, "success", None);
                    None
                }
                Err(e) => {
                    let error = MonitoringError::from_registration(e);
                    warn!(
                        address = %address,
                        kind = error.kind(),
                        error = %error,
                        "Executor registration failed; continuing unmonitored"
                    );
                    Some(error)
                }
            }
        } else {
            debug!(address = %address, "Monitoring disabled; executor not registered");
            None
        };

        Arc::new(Self {
            delegate,
            registered: AtomicBool::new(register && registration_error.is_none()),
            address,
            counter,
            stats,
            registry,
            registration_error,
            unregistration_error: Mutex::new(None),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn counter(&self) -> &Arc<TaskCounter> {
        &self.counter
    }

    pub fn running_tasks_count(&self) -> u64 {
        self.counter.running_tasks_count()
    }

    pub fn waiting_tasks_count(&self) -> u64 {
        self.counter.waiting_tasks_count()
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Why construction-time registration failed, if it did.
    pub fn registration_error(&self) -> Option<&MonitoringError> {
        self.registration_error.as_ref()
    }

    pub fn unregistration_error(&self) -> Option<MonitoringError> {
        self.unregistration_error.lock().clone()
    }

    // Only the registration this executor made is removed, and only once;
    // after a conflict or an external re-registration the address belongs to
    // someone else.
    fn unregister(&self) {
        if !self.registered.swap(false, Ordering::AcqRel) {
            return;
        }
        match self.registry.unregister_stats(&self.address, &self.stats) {
            Ok(()) => log_registry_operation("unregister", &self.address, "success", None),
            Err(e) => {
                let error = MonitoringError::from_unregistration(e);
                warn!(
                    address = %self.address,
                    kind = error.kind(),
                    error = %error,
                    "Executor unregistration failed; shutting down anyway"
                );
                *self.unregistration_error.lock() = Some(error);
            }
        }
    }
}

impl std::fmt::Debug for MonitoredExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoredExecutor")
            .field("address", &self.address)
            .field("counter", &self.counter.snapshot())
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl Executor for MonitoredExecutor {
    fn execute(&self, task: Task) -> ExecutorResult<()> {
        let pending = PendingTask::new(Arc::clone(&self.counter), task);
        self.delegate.execute(Box::new(move || pending.run()))
    }

    fn propagates_context(&self) -> bool {
        self.delegate.propagates_context()
    }
}

impl ExecutorService for MonitoredExecutor {
    fn shutdown(&self) {
        self.unregister();
        self.delegate.shutdown()
    }

    fn shutdown_now(&self) -> Vec<Task> {
        self.unregister();
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

/// A submitted task counted as waiting.
///
/// Running it moves the count to running for the duration of the body. Dropping
/// it unrun (rejected by the delegate, drained by `shutdown_now`, abandoned)
/// takes it out of waiting, so no path leaves the counters inflated.
struct PendingTask {
    counter: Arc<TaskCounter>,
    body: Option<Task>,
}

impl PendingTask {
    fn new(counter: Arc<TaskCounter>, body: Task) -> Self {
        counter.task_added();
        Self {
            counter,
            body: Some(body),
        }
    }

    fn run(mut self) {
        if let Some(body) = self.body.take() {
            let _running = self.counter.start();
            body();
        }
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        if self.body.is_some() {
            self.counter.task_discarded();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorError, ExecutorExt};
    use crate::registry::{InMemoryRegistry, RUNNING_TASKS_COUNT, WAITING_TASKS_COUNT};
    use crate::test_helpers::{CountDownLatch, FixedThreadPool};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn pool(threads: usize) -> Arc<dyn ExecutorService> {
        Arc::new(FixedThreadPool::new(threads).unwrap())
    }

    #[test]
    fn test_registers_zeroed_counters_on_construction() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitored = MonitoredExecutor::with_registry(pool(1), "test:service=exe", registry.clone());

        assert!(monitored.is_registered());
        assert_eq!(registry.attribute("test:service=exe", RUNNING_TASKS_COUNT), Ok(0));
        assert_eq!(registry.attribute("test:service=exe", WAITING_TASKS_COUNT), Ok(0));

        monitored.shutdown_now();
        assert!(monitored.await_termination(TIMEOUT));
        assert!(!registry.is_registered("test:service=exe"));
    }

    #[test]
    fn test_counts_failed_task_as_finished() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitored = MonitoredExecutor::with_registry(pool(1), "test:service=panics", registry);

        let handle = monitored.submit(|| {
            panic!("task failed");
        }).unwrap();
        assert!(handle.join().is_err());

        monitored.shutdown();
        assert!(monitored.await_termination(TIMEOUT));
        assert_eq!(monitored.running_tasks_count(), 0);
        assert_eq!(monitored.waiting_tasks_count(), 0);
        assert_eq!(monitored.counter().completed_tasks_count(), 1);
    }

    #[test]
    fn test_conflicting_address_still_executes_tasks() {
        let registry = Arc::new(InMemoryRegistry::new());
        let first = MonitoredExecutor::with_registry(pool(1), "test:service=dup", registry.clone());
        let second = MonitoredExecutor::with_registry(pool(1), "test:service=dup", registry.clone());

        assert!(first.registration_error().is_none());
        assert!(matches!(
            second.registration_error(),
            Some(MonitoringError::RegistrationConflict { .. })
        ));
        assert_eq!(second.submit(|| 5).unwrap().join(), Ok(5));

        // the loser must not remove the winner's registration
        second.shutdown();
        assert!(registry.is_registered("test:service=dup"));
        assert!(second.unregistration_error().is_none());

        first.shutdown();
        assert!(!registry.is_registered("test:service=dup"));
    }

    #[test]
    fn test_malformed_address_is_reported() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitored = MonitoredExecutor::with_registry(pool(1), "no domain here", registry.clone());

        assert!(matches!(
            monitored.registration_error(),
            Some(MonitoringError::RegistrationMalformed { .. })
        ));
        assert!(registry.is_empty());
        assert_eq!(monitored.submit(|| "runs").unwrap().join(), Ok("runs"));
        monitored.shutdown();
    }

    #[test]
    fn test_external_unregistration_is_reported_on_shutdown() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitored = MonitoredExecutor::with_registry(pool(1), "test:service=gone", registry.clone());
        registry.unregister("test:service=gone").unwrap();

        monitored.shutdown();

        assert!(monitored.is_shutdown());
        assert!(matches!(
            monitored.unregistration_error(),
            Some(MonitoringError::UnregistrationNotFound { .. })
        ));
    }

    #[test]
    fn test_shutdown_leaves_later_registration_of_same_address() {
        let registry = Arc::new(InMemoryRegistry::new());
        let stale = MonitoredExecutor::with_registry(pool(1), "test:service=reused", registry.clone());
        registry.unregister("test:service=reused").unwrap();
        let current = MonitoredExecutor::with_registry(pool(1), "test:service=reused", registry.clone());
        assert!(current.registration_error().is_none());

        stale.shutdown();

        assert!(matches!(
            stale.unregistration_error(),
            Some(MonitoringError::UnregistrationNotFound { .. })
        ));
        assert!(registry.is_registered("test:service=reused"));

        current.shutdown();
        assert!(current.unregistration_error().is_none());
        assert!(!registry.is_registered("test:service=reused"));
    }

    #[test]
    fn test_rejected_task_is_not_left_waiting() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitored = MonitoredExecutor::with_registry(pool(1), "test:service=rejects", registry);
        monitored.shutdown();

        let result = monitored.execute(Box::new(|| {}));

        assert!(matches!(result, Err(ExecutorError::Rejected { .. })));
        assert_eq!(monitored.waiting_tasks_count(), 0);
    }

    #[test]
    fn test_drained_tasks_leave_waiting_count() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitored = MonitoredExecutor::with_registry(pool(1), "test:service=drain", registry);
        let started = Arc::new(CountDownLatch::new(1));
        let release = Arc::new(CountDownLatch::new(1));

        {
            let started = Arc::clone(&started);
            let release = Arc::clone(&release);
            monitored
                .execute(Box::new(move || {
                    started.count_down();
                    release.wait(TIMEOUT);
                }))
                .unwrap();
        }
        assert!(started.wait(TIMEOUT));
        for _ in 0..3 {
            monitored.execute(Box::new(|| {})).unwrap();
        }
        assert_eq!(monitored.waiting_tasks_count(), 3);

        let drained = monitored.shutdown_now();
        assert_eq!(drained.len(), 3);
        drop(drained);

        assert_eq!(monitored.waiting_tasks_count(), 0);
        assert_eq!(monitored.running_tasks_count(), 1);
        release.count_down();
        assert!(monitored.await_termination(TIMEOUT));
        assert_eq!(monitored.running_tasks_count(), 0);
    }

    #[test]
    fn test_disabled_monitoring_skips_registry() {
        let config = MonitoringConfig {
            enabled: false,
            domain: "disabled.test".to_string(),
        };
        let monitored = MonitoredExecutor::named(pool(1), "quiet", &config);

        assert_eq!(monitored.address(), "disabled.test:service=quiet");
        assert!(!monitored.is_registered());
        assert!(monitored.registration_error().is_none());
        assert!(!platform_registry().is_registered("disabled.test:service=quiet"));
        monitored.shutdown();
    }
}
