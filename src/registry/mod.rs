//! # Management Registry
//!
//! Process-wide directory that maps an object-name address to a live view of
//! an executor's task counters, so inspection tooling can read the counters
//! by address without holding a reference to the executor.
//!
//! ## Overview
//!
//! - [`ManagementRegistry`]: the injectable registry contract.
//! - [`InMemoryRegistry`]: concurrent implementation backed by `DashMap`.
//! - [`platform_registry`]: the shared instance monitored executors use by default.
//! - [`ObjectName`]: address parsing and canonicalisation (`domain:key=value,...`).
//!
//! ## Usage
//!
//! ```rust
//! use ambient_executors::monitoring::TaskCounter;
//! use ambient_executors::registry::{InMemoryRegistry, ManagementRegistry, RUNNING_TASKS_COUNT};
//! use std::sync::Arc;
//!
//! let registry = InMemoryRegistry::new();
//! let counter = Arc::new(TaskCounter::new());
//! registry.register("app:service=indexer", counter.clone()).unwrap();
//!
//! assert_eq!(registry.attribute("app:service=indexer", RUNNING_TASKS_COUNT), Ok(0));
//! ```

pub mod in_memory;
pub mod object_name;

pub use in_memory::{platform_registry, InMemoryRegistry};
pub use object_name::ObjectName;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const RUNNING_TASKS_COUNT: &str = "RunningTasksCount";
pub const WAITING_TASKS_COUNT: &str = "WaitingTasksCount";
pub const COMPLETED_TASKS_COUNT: &str = "CompletedTasksCount";

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Address '{address}' is already registered")]
    AlreadyRegistered { address: String },

    #[error("Malformed address '{address}': {reason}")]
    MalformedAddress { address: String, reason: String },

    #[error("Address '{address}' is not registered")]
    NotFound { address: String },

    #[error("Attribute '{attribute}' not found on '{address}'")]
    AttributeNotFound { address: String, attribute: String },
}

/// Read-only counters an executor publishes under its address.
pub trait ExecutorStats: Send + Sync {
    fn running_tasks_count(&self) -> u64;

    fn waiting_tasks_count(&self) -> u64;

    fn completed_tasks_count(&self) -> u64 {
        0
    }
}

/// Serializable reading of one registered executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatsSnapshot {
    pub running_tasks_count: u64,
    pub waiting_tasks_count: u64,
    pub completed_tasks_count: u64,
}

impl StatsSnapshot {
    pub fn read(stats: &dyn ExecutorStats) -> Self {
        Self {
            running_tasks_count: stats.running_tasks_count(),
            waiting_tasks_count: stats.waiting_tasks_count(),
            completed_tasks_count: stats.completed_tasks_count(),
        }
    }
}

/// Every registration at one instant, keyed by canonical address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub collected_at: String,
    pub executors: BTreeMap<String, StatsSnapshot>,
}

impl RegistrySnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Address → counters directory.
///
/// Implementations must be safe under concurrent register/unregister calls and
/// must reject a second live registration of the same address cleanly.
pub trait ManagementRegistry: Send + Sync {
    fn register(&self, address: &str, stats: Arc<dyn ExecutorStats>) -> RegistryResult<()>;

    fn unregister(&self, address: &str) -> RegistryResult<()>;

    /// Remove the registration only if `address` still maps to `stats`.
    ///
    /// An entry registered by someone else under the same address is left in
    /// place and reported as [`RegistryError::NotFound`].
    fn unregister_stats(&self, address: &str, stats: &Arc<dyn ExecutorStats>)
        -> RegistryResult<()>;

    fn lookup(&self, address: &str) -> RegistryResult<Arc<dyn ExecutorStats>>;

    /// Canonical addresses of all live registrations.
    fn addresses(&self) -> Vec<String>;

    fn is_registered(&self, address: &str) -> bool {
        self.lookup(address).is_ok()
    }

    /// Read one named attribute, the way an inspection endpoint would.
    fn attribute(&self, address: &str, attribute: &str) -> RegistryResult<u64> {
        let stats = self.lookup(address)?;
        match attribute {
            RUNNING_TASKS_COUNT => Ok(stats.running_tasks_count()),
            WAITING_TASKS_COUNT => Ok(stats.waiting_tasks_count()),
            COMPLETED_TASKS_COUNT => Ok(stats.completed_tasks_count()),
            _ => Err(RegistryError::AttributeNotFound {
                address: address.to_string(),
                attribute: attribute.to_string(),
            }),
        }
    }

    fn snapshot(&self) -> RegistrySnapshot {
        let executors = self
            .addresses()
            .into_iter()
            .filter_map(|address| {
                // skip entries unregistered since addresses() was taken
                let stats = self.lookup(&address).ok()?;
                Some((address, StatsSnapshot::read(stats.as_ref())))
            })
            .collect();

        RegistrySnapshot {
            collected_at: chrono::Utc::now().to_rfc3339(),
            executors,
        }
    }
}
