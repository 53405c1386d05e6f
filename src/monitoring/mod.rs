//! # Executor Monitoring
//!
//! Task counters and the monitored executor decorator that publishes them.
//!
//! ## Task lifecycle
//!
//! ```text
//! submitted ──task_added──▶ waiting ──task_started──▶ running ──task_finished──▶ done
//!                              │
//!                              └──task_discarded──▶ done   (rejected / drained / dropped)
//! ```
//!
//! A task is counted in at most one of `waiting` and `running` at any instant.
//!
//! Registry failures never reach the caller: telemetry must not gate task
//! execution, so they are logged and kept on the executor for inspection.

pub mod counter;
pub mod monitored_executor;

pub use counter::{CounterSnapshot, RunningTask, StartMark, TaskCounter};
pub use monitored_executor::MonitoredExecutor;

use crate::registry::RegistryError;

/// Registry failures as seen by the monitoring layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitoringError {
    #[error("Registration conflict: '{address}' is already registered")]
    RegistrationConflict { address: String },

    #[error("Registration failed, malformed address '{address}': {reason}")]
    RegistrationMalformed { address: String, reason: String },

    #[error("Unregistration failed: '{address}' is not registered")]
    UnregistrationNotFound { address: String },

    #[error("Registry error: {0}")]
    Registry(RegistryError),
}

impl MonitoringError {
    pub(crate) fn from_registration(error: RegistryError) -> Self {
        match error {
            RegistryError::AlreadyRegistered { address } => Self::RegistrationConflict { address },
            RegistryError::MalformedAddress { address, reason } => {
                Self::RegistrationMalformed { address, reason }
            }
            other => Self::Registry(other),
        }
    }

    pub(crate) fn from_unregistration(error: RegistryError) -> Self {
        match error {
            RegistryError::NotFound { address } => Self::UnregistrationNotFound { address },
            other => Self::Registry(other),
        }
    }

    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegistrationConflict { .. } => "registration_conflict",
            Self::RegistrationMalformed { .. } => "registration_malformed",
            Self::UnregistrationNotFound { .. } => "unregistration_not_found",
            Self::Registry(_) => "registry",
        }
    }
}
