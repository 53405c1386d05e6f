//! # Error Handling
//!
//! Each layer owns a focused error enum next to the code that raises it. This
//! module gathers them into a single [`AmbientError`] for callers that prefer
//! one error type at the application boundary.

use crate::config::ConfigurationError;
use crate::executor::{ExecutorError, TaskError};
use crate::monitoring::MonitoringError;
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum AmbientError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Monitoring(#[from] MonitoringError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, AmbientError>;
