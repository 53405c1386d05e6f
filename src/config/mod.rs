//! # Configuration
//!
//! Settings for the decorators, loaded with the `config` crate from an
//! optional TOML file and `AMBIENT__`-prefixed environment variables. Every
//! field has a default, so an empty environment yields a working setup.
//!
//! ```toml
//! [monitoring]
//! enabled = true
//! domain = "billing"
//!
//! [context]
//! trace_spans = true
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ambient_executors::config::ExecutorsConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExecutorsConfig::load()?;
//! let address = config.monitoring.address_for("indexer");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorsConfig {
    pub monitoring: MonitoringConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Register monitored executors in the management registry.
    pub enabled: bool,
    /// Object-name domain for executors created by name.
    pub domain: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            domain: "ambient.executors".to_string(),
        }
    }
}

impl MonitoringConfig {
    pub fn address_for(&self, name: &str) -> String {
        format!("{}:service={name}", self.domain)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Open a `task_context` tracing span around each propagated task body.
    pub trace_spans: bool,
}

impl ExecutorsConfig {
    /// Load from `AMBIENT_CONFIG_PATH` (or `config/ambient.toml`) plus
    /// `AMBIENT__*` environment overrides.
    pub fn load() -> ConfigResult<Self> {
        ConfigLoader::from_environment().load()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let domain = &self.monitoring.domain;
        if domain.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "monitoring.domain",
                domain,
                "domain must not be empty",
            ));
        }
        if domain.contains([':', '*', '?', ',', '=', '\n']) {
            return Err(ConfigurationError::invalid_value(
                "monitoring.domain",
                domain,
                "domain must not contain ':', '*', '?', ',', '=' or newlines",
            ));
        }
        Ok(())
    }
}
