//! Configuration Loader
//!
//! Layers an optional file under environment-variable overrides and validates
//! the merged result.

use super::error::{ConfigResult, ConfigurationError};
use super::ExecutorsConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config/ambient.toml";
pub const DEFAULT_ENV_PREFIX: &str = "AMBIENT";
pub const CONFIG_PATH_VAR: &str = "AMBIENT_CONFIG_PATH";

/// Builder for loading [`ExecutorsConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    file_required: bool,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            file: None,
            file_required: false,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader for the conventional locations: `AMBIENT_CONFIG_PATH` when set
    /// (the file must then exist), otherwise an optional `config/ambient.toml`.
    pub fn from_environment() -> Self {
        match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::new().file(path).required(true),
            Err(_) => Self::new().file(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.file_required = required;
        self
    }

    /// Variables named `{prefix}__SECTION__FIELD` override file values.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> ConfigResult<ExecutorsConfig> {
        let mut builder = Config::builder();
        if let Some(path) = &self.file {
            debug!(path = %path.display(), required = self.file_required, "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).required(self.file_required));
        }
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let source_name = self
            .file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "environment".to_string());

        let config: ExecutorsConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigurationError::load(&source_name, e))?;

        config.validate()?;
        debug!(
            monitoring_enabled = config.monitoring.enabled,
            domain = %config.monitoring.domain,
            trace_spans = config.context.trace_spans,
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_optional_file_yields_defaults() {
        let config = ConfigLoader::new()
            .file("does/not/exist.toml")
            .env_prefix("AMBIENT_LOADER_TEST_MISSING")
            .load()
            .unwrap();
        assert_eq!(config, ExecutorsConfig::default());
    }

    #[test]
    fn test_missing_required_file_is_load_error() {
        let result = ConfigLoader::new()
            .file("does/not/exist.toml")
            .required(true)
            .env_prefix("AMBIENT_LOADER_TEST_REQUIRED")
            .load();
        assert!(matches!(result, Err(ConfigurationError::Load { .. })));
    }

    #[test]
    fn test_reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[monitoring]\nenabled = false\ndomain = \"billing\"\n\n[context]\ntrace_spans = true").unwrap();

        let config = ConfigLoader::new()
            .file(file.path())
            .env_prefix("AMBIENT_LOADER_TEST_FILE")
            .load()
            .unwrap();

        assert!(!config.monitoring.enabled);
        assert_eq!(config.monitoring.domain, "billing");
        assert!(config.context.trace_spans);
    }

    #[test]
    fn test_invalid_file_value_fails_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[monitoring]\ndomain = \"a:b\"").unwrap();

        let result = ConfigLoader::new()
            .file(file.path())
            .env_prefix("AMBIENT_LOADER_TEST_INVALID")
            .load();

        assert!(matches!(result, Err(ConfigurationError::InvalidValue { .. })));
    }
}
