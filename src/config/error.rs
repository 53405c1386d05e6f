//! Configuration errors.

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration from {source_name}: {reason}")]
    Load { source_name: String, reason: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigurationError {
    pub fn load(source_name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Load {
            source_name: source_name.into(),
            reason: error.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
