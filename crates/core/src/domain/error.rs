// Domain Error Types

use thiserror::Error;

/// Startup configuration errors (fatal)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field name for validation failures, None for parse failures
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidField { field, .. } => Some(field),
            ConfigError::Parse(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
