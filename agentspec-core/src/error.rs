//! Error Types
//!
//! Defines error types for the agentspec core library.

use thiserror::Error;

use crate::compiler::CompileError;
use crate::spec::ValidationError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Debug, Error)]
pub enum Error {
    /// Specification could not be compiled
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Specification failed validation
    #[error("invalid specification: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigValidationError),

    /// The test host could not be reached or crashed
    #[error("test host submission failed: {message}")]
    HostSubmission { message: String },

    /// An inference provider call failed
    #[error("inference provider error: {message}")]
    Provider { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML document error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON document error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML document error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a host submission error
    pub fn host_submission(message: impl Into<String>) -> Self {
        Self::HostSubmission {
            message: message.into(),
        }
    }

    /// Create an inference provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Check if this error came from the test host
    pub fn is_host_submission(&self) -> bool {
        matches!(self, Self::HostSubmission { .. })
    }

    /// Check if this error came from the inference provider
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Check if this error aborted compilation
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::provider("rate limited");
        assert!(err.is_provider());
        assert!(err.to_string().contains("rate limited"));

        let err = Error::host_submission("npx not found");
        assert!(err.is_host_submission());
        assert!(err.to_string().contains("npx not found"));

        let err: Error = CompileError::UnresolvedTool {
            benchmark: "weather".into(),
            tool: "get_weather".into(),
        }
        .into();
        assert!(err.is_compile());
        assert!(err.to_string().contains("get_weather"));
    }
}
