//! Engine Configuration
//!
//! Settings for the execution orchestrator and the process-backed host and
//! provider adapters. Optimizer settings live in the specification document
//! itself (see [`crate::optimizer::OptimizerConfig`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::executor::SkipPolicy;

/// Engine configuration options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Execution orchestrator configuration
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Test host configuration
    #[serde(default)]
    pub host: HostConfig,

    /// Inference provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Execution orchestrator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Whether skipped cases count against the pass rate (default: count_as_failure)
    #[serde(default)]
    pub skip_policy: SkipPolicy,
}

/// Test host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Command line; `{files}` expands to the unit files, `{report}` to the
    /// JSON report path
    #[serde(default = "default_host_command")]
    pub command: Vec<String>,

    /// Directory the units and the JSON report are written to
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Timeout for one submission in seconds, 0 disables (default: 600)
    #[serde(default = "default_host_timeout")]
    pub timeout_secs: u64,

    /// Keep generated units and reports after a run (default: false)
    #[serde(default)]
    pub keep_artifacts: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            command: default_host_command(),
            work_dir: default_work_dir(),
            timeout_secs: default_host_timeout(),
            keep_artifacts: false,
        }
    }
}

/// Inference provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Command line; `{model}` expands to the requested model id. The
    /// prompt is written to stdin and the reply read from stdout.
    #[serde(default = "default_provider_command")]
    pub command: Vec<String>,

    /// Timeout for one request in seconds, 0 disables (default: 300)
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_host_command() -> Vec<String> {
    ["npx", "vitest", "run", "{files}", "--reporter=json", "--outputFile={report}"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".agentspec")
}

fn default_host_timeout() -> u64 {
    600
}

fn default_provider_command() -> Vec<String> {
    ["llm", "-m", "{model}"].into_iter().map(String::from).collect()
}

fn default_provider_timeout() -> u64 {
    300
}

impl EngineConfig {
    /// Parse a TOML configuration document
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the test host configuration
    pub fn with_host(mut self, host: HostConfig) -> Self {
        self.host = host;
        self
    }

    /// Set the skip policy
    pub fn with_skip_policy(mut self, skip_policy: SkipPolicy) -> Self {
        self.execution.skip_policy = skip_policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.host.command.is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "host.command".into(),
                message: "must not be empty".into(),
            });
        }

        if !self.host.command.iter().any(|arg| arg.contains("{files}")) {
            return Err(ConfigValidationError::InvalidValue {
                field: "host.command".into(),
                message: "must contain a {files} placeholder".into(),
            });
        }

        if self.provider.command.is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "provider.command".into(),
                message: "must not be empty".into(),
            });
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
