//! Configuration management for agentspec.
//!
//! The engine configuration is loaded with precedence:
//! 1. `--config` / `AGENTSPEC_CONFIG`
//! 2. `config.toml` in the platform config directory
//! 3. Default values

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use agentspec_core::config::EngineConfig;

use crate::cli::HostArgs;

/// Default config file location, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "agentspec", "agentspec")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".agentspec").join("config.toml")))
}

/// Load the engine configuration.
///
/// An explicitly named file must exist; the default location is optional.
pub fn load(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => default_config_path().filter(|path| path.exists()),
    };

    let Some(path) = path else {
        tracing::debug!("No config file, using defaults");
        return Ok(EngineConfig::default());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Apply command-line host options on top of the loaded configuration.
pub fn apply_host_args(mut config: EngineConfig, args: &HostArgs) -> EngineConfig {
    if let Some(work_dir) = &args.work_dir {
        config.host.work_dir = work_dir.clone();
    }
    if let Some(timeout) = args.timeout {
        config.host.timeout_secs = timeout;
    }
    if args.keep_artifacts {
        config.host.keep_artifacts = true;
    }
    if args.exclude_skipped {
        config.execution.skip_policy = agentspec_core::SkipPolicy::Exclude;
    }
    config
}
