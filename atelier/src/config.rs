//! CLI configuration.
//!
//! Loaded from an optional `atelier.toml`; every section falls back to the
//! same defaults the services ship with, so a missing file is a fully
//! working setup.

use analysis::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "atelier.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AtelierConfig {
    pub workspace: WorkspaceSection,
    pub sandbox: SandboxSection,
    pub hosting: HostingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    /// Directory all per-user workspaces live under
    pub base_path: PathBuf,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("/tmp/atelier-workspaces"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    pub image: String,
    pub memory_limit_mb: u64,
    pub cpu_quota: f64,
    pub tool_timeout_secs: u64,
}

impl Default for SandboxSection {
    fn default() -> Self {
        let defaults = SandboxConfig::default();
        Self {
            image: defaults.image,
            memory_limit_mb: defaults.memory_limit_mb,
            cpu_quota: defaults.cpu_quota,
            tool_timeout_secs: defaults.tool_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HostingSection {
    /// Base URL of the hosting provider's REST API; the provider default
    /// applies when unset
    pub api_base: Option<String>,
}

impl AtelierConfig {
    /// Load from the given path, from `./atelier.toml` when present, or
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Self =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        config
            .validate()
            .map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig::new()
            .with_image(self.sandbox.image.clone())
            .with_memory_limit_mb(self.sandbox.memory_limit_mb)
            .with_cpu_quota(self.sandbox.cpu_quota)
            .with_tool_timeout(Duration::from_secs(self.sandbox.tool_timeout_secs))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.workspace.base_path.as_os_str().is_empty() {
            return Err("Workspace base path cannot be empty".to_string());
        }
        self.sandbox_config().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AtelierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.workspace.base_path,
            PathBuf::from("/tmp/atelier-workspaces")
        );
        assert_eq!(config.sandbox.memory_limit_mb, 512);
        assert_eq!(config.sandbox.tool_timeout_secs, 300);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atelier.toml");
        std::fs::write(
            &path,
            "[workspace]\nbase_path = \"/srv/workspaces\"\n\n[sandbox]\nmemory_limit_mb = 1024\n",
        )
        .unwrap();

        let config = AtelierConfig::load(Some(&path)).unwrap();
        assert_eq!(config.workspace.base_path, PathBuf::from("/srv/workspaces"));
        assert_eq!(config.sandbox.memory_limit_mb, 1024);
        assert_eq!(config.sandbox.cpu_quota, 0.5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atelier.toml");
        std::fs::write(&path, "[sandbox]\nmemory_limit_mb = 0\n").unwrap();

        assert!(matches!(
            AtelierConfig::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let result = AtelierConfig::load(Some(Path::new("/no/such/atelier.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
