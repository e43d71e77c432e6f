use crate::utils::errors::{KeyVaultCliError, Result};
use crate::utils::paths::KeyVaultCliPaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com/";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Endpoints and transport settings, read from config.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub authority_host: String,
    pub resource_manager_endpoint: String,
    /// Leave unset to keep the transport default
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            resource_manager_endpoint: DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string(),
            request_timeout_secs: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            user_agent: None,
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, or from the default location.
    ///
    /// An explicit path must exist. The default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(KeyVaultCliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)
            }
            None => {
                let path = KeyVaultCliPaths::config_file()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    tracing::debug!("No config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply command-line or environment overrides on top of the file values
    pub fn with_overrides(
        mut self,
        authority_host: Option<String>,
        resource_manager_endpoint: Option<String>,
    ) -> Self {
        if let Some(host) = authority_host {
            self.authority_host = host;
        }
        if let Some(endpoint) = resource_manager_endpoint {
            self.resource_manager_endpoint = endpoint;
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn user_agent(&self) -> String {
        let base = format!("keyvault-rs/{}", env!("CARGO_PKG_VERSION"));
        match &self.user_agent {
            Some(suffix) if !suffix.is_empty() => format!("{base} {suffix}"),
            _ => base,
        }
    }
}
