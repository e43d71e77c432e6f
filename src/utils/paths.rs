use crate::utils::errors::{KeyVaultCliError, Result};
use std::path::PathBuf;

pub struct KeyVaultCliPaths;
const PROGRAM_NAME: &str = "keyvault-rs";

impl KeyVaultCliPaths {
    /// Get the config directory: ~/.config/keyvault-rs/
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| {
                KeyVaultCliError::Config("Cannot determine config directory".to_string())
            })
    }

    /// Get the default config file path: ~/.config/keyvault-rs/config.yaml
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }
}
