//! Configuration management for the umr CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Game data directory (`.../Cygames/umamusume`)
    pub data_dir: Option<PathBuf>,

    /// Where backups and texture exports live
    pub work_dir: Option<PathBuf>,

    /// Whether the install stores enciphered asset files
    pub encrypted: Option<bool>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("umr");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &PathBuf) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Default work directory when neither flag nor config provide one
    pub fn default_work_dir() -> Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Could not determine data directory")?
            .join("umr"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.encrypted.is_none());
    }

    #[test]
    fn test_config_roundtrip_via_toml() {
        let config = Config {
            data_dir: Some(PathBuf::from("/data/umamusume")),
            work_dir: None,
            encrypted: Some(true),
        };

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.encrypted, Some(true));
    }
}
