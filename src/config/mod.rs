//! Configuration for Strata
//!
//! The config file lives at `<config dir>/strata/config.toml` unless
//! `--config` names another one. Cache records and the build journal live
//! under the state directory unless the config points them elsewhere.

pub mod schema;

pub use schema::Config;

use crate::error::{StrataError, StrataResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Loads and saves one config file, and resolves the paths it controls
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user config file
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Manager for an explicit config file
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/strata/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata")
            .join("config.toml")
    }

    /// Per-user state directory holding the cache index and journal
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata")
    }

    /// Cache index directory: `cache.dir`, or `<state dir>/cache`
    pub fn cache_dir(config: &Config) -> PathBuf {
        match &config.cache.dir {
            Some(dir) => dir.clone(),
            None => Self::state_dir().join("cache"),
        }
    }

    /// Build journal file: `general.journal_path`, or `<state dir>/journal.log`
    pub fn journal_path(config: &Config) -> PathBuf {
        match &config.general.journal_path {
            Some(path) => path.clone(),
            None => Self::state_dir().join("journal.log"),
        }
    }

    /// Read the config file. A missing file yields the defaults.
    pub async fn load(&self) -> StrataResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(StrataError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| StrataError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config`, creating the parent directory if needed
    pub async fn save(&self, config: &Config) -> StrataResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StrataError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            StrataError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// The config file this manager reads and writes
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.general.log_format, "text");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.executor.shell = "/bin/bash".to_string();
        config.cache.dir = Some(temp.path().join("layers"));

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.executor.shell, "/bin/bash");
        assert_eq!(ConfigManager::cache_dir(&loaded), temp.path().join("layers"));
    }

    #[tokio::test]
    async fn invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[cache]\ngc_days = \"soon\"\n").unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            StrataError::ConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn default_paths_under_state_dir() {
        let config = Config::default();
        assert!(ConfigManager::cache_dir(&config).starts_with(ConfigManager::state_dir()));
        assert!(ConfigManager::journal_path(&config).starts_with(ConfigManager::state_dir()));
    }

    #[test]
    fn journal_path_follows_config() {
        let mut config = Config::default();
        config.general.journal_path = Some(PathBuf::from("/tmp/strata/journal.log"));
        assert_eq!(
            ConfigManager::journal_path(&config),
            PathBuf::from("/tmp/strata/journal.log")
        );
    }
}
