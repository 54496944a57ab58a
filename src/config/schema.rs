//! Configuration schema for Strata
//!
//! Configuration is stored at `~/.config/strata/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache index settings
    pub cache: CacheConfig,

    /// Shell executor settings
    pub executor: ExecutorConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record build results in the journal
    pub journal: bool,

    /// Journal file (default: `<state dir>/journal.log`)
    pub journal_path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
            journal_path: None,
        }
    }
}

/// Cache index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Index directory (default: `<state dir>/cache`)
    pub dir: Option<PathBuf>,

    /// `cache gc` removes entries older than N days (0 = disabled)
    pub gc_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            gc_days: 30,
        }
    }
}

/// Shell executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Shell used to run instructions (`<shell> -c <instruction>`)
    pub shell: String,

    /// Working directory (default: the build file's directory)
    pub workdir: Option<PathBuf>,

    /// Per-layer timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            workdir: None,
            timeout_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[executor]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.executor.shell, "/bin/sh");
        assert_eq!(config.cache.gc_days, 30);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            gc_days = 7
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.gc_days, 7);
        assert!(config.general.journal); // default preserved
    }
}
