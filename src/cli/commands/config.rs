//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{StrataError, StrataResult};
use console::style;
use std::path::PathBuf;

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.journal",
    "general.journal_path",
    "cache.dir",
    "cache.gc_days",
    "executor.shell",
    "executor.workdir",
    "executor.timeout_secs",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> StrataResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> StrataResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> StrataResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}",
            style("!").yellow(),
            path.display()
        );
        println!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("✓").green(),
        path.display()
    );

    Ok(())
}

async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> StrataResult<()> {
    // Start from the file, not the effective config, so CLI overrides never persist
    let mut config = manager.load().await?;
    apply_setting(&mut config, key, value)?;
    manager.save(&config).await?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

/// Apply one dot-separated `key = value` setting
fn apply_setting(config: &mut Config, key: &str, value: &str) -> StrataResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,
        ["general", "journal"] => config.general.journal = parse_bool(value)?,
        ["general", "journal_path"] => config.general.journal_path = parse_optional_path(value),

        ["cache", "dir"] => config.cache.dir = parse_optional_path(value),
        ["cache", "gc_days"] => config.cache.gc_days = parse_u32(value)?,

        ["executor", "shell"] => config.executor.shell = value.to_string(),
        ["executor", "workdir"] => config.executor.workdir = parse_optional_path(value),
        ["executor", "timeout_secs"] => config.executor.timeout_secs = parse_u64(value)?,

        _ => {
            return Err(StrataError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_log_format(value: &str) -> StrataResult<String> {
    match value {
        "text" | "json" => Ok(value.to_string()),
        _ => Err(StrataError::User(format!(
            "Invalid log format: {}. Use text/json",
            value
        ))),
    }
}

/// Empty string clears the setting
fn parse_optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn parse_bool(value: &str) -> StrataResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(StrataError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> StrataResult<u32> {
    value
        .parse()
        .map_err(|_| StrataError::User(format!("Invalid number: {}", value)))
}

fn parse_u64(value: &str) -> StrataResult<u64> {
    value
        .parse()
        .map_err(|_| StrataError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply_setting(&mut config, "cache.gc_days", "7").unwrap();
        apply_setting(&mut config, "general.journal", "no").unwrap();
        apply_setting(&mut config, "executor.shell", "/bin/bash").unwrap();
        apply_setting(&mut config, "cache.dir", "/tmp/layers").unwrap();
        apply_setting(&mut config, "general.journal_path", "/tmp/j.log").unwrap();

        assert_eq!(config.cache.gc_days, 7);
        assert!(!config.general.journal);
        assert_eq!(config.executor.shell, "/bin/bash");
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/layers")));
        assert_eq!(config.general.journal_path, Some(PathBuf::from("/tmp/j.log")));

        apply_setting(&mut config, "cache.dir", "").unwrap();
        assert_eq!(config.cache.dir, None);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut config = Config::default();
        let err = apply_setting(&mut config, "vm.name", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key: vm.name"));
    }

    #[test]
    fn apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "cache.gc_days", "soon").is_err());
        assert!(apply_setting(&mut config, "general.journal", "maybe").is_err());
        assert!(apply_setting(&mut config, "general.log_format", "xml").is_err());
    }

    #[tokio::test]
    async fn set_value_persists() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        set_value(&manager, "executor.timeout_secs", "90")
            .await
            .unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.executor.timeout_secs, 90);
    }

    #[tokio::test]
    async fn init_respects_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[cache]\ngc_days = 3\n").unwrap();
        let manager = ConfigManager::with_path(path);

        init_config(&manager, false).await.unwrap();
        assert_eq!(manager.load().await.unwrap().cache.gc_days, 3);

        init_config(&manager, true).await.unwrap();
        assert_eq!(manager.load().await.unwrap().cache.gc_days, 30);
    }
}
