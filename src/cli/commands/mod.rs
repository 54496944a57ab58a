//! CLI command implementations

pub mod build;
pub mod cache;
pub mod config;
pub mod plan;

pub use build::execute as build;
pub use cache::execute as cache;
pub use config::execute as config;
pub use plan::execute as plan;

use crate::cache::FileIndex;
use crate::config::{Config, ConfigManager};
use crate::error::StrataResult;
use crate::layer::{BuildFile, LayerDescriptor};
use std::path::Path;
use tracing::debug;

/// Open the on-disk cache index selected by config
pub(crate) fn open_index(config: &Config) -> StrataResult<FileIndex> {
    let dir = ConfigManager::cache_dir(config);
    debug!("Using cache index at {}", dir.display());
    FileIndex::open(dir)
}

/// Load a build file and resolve its layers
pub(crate) async fn load_layers(path: &Path) -> StrataResult<(BuildFile, Vec<LayerDescriptor>)> {
    let build_file = BuildFile::from_file(path).await?;
    let layers = build_file.resolve()?.into_layers();
    Ok((build_file, layers))
}

/// Truncate an instruction for single-line display
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max && !text.contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_untouched() {
        assert_eq!(truncate("pip install", 40), "pip install");
    }

    #[test]
    fn truncate_long_text() {
        let out = truncate("a very long instruction indeed", 10);
        assert_eq!(out, "a very ...");
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn truncate_multiline() {
        assert_eq!(truncate("set -e\nmake", 40), "set -e...");
    }
}
