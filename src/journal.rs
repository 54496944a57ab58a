//! Build journal
//!
//! Appends one JSON line per finished build to the configured journal file
//! (`<state dir>/journal.log` by default).
//! Journal writes never fail a build; IO problems are logged and dropped.

use crate::build::BuildOutcome;
use crate::config::{schema::Config, ConfigManager};
use crate::error::StrataError;
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// File-based journal that appends JSON lines
pub struct BuildJournal {
    enabled: bool,
    path: PathBuf,
    build_id: Uuid,
}

impl BuildJournal {
    /// Create a journal for one build invocation from config
    pub fn new(config: &Config) -> Self {
        Self::at(config.general.journal, ConfigManager::journal_path(config))
    }

    /// Create a journal writing to an explicit path
    pub fn at(enabled: bool, path: PathBuf) -> Self {
        Self {
            enabled,
            path,
            build_id: Uuid::new_v4(),
        }
    }

    /// Identifier shared by every event of this build
    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    /// Record a successful build
    pub async fn completed(&self, build_file: &Path, outcome: &BuildOutcome) {
        self.log(
            "build.completed",
            &json!({
                "build_file": build_file.display().to_string(),
                "executed": outcome.executed_count(),
                "reused": outcome.reused_count(),
                "layers": outcome.layers.iter().map(|l| json!({
                    "position": l.position,
                    "key": l.key.digest().to_hex(),
                    "content": l.content.as_str(),
                    "reused": l.reused,
                })).collect::<Vec<_>>(),
            }),
        )
        .await;
    }

    /// Record a failed build
    pub async fn failed(&self, build_file: &Path, error: &StrataError) {
        self.log(
            "build.failed",
            &json!({
                "build_file": build_file.display().to_string(),
                "position": error.failed_position(),
                "error": error.to_string(),
            }),
        )
        .await;
    }

    /// Log an event as a JSON line
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "build_id": self.build_id.to_string(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
