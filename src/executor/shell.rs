//! Shell executor
//!
//! Runs a layer's instruction with `<shell> -c <instruction>` in a working
//! directory. The content reference is a SHA256 over the instruction and
//! the captured stdout, so a step that prints the same thing twice yields
//! the same reference.

use crate::cache::ContentRef;
use crate::config::schema::ExecutorConfig;
use crate::error::{StrataError, StrataResult};
use crate::executor::Executor;
use crate::hash::ContentHasher;
use crate::layer::{InputRef, LayerDescriptor};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Executor that runs instructions through a shell
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    workdir: PathBuf,
    timeout: Option<Duration>,
}

impl ShellExecutor {
    /// Create a shell executor running in `workdir`
    pub fn new(shell: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            workdir: workdir.into(),
            timeout: None,
        }
    }

    /// Build from configuration, falling back to `default_workdir`
    pub fn from_config(config: &ExecutorConfig, default_workdir: PathBuf) -> Self {
        let workdir = config.workdir.clone().unwrap_or(default_workdir);
        let executor = Self::new(config.shell.clone(), workdir);
        match config.timeout_secs {
            0 => executor,
            secs => executor.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Kill and fail any step running longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn command(&self, layer: &LayerDescriptor) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(layer.instruction())
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Declared env inputs are visible to the step with the value they were hashed with
        for input in layer.inputs() {
            if let InputRef::Env {
                name,
                value: Some(value),
            } = input
            {
                cmd.env(name, value);
            }
        }
        cmd
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, layer: &LayerDescriptor) -> StrataResult<ContentRef> {
        let instruction = layer.instruction();
        debug!("Executing: {} -c {:?}", self.shell, instruction);

        let pending = self.command(layer).output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                StrataError::ExecutionTimeout {
                    command: instruction.to_string(),
                    limit,
                }
            })?,
            None => pending.await,
        }
        .map_err(|e| StrataError::command_failed(format!("{} -c {}", self.shell, instruction), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match output.status.code() {
                Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            return Err(StrataError::command_exec(instruction, detail));
        }

        let digest = ContentHasher::digest_parts([instruction.as_bytes(), output.stdout.as_slice()]);
        info!("Layer {} produced {}", layer.position(), digest.short());
        Ok(ContentRef::new(format!("sha256:{}", digest.to_hex())))
    }

    fn executor_name(&self) -> &'static str {
        "shell"
    }
}
