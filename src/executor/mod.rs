//! Layer executor abstraction
//!
//! The cache never performs a build step itself. Anything that can turn a
//! layer into a content reference implements [`Executor`]:
//! - [`ShellExecutor`]: runs the instruction through a shell (used by the CLI)
//! - test doubles that record calls or fail on demand

pub mod shell;

pub use shell::ShellExecutor;

use crate::cache::ContentRef;
use crate::error::StrataResult;
use crate::layer::LayerDescriptor;
use async_trait::async_trait;

/// Runs the side effect of one layer
///
/// Called at most once per layer per build, strictly in sequence order:
/// when `execute` is called for a layer, every earlier layer has already
/// completed. Errors are wrapped with the layer's position by the build
/// driver; implementations should not retry internally unless that is
/// their documented policy.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute `layer` and return a handle to its materialized result
    async fn execute(&self, layer: &LayerDescriptor) -> StrataResult<ContentRef>;

    /// Human-readable executor name for display
    fn executor_name(&self) -> &'static str;
}
