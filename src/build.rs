//! Build execution
//!
//! Two phases: plan every layer first, then walk the plan in sequence
//! order, reusing cached results and running the executor for the rest.
//! A failed layer stops the build; nothing is stored for it, and no later
//! layer runs.

use crate::cache::{CacheIndex, CompositeKey, ContentRef};
use crate::error::{StrataError, StrataResult};
use crate::executor::Executor;
use crate::layer::LayerDescriptor;
use crate::planner::{self, BuildPlan, Decision};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative cancellation, honoured between layers only
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The layer currently running is allowed to finish.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one layer in a completed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerOutcome {
    /// Sequence position of the layer
    pub position: u64,
    /// Key the result is cached under
    pub key: CompositeKey,
    /// Materialized result
    pub content: ContentRef,
    /// Whether the result came from cache
    pub reused: bool,
}

/// Result of a successful build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    /// One outcome per layer, in sequence order
    pub layers: Vec<LayerOutcome>,
}

impl BuildOutcome {
    /// Content references in sequence order
    pub fn contents(&self) -> Vec<ContentRef> {
        self.layers.iter().map(|l| l.content.clone()).collect()
    }

    /// Number of layers served from cache
    pub fn reused_count(&self) -> usize {
        self.layers.iter().filter(|l| l.reused).count()
    }

    /// Number of layers that ran
    pub fn executed_count(&self) -> usize {
        self.layers.len() - self.reused_count()
    }
}

/// Plan and run `layers`
pub async fn execute(
    layers: &[LayerDescriptor],
    index: &dyn CacheIndex,
    executor: &dyn Executor,
) -> StrataResult<BuildOutcome> {
    execute_with_cancel(layers, index, executor, &CancelFlag::new()).await
}

/// Plan and run `layers`, stopping between layers if `cancel` is set
pub async fn execute_with_cancel(
    layers: &[LayerDescriptor],
    index: &dyn CacheIndex,
    executor: &dyn Executor,
    cancel: &CancelFlag,
) -> StrataResult<BuildOutcome> {
    let plan = planner::plan(layers, index);
    execute_plan(plan, index, executor, cancel).await
}

/// Run an existing plan
pub async fn execute_plan(
    plan: BuildPlan,
    index: &dyn CacheIndex,
    executor: &dyn Executor,
    cancel: &CancelFlag,
) -> StrataResult<BuildOutcome> {
    let total = plan.steps.len();
    let mut outcome = BuildOutcome {
        layers: Vec::with_capacity(total),
    };

    for (i, step) in plan.steps.into_iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Build cancelled after {}/{} layer(s)", i, total);
            return Err(StrataError::Cancelled { completed: i });
        }

        let position = step.layer.position();
        let (content, reused) = match step.decision {
            Decision::Reuse { content } => {
                debug!("[{}/{}] layer {} cached", i + 1, total, position);
                (content, true)
            }
            Decision::Execute => {
                info!(
                    "[{}/{}] layer {}: {}",
                    i + 1,
                    total,
                    position,
                    step.layer.instruction()
                );

                let content = executor
                    .execute(&step.layer)
                    .await
                    .map_err(|e| StrataError::execution(position, step.layer.instruction(), e))?;

                // The result is valid even if it can't be recorded
                if let Err(e) = index.store(&step.key, content.clone()) {
                    warn!("Failed to cache layer {}: {}", position, e);
                }
                (content, false)
            }
        };

        outcome.layers.push(LayerOutcome {
            position,
            key: step.key,
            content,
            reused,
        });
    }

    info!(
        "Build complete: {} executed, {} reused",
        outcome.executed_count(),
        outcome.reused_count()
    );
    Ok(outcome)
}
