//! Build planning
//!
//! Walks the declared layers in sequence order, derives each layer's
//! composite key and decides whether its cached result can be reused.
//!
//! Keys are chained on the previous *key*, never on an execution result, so
//! a complete plan (and its hit ratio) is known before anything runs. That
//! is what makes `strata plan` a true dry run.

use crate::cache::{CacheIndex, CompositeKey, ContentRef, SEED};
use crate::hash::ContentHasher;
use crate::layer::LayerDescriptor;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Per-layer planning decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    /// A result is cached under this layer's key
    Reuse { content: ContentRef },
    /// No usable result; the layer must run
    Execute,
}

impl Decision {
    /// Whether this layer will be served from cache
    pub fn is_reuse(&self) -> bool {
        matches!(self, Self::Reuse { .. })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse { .. } => write!(f, "reuse"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// One planned layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// The declared layer
    pub layer: LayerDescriptor,
    /// Its chained cache key
    pub key: CompositeKey,
    /// What the build will do with it
    #[serde(flatten)]
    pub decision: Decision,
}

/// Ordered plan for one build invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Steps in ascending sequence order
    pub steps: Vec<PlanStep>,
}

impl BuildPlan {
    /// Number of layers served from cache
    pub fn reuse_count(&self) -> usize {
        self.steps.iter().filter(|s| s.decision.is_reuse()).count()
    }

    /// Number of layers that must run
    pub fn execute_count(&self) -> usize {
        self.steps.len() - self.reuse_count()
    }

    /// Fraction of layers served from cache (1.0 for an empty plan)
    pub fn hit_ratio(&self) -> f64 {
        if self.steps.is_empty() {
            return 1.0;
        }
        self.reuse_count() as f64 / self.steps.len() as f64
    }

    /// Whether every layer can be reused
    pub fn is_fully_cached(&self) -> bool {
        self.execute_count() == 0
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compute the cache key of every layer without consulting any index.
///
/// `layers` may arrive in any order but positions must be unique, as
/// [`LayerStore`](crate::layer::LayerStore) guarantees. Duplicates have no
/// defined sequence order.
pub fn chain_keys(layers: &[LayerDescriptor]) -> Vec<CompositeKey> {
    let mut ordered: Vec<&LayerDescriptor> = layers.iter().collect();
    ordered.sort_by_key(|l| l.position());
    debug_assert!(
        ordered.windows(2).all(|w| w[0].position() < w[1].position()),
        "layer positions must be strictly increasing once sorted"
    );

    let mut predecessor = SEED;
    ordered
        .into_iter()
        .map(|layer| {
            let key = CompositeKey::combine(
                predecessor,
                ContentHasher::digest(layer.instruction()),
                ContentHasher::digest_inputs(layer.inputs()),
            );
            predecessor = key.digest();
            key
        })
        .collect()
}

/// Plan a build against `index`.
///
/// Same precondition as [`chain_keys`]: positions are unique.
/// Pure with respect to its inputs: the same layers against an unchanged
/// index always produce the same plan. An index fault is logged and the
/// affected layer planned as a miss.
pub fn plan(layers: &[LayerDescriptor], index: &dyn CacheIndex) -> BuildPlan {
    let mut ordered: Vec<&LayerDescriptor> = layers.iter().collect();
    ordered.sort_by_key(|l| l.position());

    let keys = chain_keys(layers);

    let steps: Vec<PlanStep> = ordered
        .into_iter()
        .zip(keys)
        .map(|(layer, key)| {
            let decision = match index.lookup(&key) {
                Ok(Some(entry)) => {
                    debug!("Layer {} hit {}", layer.position(), key);
                    Decision::Reuse {
                        content: entry.content,
                    }
                }
                Ok(None) => {
                    debug!("Layer {} miss {}", layer.position(), key);
                    Decision::Execute
                }
                Err(e) => {
                    warn!(
                        "Cache lookup failed for layer {}, will execute: {}",
                        layer.position(),
                        e
                    );
                    Decision::Execute
                }
            };

            PlanStep {
                layer: layer.clone(),
                key,
                decision,
            }
        })
        .collect();

    let plan = BuildPlan { steps };
    debug!(
        "Planned {} layer(s): {} reuse, {} execute",
        plan.steps.len(),
        plan.reuse_count(),
        plan.execute_count()
    );
    plan
}
