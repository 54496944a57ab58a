//! In-memory store of declared layers for one build invocation

use crate::error::{StrataError, StrataResult};
use crate::layer::descriptor::{InputRef, LayerDescriptor};
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered set of layer declarations, keyed by sequence position
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: BTreeMap<u64, LayerDescriptor>,
}

impl LayerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a layer at `position`.
    ///
    /// Fails without modifying the store if the position is already taken.
    pub fn declare(
        &mut self,
        position: u64,
        instruction: impl Into<String>,
        inputs: Vec<InputRef>,
    ) -> StrataResult<LayerDescriptor> {
        if self.layers.contains_key(&position) {
            return Err(StrataError::DuplicateSequence { position });
        }

        let layer = LayerDescriptor::new(position, instruction, inputs);
        debug!(
            "Declared layer {}: {} ({} input(s))",
            position,
            layer.instruction(),
            layer.inputs().len()
        );
        self.layers.insert(position, layer.clone());
        Ok(layer)
    }

    /// All declared layers, ascending by position
    pub fn list(&self) -> Vec<LayerDescriptor> {
        self.layers.values().cloned().collect()
    }

    /// Consume the store, yielding layers ascending by position
    pub fn into_layers(self) -> Vec<LayerDescriptor> {
        self.layers.into_values().collect()
    }

    /// Number of declared layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layers are declared
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
