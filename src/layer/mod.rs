//! Layer declarations
//!
//! A layer is one ordered, declarative build step: an opaque instruction
//! plus the set of inputs it depends on. Layers are declared into a
//! [`LayerStore`] (usually from a build file) and listed in sequence order
//! for planning.

pub mod buildfile;
pub mod descriptor;
pub mod store;

pub use buildfile::{BuildFile, LayerSpec, DEFAULT_BUILD_FILE};
pub use descriptor::{InputRef, LayerDescriptor};
pub use store::LayerStore;
