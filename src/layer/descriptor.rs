//! Layer descriptors and their declared inputs

use crate::hash::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One declared input of a layer.
///
/// Inputs identify content, not locations: a file input carries the digest
/// of the file as it was when the build was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputRef {
    /// A file or directory in the build context
    File { path: String, digest: Digest },
    /// An environment variable and its resolved value (None = unset)
    Env { name: String, value: Option<String> },
    /// Any other named content, identified by digest
    Content { id: String, digest: Digest },
}

impl InputRef {
    /// File input with a precomputed digest
    pub fn file(path: impl Into<String>, digest: Digest) -> Self {
        Self::File {
            path: path.into(),
            digest,
        }
    }

    /// Environment variable input
    pub fn env(name: impl Into<String>, value: Option<String>) -> Self {
        Self::Env {
            name: name.into(),
            value,
        }
    }

    /// Opaque named content
    pub fn content(id: impl Into<String>, digest: Digest) -> Self {
        Self::Content {
            id: id.into(),
            digest,
        }
    }

    /// Identifier of the input (path, variable name or content id)
    pub fn id(&self) -> &str {
        match self {
            Self::File { path, .. } => path,
            Self::Env { name, .. } => name,
            Self::Content { id, .. } => id,
        }
    }

    /// Unambiguous byte encoding used for input-set hashing.
    ///
    /// Layout: kind tag, then length-prefixed identifier, then
    /// length-prefixed payload. Unset env vars use a distinct tag so they
    /// never equal an empty value.
    pub fn canonical_record(&self) -> Vec<u8> {
        let (tag, id, payload): (u8, &str, Vec<u8>) = match self {
            Self::File { path, digest } => (b'f', path.as_str(), digest.as_bytes().to_vec()),
            Self::Content { id, digest } => (b'c', id.as_str(), digest.as_bytes().to_vec()),
            Self::Env {
                name,
                value: Some(v),
            } => (b'e', name.as_str(), v.as_bytes().to_vec()),
            Self::Env { name, value: None } => (b'u', name.as_str(), Vec::new()),
        };

        let mut record = Vec::with_capacity(1 + 16 + id.len() + payload.len());
        record.push(tag);
        record.extend_from_slice(&(id.len() as u64).to_be_bytes());
        record.extend_from_slice(id.as_bytes());
        record.extend_from_slice(&(payload.len() as u64).to_be_bytes());
        record.extend_from_slice(&payload);
        record
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, digest } => write!(f, "file:{}@{}", path, digest.short()),
            Self::Env { name, value: Some(_) } => write!(f, "env:{}", name),
            Self::Env { name, value: None } => write!(f, "env:{} (unset)", name),
            Self::Content { id, digest } => write!(f, "content:{}@{}", id, digest.short()),
        }
    }
}

/// A declared build step. Immutable once declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    position: u64,
    instruction: String,
    inputs: Vec<InputRef>,
}

impl LayerDescriptor {
    /// Create a descriptor directly. Use [`LayerStore::declare`] to get
    /// duplicate-position checking.
    ///
    /// [`LayerStore::declare`]: crate::layer::LayerStore::declare
    pub fn new(position: u64, instruction: impl Into<String>, inputs: Vec<InputRef>) -> Self {
        Self {
            position,
            instruction: instruction.into(),
            inputs,
        }
    }

    /// Sequence position (unique within a build)
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Opaque instruction text
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Declared inputs, in declaration order
    pub fn inputs(&self) -> &[InputRef] {
        &self.inputs
    }
}
