//! Composite cache keys

use crate::hash::{ContentHasher, Digest, DIGEST_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predecessor digest of the first layer in every chain
pub const SEED: Digest = Digest::from_bytes([0; DIGEST_LEN]);

/// Domain tag mixed into every key digest
const KEY_DOMAIN: &[u8] = b"strata.layer-key.v1";

/// Cache key of one layer: its own content plus the whole prefix before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    /// Digest of the previous layer's key, or [`SEED`]
    pub predecessor: Digest,
    /// Digest of the instruction text
    pub instruction: Digest,
    /// Digest of the canonicalized input set
    pub inputs: Digest,
}

impl CompositeKey {
    /// Combine the three component digests
    pub fn combine(predecessor: Digest, instruction: Digest, inputs: Digest) -> Self {
        Self {
            predecessor,
            instruction,
            inputs,
        }
    }

    /// Digest of the key itself. This is both the index address and the
    /// predecessor of the next layer.
    pub fn digest(&self) -> Digest {
        let parts: [&[u8]; 4] = [
            KEY_DOMAIN,
            self.predecessor.as_bytes(),
            self.instruction.as_bytes(),
            self.inputs.as_bytes(),
        ];
        ContentHasher::digest_parts(parts)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digest().short())
    }
}
