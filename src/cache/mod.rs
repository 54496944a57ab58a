//! Layer cache index
//!
//! Maps composite layer keys to the materialized result of a previous
//! execution. Keys chain each layer to every layer before it, so a change
//! anywhere upstream produces different keys for everything downstream.
//!
//! # Guarantees
//!
//! - Entries are immutable by key: storing under an existing key replaces
//!   the whole entry, never part of it
//! - Per-key operations are atomic, so independent builds may share one index
//! - Eviction is advisory and never needed for correctness
//!
//! # Backends
//!
//! | Backend | Durability | Use |
//! |---------|------------|-----|
//! | [`MemoryIndex`] | process lifetime | tests, one-shot builds |
//! | [`FileIndex`] | on disk, one JSON record per key | the CLI |

pub mod entry;
pub mod file;
pub mod index;
pub mod key;

pub use entry::{CacheEntry, ContentRef};
pub use file::FileIndex;
pub use index::{CacheIndex, MemoryIndex};
pub use key::{CompositeKey, SEED};
