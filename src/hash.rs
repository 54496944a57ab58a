//! Content hashing for layer identification
//!
//! Every digest in Strata is a SHA256 over a byte sequence. Input sets are
//! canonicalized before hashing so that the order in which files or
//! variables were declared (or enumerated on disk) never affects the result.

use crate::error::{StrataError, StrataResult};
use crate::layer::InputRef;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use walkdir::WalkDir;

/// Length of a digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Fixed-length SHA256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Full lowercase hex encoding (64 chars)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for display
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl FromStr for Digest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| format!("invalid digest '{s}': {e}"))?;
        let bytes: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| format!("invalid digest '{s}': expected {DIGEST_LEN} bytes"))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Stateless SHA256 hasher over bytes, files and input sets
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Digest an arbitrary byte sequence. Never fails.
    pub fn digest(bytes: impl AsRef<[u8]>) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(bytes.as_ref());
        Self::finish(hasher)
    }

    /// Digest a list of parts, length-prefixing each one so that
    /// `["ab", "c"]` and `["a", "bc"]` never collide.
    pub fn digest_parts<I, B>(parts: I) -> Digest
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            let part = part.as_ref();
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Self::finish(hasher)
    }

    fn finish(hasher: Sha256) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hasher.finalize());
        Digest(out)
    }

    /// Digest a declared input set.
    ///
    /// Each input is rendered to a canonical record, records are sorted and
    /// deduplicated, then hashed together. An empty set has a fixed digest.
    pub fn digest_inputs(inputs: &[InputRef]) -> Digest {
        let mut records: Vec<Vec<u8>> = inputs.iter().map(InputRef::canonical_record).collect();
        records.sort();
        records.dedup();
        Self::digest_parts(records)
    }

    /// Digest a single file's contents
    pub fn digest_file(path: &Path) -> StrataResult<Digest> {
        let contents = fs::read(path)
            .map_err(|e| StrataError::io(format!("reading {}", path.display()), e))?;
        Ok(Self::digest(contents))
    }

    /// Digest a directory tree.
    ///
    /// Computed over (relative path, file digest) pairs sorted by path, so
    /// the order the filesystem yields entries in is irrelevant. Symlinks
    /// are followed and hashed by target content; a dangling link is hashed
    /// by its target path. Empty directories do not contribute. A symlink
    /// loop is an error.
    pub fn digest_tree(root: &Path) -> StrataResult<Digest> {
        let mut records = Vec::new();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => match Self::dangling_link(root, &e) {
                    Some(record) => {
                        records.push(record);
                        continue;
                    }
                    None => return Err(Self::walk_error(root, e)),
                },
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_digest = Self::digest_file(entry.path())?;
            records.push((Self::relative(root, entry.path()), file_digest));
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        debug!("Hashed {} file(s) under {}", records.len(), root.display());

        Ok(Self::digest_parts(records.iter().flat_map(|(path, digest)| {
            [path.as_bytes().to_vec(), digest.as_bytes().to_vec()]
        })))
    }

    fn relative(root: &Path, path: &Path) -> String {
        path.strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Record for a symlink whose target does not exist
    fn dangling_link(root: &Path, err: &walkdir::Error) -> Option<(String, Digest)> {
        if err.loop_ancestor().is_some() {
            return None;
        }
        let path = err.path()?;
        if !fs::symlink_metadata(path).ok()?.file_type().is_symlink() || path.exists() {
            return None;
        }
        let target = fs::read_link(path).ok()?;
        let target = target.to_string_lossy();
        Some((
            Self::relative(root, path),
            Self::digest_parts([b"dangling-link".as_slice(), target.as_bytes()]),
        ))
    }

    fn walk_error(root: &Path, err: walkdir::Error) -> StrataError {
        let context = format!("walking {}", root.display());
        let message = err.to_string();
        match err.into_io_error() {
            Some(io) => StrataError::io(context, io),
            None => StrataError::io(context, std::io::Error::other(message)),
        }
    }

    /// Digest a path that may be either a file or a directory
    pub fn digest_path(path: &Path) -> StrataResult<Digest> {
        if path.is_dir() {
            Self::digest_tree(path)
        } else {
            Self::digest_file(path)
        }
    }
}
