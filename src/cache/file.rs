//! On-disk cache index
//!
//! One JSON record per key at `<dir>/<key-digest>.json`. Records are written
//! to a temporary file in the same directory and renamed into place, so a
//! reader sees either the old record or the new one, never a partial write.
//!
//! A record that fails to parse reads as a miss. Eviction deletes such
//! records, along with temp files abandoned by a writer that died before
//! its rename; `clear` removes every file the index owns.

use crate::cache::entry::{CacheEntry, ContentRef};
use crate::cache::index::CacheIndex;
use crate::cache::key::CompositeKey;
use crate::error::{StrataError, StrataResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Extension of committed records
const RECORD_EXT: &str = "json";

/// Extension of in-flight writes
const TEMP_EXT: &str = "tmp";

/// Temp files older than this belong to a writer that is gone
const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// A file found in the index directory
#[derive(Debug)]
enum IndexFile {
    Record(CacheEntry),
    Corrupt,
    Temp { modified: Option<SystemTime> },
}

impl IndexFile {
    fn is_stale_temp(&self) -> bool {
        match self {
            Self::Temp { modified } => modified
                .and_then(|m| m.elapsed().ok())
                .is_some_and(|age| age >= STALE_TEMP_AGE),
            _ => false,
        }
    }
}

/// Directory-backed cache index
#[derive(Debug, Clone)]
pub struct FileIndex {
    dir: PathBuf,
}

impl FileIndex {
    /// Open (creating if needed) an index rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> StrataResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StrataError::cache_unavailable(format!("creating {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Root directory of the index
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &CompositeKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.digest().to_hex(), RECORD_EXT))
    }

    fn unavailable(&self, action: &str, path: &Path, e: std::io::Error) -> StrataError {
        StrataError::cache_unavailable(format!("{} {}: {}", action, path.display(), e))
    }

    /// Read a record; `None` if it vanished
    fn read_record(&self, path: &Path) -> StrataResult<Option<IndexFile>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.unavailable("reading", path, e)),
        };

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Ok(Some(IndexFile::Record(entry))),
            Err(e) => {
                warn!("Ignoring corrupt cache record {}: {}", path.display(), e);
                Ok(Some(IndexFile::Corrupt))
            }
        }
    }

    fn has_ext(path: &Path, ext: &str) -> bool {
        path.extension().is_some_and(|e| e == ext)
    }

    fn remove(&self, path: &Path) -> StrataResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            // Another build removed it first
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.unavailable("removing", path, e)),
        }
    }
}

impl CacheIndex for FileIndex {
    fn lookup(&self, key: &CompositeKey) -> StrataResult<Option<CacheEntry>> {
        let path = self.record_path(key);
        match self.read_record(&path)? {
            // A record under the right name with a different key is not a hit
            Some(IndexFile::Record(entry)) if entry.key == *key => Ok(Some(entry)),
            _ => Ok(None),
        }
    }

    fn store(&self, key: &CompositeKey, content: ContentRef) -> StrataResult<CacheEntry> {
        let entry = CacheEntry::new(*key, content);
        let path = self.record_path(key);
        let tmp = self
            .dir
            .join(format!(
                ".{}.{}.{}",
                key.digest().short(),
                uuid::Uuid::new_v4(),
                TEMP_EXT
            ));

        let body = serde_json::to_string_pretty(&entry)?;
        fs::write(&tmp, body).map_err(|e| self.unavailable("writing", &tmp, e))?;

        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.unavailable("committing", &path, e));
        }

        debug!("Stored {} -> {}", key, entry.content);
        Ok(entry)
    }

    fn evict(&self, predicate: &dyn Fn(&CacheEntry) -> bool) -> StrataResult<usize> {
        let mut removed = 0;

        for (path, file) in self.scan()? {
            let doomed = match &file {
                IndexFile::Record(entry) => predicate(entry),
                IndexFile::Corrupt => true,
                IndexFile::Temp { .. } => file.is_stale_temp(),
            };
            if doomed && self.remove(&path)? {
                removed += 1;
            }
        }

        debug!("Evicted {} cache file(s) from {}", removed, self.dir.display());
        Ok(removed)
    }

    fn entries(&self) -> StrataResult<Vec<CacheEntry>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter_map(|(_, file)| match file {
                IndexFile::Record(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }

    /// Remove every record, parseable or not, and every temp file
    fn clear(&self) -> StrataResult<usize> {
        let mut removed = 0;
        for (path, _) in self.scan()? {
            if self.remove(&path)? {
                removed += 1;
            }
        }
        debug!("Cleared {} cache file(s) from {}", removed, self.dir.display());
        Ok(removed)
    }
}

impl FileIndex {
    /// Every record and temp file in the index directory
    fn scan(&self) -> StrataResult<Vec<(PathBuf, IndexFile)>> {
        let dir_entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(self.unavailable("listing", &self.dir, e)),
        };

        let mut files = Vec::new();
        for dir_entry in dir_entries {
            let dir_entry = dir_entry.map_err(|e| self.unavailable("listing", &self.dir, e))?;
            let path = dir_entry.path();

            if Self::has_ext(&path, TEMP_EXT) {
                let modified = dir_entry.metadata().and_then(|m| m.modified()).ok();
                files.push((path, IndexFile::Temp { modified }));
            } else if Self::has_ext(&path, RECORD_EXT) {
                if let Some(file) = self.read_record(&path)? {
                    files.push((path, file));
                }
            }
        }
        Ok(files)
    }
}
