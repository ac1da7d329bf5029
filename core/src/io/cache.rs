//! Memoization of loaded measurement tables keyed by file identity.
//!
//! A cache is an optimization only: a failed read is a miss and a failed
//! write is logged and dropped.

use crate::model::MeasurementTable;
use crate::prelude::CnetResult;
use crate::telemetry::LogManager;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

/// File identity: path plus last-modified time in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: PathBuf,
    mtime_ns: u128,
}

impl CacheKey {
    pub fn new(path: impl Into<PathBuf>, mtime_ns: u128) -> Self {
        Self {
            path: path.into(),
            mtime_ns,
        }
    }

    pub fn for_file(path: &Path) -> CnetResult<Self> {
        let modified = fs::metadata(path)?.modified()?;
        let mtime_ns = modified
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        Ok(Self::new(path, mtime_ns))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mtime_ns(&self) -> u128 {
        self.mtime_ns
    }

    pub fn as_string(&self) -> String {
        format!("cnet:{}:{}", self.path.display(), self.mtime_ns)
    }
}

pub trait TableCache {
    fn get(&self, key: &CacheKey) -> Option<MeasurementTable>;
    fn set(&self, key: &CacheKey, table: &MeasurementTable) -> CnetResult<()>;
}

/// Process-local cache, mostly for tests and single sessions.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, MeasurementTable>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<MeasurementTable> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &CacheKey, table: &MeasurementTable) -> CnetResult<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.clone(), table.clone());
        }
        Ok(())
    }
}

/// One JSON document per key under a cache directory.
pub struct DiskCache {
    root: PathBuf,
    logger: LogManager,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            logger: LogManager::new("cache"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let name: String = key
            .as_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{}.json", name))
    }
}

impl TableCache for DiskCache {
    fn get(&self, key: &CacheKey) -> Option<MeasurementTable> {
        let entry = self.entry_path(key);
        let contents = match fs::read(&entry) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                self.logger
                    .warn(&format!("unreadable cache entry {}: {}", entry.display(), err));
                return None;
            }
        };
        match serde_json::from_slice(&contents) {
            Ok(table) => Some(table),
            Err(err) => {
                self.logger
                    .warn(&format!("corrupt cache entry {}: {}", entry.display(), err));
                None
            }
        }
    }

    fn set(&self, key: &CacheKey, table: &MeasurementTable) -> CnetResult<()> {
        fs::create_dir_all(&self.root)?;
        let payload = serde_json::to_vec(table).map_err(std::io::Error::from)?;
        // Write-then-rename so concurrent loaders never observe a partial entry.
        let mut staging = tempfile::NamedTempFile::new_in(&self.root)?;
        staging.write_all(&payload)?;
        staging
            .persist(self.entry_path(key))
            .map_err(|err| err.error)?;
        Ok(())
    }
}
