use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use super::config::PipelineConfig;
use super::error::Result;
use super::loader::{load_dataset, Source};
use super::model::Table;

/// What identifies one version of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSignature {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceSignature {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CacheEntry {
    signature: SourceSignature,
    config: PipelineConfig,
    table: Arc<Table>,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Outcome of [`DatasetCache::get_or_load`].
#[derive(Debug, Clone)]
pub struct Lookup {
    pub table: Arc<Table>,
    /// `false` when the table came straight from the cache.
    pub loaded: bool,
}

/// Normalized tables keyed by canonical path.
///
/// An entry is reused while the file's modification time, length and the
/// pipeline config are unchanged. Each path has its own lock, so at most one
/// load per file is in flight while other files load independently.
#[derive(Default)]
pub struct DatasetCache {
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, path: &Path, config: &PipelineConfig) -> Result<Lookup> {
        let key = path.canonicalize()?;
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let signature = SourceSignature::of(&key)?;
        if let Some(cached) = entry.as_ref() {
            if cached.signature == signature && cached.config == *config {
                return Ok(Lookup {
                    table: Arc::clone(&cached.table),
                    loaded: false,
                });
            }
        }

        let table = Arc::new(load_dataset(Source::Path(&key), config)?);
        *entry = Some(CacheEntry {
            signature,
            config: config.clone(),
            table: Arc::clone(&table),
        });
        Ok(Lookup {
            table,
            loaded: true,
        })
    }

    /// Drop the entry for `path`, if any.
    pub fn invalidate(&self, path: &Path) {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
