//! Read-only metadata client
//!
//! Loads a pre-built JSON cache file into memory at most once per instance.
//! The first successful load is kept for the lifetime of the client; later calls
//! never touch the disk again.

use crate::error::{CoreError, Result};
use crate::models::{DatasetId, MetadataRecord};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Facts about a cache file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Client reading pre-processed metadata from a JSON cache file (thread-safe)
pub struct MetadataClient {
    dataset: DatasetId,
    metadata_path: PathBuf,
    metadata: OnceCell<MetadataRecord>,
    /// Guards loading and, for builders, building the cache file
    lock: Mutex<()>,
}

impl MetadataClient {
    /// Client for `dataset`, reading `metadata_file` or `{project_id}__{dataset_name}.json`
    pub fn new(dataset: DatasetId, metadata_file: Option<PathBuf>) -> Self {
        let metadata_path =
            metadata_file.unwrap_or_else(|| PathBuf::from(dataset.cache_file_name()));

        Self {
            dataset,
            metadata_path,
            metadata: OnceCell::new(),
            lock: Mutex::new(()),
        }
    }

    /// Return the cached record, loading it from disk on first use
    ///
    /// Fails with [`CoreError::FileNotFound`] when the cache file is absent.
    pub fn get_metadata(&self) -> Result<&MetadataRecord> {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata);
        }

        let _guard = self.lock.lock();

        // Another caller may have loaded it while we waited
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata);
        }

        let record = read_cache_file(&self.metadata_path)?;
        debug!(
            path = %self.metadata_path.display(),
            tables = record.len(),
            "Loaded metadata cache"
        );

        Ok(self.metadata.get_or_init(|| record))
    }

    pub fn dataset(&self) -> &DatasetId {
        &self.dataset
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// True once the record has been loaded into memory
    pub fn is_loaded(&self) -> bool {
        self.metadata.get().is_some()
    }

    pub fn cache_exists(&self) -> bool {
        self.metadata_path.exists()
    }

    /// Size and mtime of the cache file, `None` if it does not exist
    pub fn cache_info(&self) -> Result<Option<CacheFileInfo>> {
        let meta = match std::fs::metadata(&self.metadata_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::from_read(&self.metadata_path, e)),
        };

        Ok(Some(CacheFileInfo {
            path: self.metadata_path.clone(),
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

/// Read and parse a JSON cache file
pub fn read_cache_file(path: &Path) -> Result<MetadataRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::from_read(path, e))?;
    serde_json::from_str(&content).map_err(|e| CoreError::json_parse(path, e))
}

/// Write `record` to `path` as 2-space indented JSON, creating parent directories
pub fn write_cache_file(path: &Path, record: &MetadataRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(record).map_err(|e| CoreError::JsonSerialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    std::fs::write(path, json).map_err(|e| CoreError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
