//! Build-on-miss metadata builder
//!
//! Wraps a [`MetadataClient`] and an extractor. When the cache file is missing,
//! the builder extracts the record from the source system, lets the extractor
//! enhance it, writes it to the cache path and then reads it back through the
//! client.
//!
//! Flow:
//! 1. Client read (lock-free when already loaded)
//! 2. On `FileNotFound`: take the client lock, re-check the file
//! 3. Still absent: `extract` → `enhance` → write JSON
//! 4. Release the lock, read again through the client
//!
//! Separate processes racing on the same cache path are not coordinated; both may
//! extract and the last writer wins.

use crate::cache::client::{write_cache_file, MetadataClient};
use crate::error::Result;
use crate::models::{DatasetId, MetadataRecord};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Source-specific extraction step
///
/// `extract` must return a fully populated record, or a `FileNotFound` error when
/// its own input is missing. `enhance` post-processes the record before it is
/// written and does nothing by default.
pub trait MetadataExtractor: Send + Sync {
    /// Short name used in logs
    fn source_kind(&self) -> &'static str;

    fn extract(&self) -> Result<MetadataRecord>;

    fn enhance(&self, _metadata: &mut MetadataRecord) -> Result<()> {
        Ok(())
    }
}

/// Metadata client that builds its cache file on first miss
pub struct MetadataBuilder<E> {
    client: MetadataClient,
    extractor: E,
}

impl<E: MetadataExtractor> MetadataBuilder<E> {
    pub fn new(extractor: E, dataset: DatasetId, metadata_file: Option<PathBuf>) -> Self {
        Self::from_client(MetadataClient::new(dataset, metadata_file), extractor)
    }

    pub fn from_client(client: MetadataClient, extractor: E) -> Self {
        Self { client, extractor }
    }

    /// Return the record, building and writing the cache file if it is missing
    pub fn get_metadata(&self) -> Result<&MetadataRecord> {
        match self.client.get_metadata() {
            Err(e) if e.is_not_found() => {
                debug!(path = %self.client.metadata_path().display(), "Cache miss");
            }
            other => return other,
        }

        {
            let _guard = self.client.lock();

            // A concurrent caller may have written the file while we waited
            if self.client.cache_exists() {
                debug!(
                    path = %self.client.metadata_path().display(),
                    "Cache file appeared while waiting, skipping build"
                );
            } else {
                self.build_cache_file()?;
            }
        }

        self.client.get_metadata()
    }

    /// Extract, enhance and write. Caller holds the client lock.
    fn build_cache_file(&self) -> Result<()> {
        let start = Instant::now();
        let path = self.client.metadata_path();

        let mut record = self.extractor.extract()?;
        self.extractor.enhance(&mut record)?;
        write_cache_file(path, &record)?;

        info!(
            source = self.extractor.source_kind(),
            dataset = %self.client.dataset(),
            path = %path.display(),
            tables = record.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built metadata cache"
        );
        Ok(())
    }

    pub fn client(&self) -> &MetadataClient {
        &self.client
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }
}
