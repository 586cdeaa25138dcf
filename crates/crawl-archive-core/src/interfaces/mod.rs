// crates/crawl-archive-core/src/interfaces/mod.rs
// ============================================================================
// Module: Crawl Archive Interfaces
// Description: Backend-agnostic traits for object storage, state caching, logs, and events.
// Purpose: Inject every external capability at construction instead of using globals.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime talks to the outside world only through the traits defined
//! here. Production backends live in sibling crates (S3, `SQLite`); in-memory
//! doubles live in [`crate::runtime::memory`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ArchivedMetadata;
use crate::core::CacheRecord;
use crate::core::CrawlId;
use crate::core::Period;
use crate::core::PriorBaseline;
use crate::core::QualitySignals;
use crate::core::SourceId;
use crate::runtime::events::ArchiveEvent;

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Object store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectStoreError {
    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Local I/O failure while reading or writing an object body.
    #[error("object store io error: {0}")]
    Io(String),
    /// Remote service failure (auth, network, server error).
    #[error("object store remote error: {0}")]
    Remote(String),
    /// Invalid key or request.
    #[error("object store invalid request: {0}")]
    Invalid(String),
}

impl ObjectStoreError {
    /// Returns true when the error means the object is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote object storage capability shared by the index and the uploader.
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file to `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the upload fails.
    fn put(&self, key: &str, source: &Path, content_type: &str) -> Result<(), ObjectStoreError>;

    /// Downloads the object at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] when the object is absent and
    /// other variants for every other failure.
    fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Server-side copies `from` to `to`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the copy fails.
    fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError>;

    /// Deletes the object at `key`. Deleting an absent object succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the delete fails.
    fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// Lists every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when listing fails.
    fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;
}

// ============================================================================
// SECTION: Archive Index
// ============================================================================

/// Read-only queries for previously archived crawls.
pub trait ArchiveIndex {
    /// Loads the archive for exactly this source and period partition.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] for any failure other than absence.
    fn lookup_exact(
        &self,
        source_id: &SourceId,
        period: &Period,
    ) -> Result<Option<ArchivedMetadata>, ObjectStoreError>;

    /// Loads the most recent archive for this source from a partition strictly
    /// earlier than `period`'s.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] for any failure other than absence.
    fn lookup_latest_before(
        &self,
        source_id: &SourceId,
        period: &Period,
    ) -> Result<Option<PriorBaseline>, ObjectStoreError>;
}

// ============================================================================
// SECTION: State Cache
// ============================================================================

/// State cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Cache I/O error.
    #[error("state cache io error: {0}")]
    Io(String),
    /// Cache engine error.
    #[error("state cache db error: {0}")]
    Db(String),
    /// Stored data failed validation.
    #[error("state cache corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is unsupported.
    #[error("state cache version mismatch: {0}")]
    VersionMismatch(String),
    /// Caller supplied an invalid record.
    #[error("state cache invalid data: {0}")]
    Invalid(String),
}

/// Durable per-crawl disposition store.
pub trait StateCache {
    /// Loads the record for a crawl; absence yields an unclassified record.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when loading fails.
    fn get(&self, crawl_id: &CrawlId) -> Result<CacheRecord, CacheError>;

    /// Stores a classified record, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Invalid`] for unclassified records and other
    /// variants when saving fails.
    fn set(&self, record: &CacheRecord) -> Result<(), CacheError>;
}

// ============================================================================
// SECTION: Log Summaries
// ============================================================================

/// Log summary lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogSummaryError {
    /// Log directory or file could not be read.
    #[error("log summary io error: {0}")]
    Io(String),
}

/// Quality signals resolved for a crawl, with the file they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSummary {
    /// Local log file; deleted once the crawl is archived.
    pub location: PathBuf,
    /// Parsed quality signals.
    pub signals: QualitySignals,
}

/// Resolves a crawl's run log into quality signals.
pub trait LogSummarySource {
    /// Finds the log summary for a crawl, or `None` when no log exists.
    ///
    /// # Errors
    ///
    /// Returns [`LogSummaryError`] when the log location cannot be read.
    fn resolve(&self, crawl_id: &CrawlId) -> Result<Option<LogSummary>, LogSummaryError>;
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Destination for structured archive events.
pub trait ArchiveEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &ArchiveEvent);
}
