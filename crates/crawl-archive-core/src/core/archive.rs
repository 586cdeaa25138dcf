// crates/crawl-archive-core/src/core/archive.rs
// ============================================================================
// Module: Archive Records
// Description: Crawl metrics, quality signals, and archived metadata.
// Purpose: Typed records compared by the decision policy and written remotely.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`CrawlMetrics`] and [`QualitySignals`] describe a local crawl.
//! [`ArchivedMetadata`] is the remote summary of an archived crawl and is
//! serialized verbatim as the `metadata.json` artifact. Older archives may lack
//! `errors_count` and `files_count`, so both are optional.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::Partition;

// ============================================================================
// SECTION: Local Crawl
// ============================================================================

/// Size and content summary of a crawl's data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlMetrics {
    /// Content checksum of the data directory.
    pub checksum: String,
    /// Total size of data files in bytes.
    pub bytes: u64,
    /// Number of data files.
    pub files_count: u64,
}

/// Quality signals derived from a crawl's run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualitySignals {
    /// Whether the run finished normally.
    pub finished: bool,
    /// Whether the run was bounded or sampled.
    pub subset: bool,
    /// Number of errors logged by the run.
    pub errors_count: u64,
}

impl QualitySignals {
    /// Returns true when the run finished normally.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns true when the run covered only part of the source.
    #[must_use]
    pub const fn is_subset(&self) -> bool {
        self.subset
    }

    /// Returns the logged error count.
    #[must_use]
    pub const fn errors_count(&self) -> u64 {
        self.errors_count
    }
}

/// Everything the decision policy knows about a local crawl.
///
/// `metrics` is `None` when the data directory is missing or holds no files;
/// `signals` is `None` when no log summary could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    /// Data directory metrics.
    pub metrics: Option<CrawlMetrics>,
    /// Log-derived quality signals.
    pub signals: Option<QualitySignals>,
}

// ============================================================================
// SECTION: Remote Archive
// ============================================================================

/// Remote summary of an archived crawl (`metadata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedMetadata {
    /// Content checksum of the archived data directory.
    pub checksum: String,
    /// Total size of the archived data files in bytes.
    pub bytes: u64,
    /// Error count of the archived run, when recorded.
    #[serde(default)]
    pub errors_count: Option<u64>,
    /// File count of the archived run, when recorded.
    #[serde(default)]
    pub files_count: Option<u64>,
}

impl ArchivedMetadata {
    /// Builds the metadata written for a newly archived crawl.
    #[must_use]
    pub fn from_crawl(metrics: &CrawlMetrics, signals: &QualitySignals) -> Self {
        Self {
            checksum: metrics.checksum.clone(),
            bytes: metrics.bytes,
            errors_count: Some(signals.errors_count),
            files_count: Some(metrics.files_count),
        }
    }
}

/// Most recent archive for a source from an earlier partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorBaseline {
    /// Archived metadata.
    pub metadata: ArchivedMetadata,
    /// Partition the metadata was found in.
    pub partition: Partition,
}
