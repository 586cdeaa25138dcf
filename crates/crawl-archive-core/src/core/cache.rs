// crates/crawl-archive-core/src/core/cache.rs
// ============================================================================
// Module: Crawl Cache Records
// Description: Persisted crawl disposition and the metrics recorded with it.
// Purpose: Model the crawl lifecycle state machine without exposing row absence.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A crawl starts [`Disposition::Unclassified`] and moves once to either
//! [`Disposition::Archived`] or [`Disposition::Rejected`]. Stores never
//! persist the unclassified state; a missing row is reported as an
//! unclassified record at the store boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::archive::CrawlMetrics;
use crate::core::archive::QualitySignals;
use crate::core::identifiers::CrawlId;

// ============================================================================
// SECTION: Disposition
// ============================================================================

/// Lifecycle state of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Not evaluated yet (no stored record).
    Unclassified,
    /// Archived remotely.
    Archived,
    /// Evaluated and not archived.
    Rejected,
}

impl Disposition {
    /// Returns the stable storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::Archived => "archived",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a stored label. Unknown labels return `None`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "unclassified" => Some(Self::Unclassified),
            "archived" => Some(Self::Archived),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the crawl must not be evaluated again.
    #[must_use]
    pub const fn is_classified(self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Metrics stored with a cache record for audit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordMetrics {
    /// Data size in bytes.
    pub bytes: Option<u64>,
    /// Data checksum.
    pub checksum: Option<String>,
    /// Logged error count.
    pub errors_count: Option<u64>,
    /// Data file count.
    pub files_count: Option<u64>,
}

impl RecordMetrics {
    /// Collects whatever metrics were computed for a crawl.
    #[must_use]
    pub fn from_parts(metrics: Option<&CrawlMetrics>, signals: Option<&QualitySignals>) -> Self {
        Self {
            bytes: metrics.map(|value| value.bytes),
            checksum: metrics.map(|value| value.checksum.clone()),
            errors_count: signals.map(|value| value.errors_count),
            files_count: metrics.map(|value| value.files_count),
        }
    }
}

/// Cached outcome for one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Crawl identifier (natural key).
    pub crawl_id: CrawlId,
    /// Lifecycle state.
    pub disposition: Disposition,
    /// Decision reason code, when evaluated.
    pub reason: Option<String>,
    /// Metrics recorded at evaluation time.
    pub metrics: RecordMetrics,
}

impl CacheRecord {
    /// Record reported for a crawl with no stored row.
    #[must_use]
    pub fn unclassified(crawl_id: CrawlId) -> Self {
        Self {
            crawl_id,
            disposition: Disposition::Unclassified,
            reason: None,
            metrics: RecordMetrics::default(),
        }
    }
}
