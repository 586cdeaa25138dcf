// crates/crawl-archive-core/src/runtime/error.rs
// ============================================================================
// Module: Archive Runtime Errors
// Description: Errors that abort processing of a single crawl.
// Purpose: Unify backend failures so the orchestrator can report and move on.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! [`ArchiveError`] wraps each boundary error transparently. The orchestrator
//! records it as a crawl failure and leaves the crawl unclassified.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::IdentifierError;
use crate::interfaces::CacheError;
use crate::interfaces::LogSummaryError;
use crate::interfaces::ObjectStoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal error for the crawl being processed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Remote storage failure other than a tolerated absence.
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    /// State cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Log summary lookup failure.
    #[error(transparent)]
    LogSummary(#[from] LogSummaryError),
    /// Malformed source or period directory name.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    /// Local filesystem failure while measuring, packaging, or cleaning up.
    #[error("archive io error: {0}")]
    Io(String),
    /// Local data that cannot be archived as-is.
    #[error("archive invalid data: {0}")]
    Invalid(String),
    /// Data artifact promoted but metadata artifact not; remote pair is inconsistent.
    #[error("archive partially committed: {0}")]
    PartialCommit(String),
}
