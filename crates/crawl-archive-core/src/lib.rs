// crates/crawl-archive-core/src/lib.rs
// ============================================================================
// Module: Crawl Archive Core Library
// Description: Archive decision policy, crawl lifecycle, and staged uploads.
// Purpose: Keep exactly one best crawl per source and period in remote storage.
// Dependencies: flate2, serde, sha2, tar, tempfile, thiserror, time
// ============================================================================

//! ## Overview
//! For each locally collected crawl, the [`Orchestrator`] decides whether
//! the copy already archived remotely should be superseded, and if so
//! replaces it through a staged upload and removes the local files.
//! Invariants:
//! - Each crawl is archived or rejected at most once ([`StateCache`]).
//! - Readers only consult metadata, which is promoted after data. A failed
//!   metadata promotion can leave a new data artifact next to older metadata
//!   until the crawl is retried.
//! - Decisions are a pure function of metrics, signals, and baselines
//!   ([`decide`]).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::AcceptReason;
pub use crate::core::ArchivedMetadata;
pub use crate::core::CacheRecord;
pub use crate::core::Candidate;
pub use crate::core::CrawlId;
pub use crate::core::CrawlMetrics;
pub use crate::core::Decision;
pub use crate::core::Disposition;
pub use crate::core::IdentifierError;
pub use crate::core::Partition;
pub use crate::core::Period;
pub use crate::core::PriorBaseline;
pub use crate::core::QualitySignals;
pub use crate::core::RecordMetrics;
pub use crate::core::RejectReason;
pub use crate::core::SourceId;
pub use crate::core::decide;
pub use crate::core::precheck;
pub use interfaces::ArchiveEventSink;
pub use interfaces::ArchiveIndex;
pub use interfaces::CacheError;
pub use interfaces::LogSummary;
pub use interfaces::LogSummaryError;
pub use interfaces::LogSummarySource;
pub use interfaces::ObjectStore;
pub use interfaces::ObjectStoreError;
pub use interfaces::StateCache;
pub use runtime::ArchiveError;
pub use runtime::Orchestrator;
pub use runtime::RunReport;
pub use runtime::StagedUploader;
