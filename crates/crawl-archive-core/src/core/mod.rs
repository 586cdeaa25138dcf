// crates/crawl-archive-core/src/core/mod.rs
// ============================================================================
// Module: Crawl Archive Core Types
// Description: Identifiers, archive records, cache records, and the decision policy.
// Purpose: Provide the pure, backend-agnostic model of crawl archiving.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types carry no I/O. Everything here can be constructed in tests
//! without a filesystem, an object store, or a database.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod archive;
pub mod cache;
pub mod decision;
pub mod identifiers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archive::ArchivedMetadata;
pub use archive::Candidate;
pub use archive::CrawlMetrics;
pub use archive::PriorBaseline;
pub use archive::QualitySignals;
pub use cache::CacheRecord;
pub use cache::Disposition;
pub use cache::RecordMetrics;
pub use decision::AcceptReason;
pub use decision::Decision;
pub use decision::Qualified;
pub use decision::RejectReason;
pub use decision::decide;
pub use decision::precheck;
pub use identifiers::CrawlId;
pub use identifiers::IdentifierError;
pub use identifiers::Partition;
pub use identifiers::Period;
pub use identifiers::SourceId;
