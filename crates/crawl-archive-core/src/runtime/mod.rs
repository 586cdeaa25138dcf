// crates/crawl-archive-core/src/runtime/mod.rs
// ============================================================================
// Module: Crawl Archive Runtime
// Description: Discovery, metrics, index, uploader, and orchestrator.
// Purpose: Execute archival passes against injected backends.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime is synchronous. Backends are injected as trait objects, so
//! the same orchestrator drives S3 and `SQLite` in production and the
//! in-memory doubles in tests.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod discovery;
pub mod error;
pub mod events;
pub mod index;
pub mod layout;
pub mod memory;
pub mod metrics;
pub mod orchestrator;
pub mod scrapy_log;
pub mod uploader;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use discovery::Crawl;
pub use discovery::CrawlDiscovery;
pub use discovery::Crawls;
pub use error::ArchiveError;
pub use events::ArchiveEvent;
pub use events::EventLevel;
pub use events::FileEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use index::RemoteArchiveIndex;
pub use layout::ArchiveArtifact;
pub use memory::InMemoryObjectStore;
pub use memory::InMemoryStateCache;
pub use memory::StoreOperation;
pub use memory::StoreOperationKind;
pub use metrics::measure_directory;
pub use orchestrator::CrawlFailure;
pub use orchestrator::Orchestrator;
pub use orchestrator::RunReport;
pub use scrapy_log::ScrapyLog;
pub use scrapy_log::ScrapyLogDirectory;
pub use uploader::StagedUploader;
