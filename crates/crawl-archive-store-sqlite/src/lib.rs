// crates/crawl-archive-store-sqlite/src/lib.rs
// ============================================================================
// Module: Crawl Archive SQLite Cache
// Description: Durable crawl lifecycle cache.
// Purpose: Remember which crawls were archived or rejected across runs.
// Dependencies: crawl-archive-core, rusqlite
// ============================================================================

//! ## Overview
//! [`SqliteStateCache`] persists one row per crawl. Rows are only ever
//! inserted or overwritten; a missing row reads back as unclassified.

pub mod store;

pub use store::SqliteCacheConfig;
pub use store::SqliteCacheError;
pub use store::SqliteStateCache;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
