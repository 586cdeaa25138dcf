// crates/crawl-archive-config/src/lib.rs
// ============================================================================
// Module: Crawl Archive Config Library
// Description: Config model and validation for crawl-archive.toml.
// Purpose: Single source of truth for archiver configuration semantics.
// Dependencies: crawl-archive-store-s3, crawl-archive-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `crawl-archive-config` loads `crawl-archive.toml`, applies defaults, and
//! validates it fail-closed before any crawl is touched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::CacheConfig;
pub use config::ConfigError;
pub use config::CrawlArchiveConfig;
pub use config::EventSinkKind;
pub use config::LoggingConfig;
pub use config::PathsConfig;
