// crates/crawl-archive-store-s3/src/lib.rs
// ============================================================================
// Module: Crawl Archive S3 Store
// Description: S3-backed object store.
// Purpose: Hold archived crawls in a bucket shared by the index and uploader.
// Dependencies: aws-config, aws-sdk-s3, crawl-archive-core, tokio
// ============================================================================

//! ## Overview
//! [`S3ObjectStore`] implements the synchronous object store interface by
//! blocking on a private Tokio runtime.

pub mod s3_object_store;

pub use s3_object_store::S3ObjectStore;
pub use s3_object_store::S3ObjectStoreConfig;
