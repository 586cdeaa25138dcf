// crates/crawl-archive-store-s3/tests/config_validation.rs
// ============================================================================
// Module: S3 Object Store Config Tests
// Description: Deserialization and validation of S3 store settings.
// ============================================================================

//! S3 object store config tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use crawl_archive_core::ObjectStoreError;
use crawl_archive_store_s3::S3ObjectStoreConfig;

fn parse(text: &str) -> S3ObjectStoreConfig {
    toml::from_str(text).expect("parse config")
}

#[test]
fn minimal_config_uses_defaults() {
    let config = parse("bucket = \"ocp-archive\"\n");
    assert_eq!(config, S3ObjectStoreConfig::new("ocp-archive"));
    assert!(config.validate().is_ok());
}

#[test]
fn full_config_round_trips() {
    let config = parse(
        r#"
bucket = "ocp-archive"
region = "eu-west-1"
endpoint = "http://localhost:9000"
prefix = "crawls"
force_path_style = true
allow_http = true
"#,
    );
    assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    assert!(config.force_path_style);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_bucket_is_invalid() {
    let config = S3ObjectStoreConfig::new("  ");
    assert!(matches!(config.validate(), Err(ObjectStoreError::Invalid(_))));
}

#[test]
fn http_endpoint_requires_opt_in() {
    let mut config = S3ObjectStoreConfig::new("ocp-archive");
    config.endpoint = Some("http://localhost:9000".to_string());
    assert!(matches!(config.validate(), Err(ObjectStoreError::Invalid(_))));
    config.allow_http = true;
    assert!(config.validate().is_ok());
}

#[test]
fn non_http_endpoint_is_invalid() {
    let mut config = S3ObjectStoreConfig::new("ocp-archive");
    config.endpoint = Some("ftp://example.com".to_string());
    assert!(matches!(config.validate(), Err(ObjectStoreError::Invalid(_))));
}

#[test]
fn traversal_prefix_is_invalid() {
    let mut config = S3ObjectStoreConfig::new("ocp-archive");
    config.prefix = Some("crawls/../other".to_string());
    assert!(matches!(config.validate(), Err(ObjectStoreError::Invalid(_))));
}
