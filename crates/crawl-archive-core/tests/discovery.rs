// crates/crawl-archive-core/tests/discovery.rs
// ============================================================================
// Module: Crawl Discovery Tests
// Description: Enumeration order and error items over temp directories.
// ============================================================================

//! Crawl discovery tests.

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

use std::fs;

use crawl_archive_core::ArchiveError;
use crawl_archive_core::runtime::CrawlDiscovery;

#[test]
fn crawls_are_listed_in_lexical_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    for path in [
        "zambia/20200101_000000",
        "scotland/20201001_000000",
        "scotland/20200902_052458",
        "armenia/20190101_120000",
    ] {
        fs::create_dir_all(temp.path().join(path)).expect("mkdir");
    }
    fs::write(temp.path().join("scotland/notes.txt"), "ignored").expect("write");

    let discovery = CrawlDiscovery::new(temp.path());
    let keys: Vec<String> =
        discovery.crawls().expect("crawls").map(|crawl| crawl.expect("crawl").id.key()).collect();

    assert_eq!(keys, vec![
        "armenia/20190101_120000".to_string(),
        "scotland/20200902_052458".to_string(),
        "scotland/20201001_000000".to_string(),
        "zambia/20200101_000000".to_string(),
    ]);
}

#[test]
fn crawl_directory_is_under_data_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("scotland/20200902_052458")).expect("mkdir");
    let crawl = CrawlDiscovery::new(temp.path())
        .crawls()
        .expect("crawls")
        .next()
        .expect("item")
        .expect("crawl");
    assert_eq!(crawl.directory, temp.path().join("scotland").join("20200902_052458"));
    assert_eq!(crawl.id.period.partition().month, 9);
}

#[test]
fn malformed_period_is_an_error_item_and_pass_continues() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("scotland/20200902_052458")).expect("mkdir");
    fs::create_dir_all(temp.path().join("scotland/tmp")).expect("mkdir");
    fs::create_dir_all(temp.path().join("wales/20200101_000000")).expect("mkdir");

    let items: Vec<_> = CrawlDiscovery::new(temp.path()).crawls().expect("crawls").collect();

    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(ArchiveError::Invalid(_))));
    assert!(items[2].is_ok());
}

#[test]
fn passes_are_restartable() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("scotland/20200902_052458")).expect("mkdir");
    let discovery = CrawlDiscovery::new(temp.path());
    assert_eq!(discovery.crawls().expect("first").count(), 1);
    fs::create_dir_all(temp.path().join("scotland/20200903_000000")).expect("mkdir");
    assert_eq!(discovery.crawls().expect("second").count(), 2);
}

#[test]
fn missing_data_root_is_an_io_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let result = CrawlDiscovery::new(temp.path().join("missing")).crawls();
    assert!(matches!(result, Err(ArchiveError::Io(_))));
}
