// crates/crawl-archive-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and event sink wiring.
// Purpose: Ensure the command surface and sink selection stay stable.
// Dependencies: crawl-archive-cli main helpers
// ============================================================================

//! ## Overview
//! Validates clap parsing for `process` and `config validate`, and that the
//! configured event sink kind maps to a working sink.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use crawl_archive_config::EventSinkKind;
use crawl_archive_config::LoggingConfig;
use crawl_archive_core::runtime::ArchiveEvent;
use crawl_archive_core::runtime::EventLevel;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::build_event_sink;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn process_parses_config_and_dry_run() {
    let cli = Cli::try_parse_from(["crawl-archive", "process", "--config", "a.toml", "--dry-run"])
        .expect("parse");
    match cli.command {
        Some(Commands::Process(command)) => {
            assert_eq!(command.config, Some(PathBuf::from("a.toml")));
            assert!(command.dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn process_defaults_to_live_run() {
    let cli = Cli::try_parse_from(["crawl-archive", "process"]).expect("parse");
    match cli.command {
        Some(Commands::Process(command)) => {
            assert!(command.config.is_none());
            assert!(!command.dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn config_validate_parses() {
    let cli = Cli::try_parse_from(["crawl-archive", "config", "validate", "--config", "b.toml"])
        .expect("parse");
    match cli.command {
        Some(Commands::Config {
            command: ConfigCommand::Validate(command),
        }) => assert_eq!(command.config, Some(PathBuf::from("b.toml"))),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn version_flag_is_global() {
    let cli = Cli::try_parse_from(["crawl-archive", "--version"]).expect("parse");
    assert!(cli.show_version);
    assert!(cli.command.is_none());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["crawl-archive", "upload"]).is_err());
}

#[test]
fn file_sink_appends_json_lines() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("events.jsonl");
    let config = LoggingConfig {
        sink: EventSinkKind::File,
        path: Some(path.clone()),
    };
    let sink = build_event_sink(&config).expect("sink");
    sink.record(&ArchiveEvent::new("run_summary", EventLevel::Info).detail("archived=0"));
    sink.record(&ArchiveEvent::new("run_summary", EventLevel::Info).detail("archived=1"));

    let text = fs::read_to_string(&path).expect("read events");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("archived=1"));
}

#[test]
fn file_sink_without_path_is_rejected() {
    let config = LoggingConfig {
        sink: EventSinkKind::File,
        path: None,
    };
    assert!(build_event_sink(&config).is_err());
}

#[test]
fn none_sink_discards_events() {
    let config = LoggingConfig {
        sink: EventSinkKind::None,
        path: None,
    };
    let sink = build_event_sink(&config).expect("sink");
    sink.record(&ArchiveEvent::new("run_summary", EventLevel::Info));
}
