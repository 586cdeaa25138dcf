// crates/crawl-archive-core/src/runtime/events.rs
// ============================================================================
// Module: Archive Events
// Description: Structured archive events and JSON-line sinks.
// Purpose: Emit one machine-readable line per crawl decision without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every orchestrator step reports an [`ArchiveEvent`] to an
//! [`ArchiveEventSink`]. Sinks serialize events as JSON lines to stderr or an
//! append-only file; [`MemoryEventSink`] keeps them for assertions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::CrawlId;
use crate::core::Decision;
use crate::interfaces::ArchiveEventSink;

// ============================================================================
// SECTION: Event Names
// ============================================================================

/// Crawl skipped because the cache already classified it.
pub const EVENT_ALREADY_CLASSIFIED: &str = "crawl_already_classified";
/// Crawl rejected and recorded.
pub const EVENT_REJECTED: &str = "crawl_rejected";
/// Crawl archived and recorded.
pub const EVENT_ARCHIVED: &str = "crawl_archived";
/// Decision evaluated in dry-run mode; nothing changed.
pub const EVENT_DRY_RUN: &str = "crawl_dry_run";
/// Crawl processing aborted by an error.
pub const EVENT_FAILED: &str = "crawl_failed";
/// Directory under the data root that is not a crawl.
pub const EVENT_IGNORED: &str = "crawl_ignored";
/// Staging objects could not be removed after commit.
pub const EVENT_STAGING_CLEANUP_FAILED: &str = "staging_cleanup_failed";
/// Candidate log file that could not be read during log resolution.
pub const EVENT_LOG_SKIPPED: &str = "log_skipped";
/// Data promoted without its metadata.
pub const EVENT_PARTIAL_COMMIT: &str = "partial_commit";
/// End-of-run totals.
pub const EVENT_RUN_SUMMARY: &str = "run_summary";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Expected outcome.
    Info,
    /// Degraded but committed outcome.
    Warn,
    /// Crawl processing failed.
    Error,
}

/// Structured archive event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity.
    pub level: EventLevel,
    /// Crawl identifier when the event concerns one crawl.
    pub crawl_id: Option<String>,
    /// Decision outcome label (`archive` or `skip`).
    pub outcome: Option<&'static str>,
    /// Decision reason code or disposition.
    pub reason: Option<String>,
    /// Free-form detail (error text, totals).
    pub detail: Option<String>,
    /// Whether the run was a dry run.
    pub dry_run: bool,
}

impl ArchiveEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(event: &'static str, level: EventLevel) -> Self {
        Self {
            event,
            timestamp_ms: now_millis(),
            level,
            crawl_id: None,
            outcome: None,
            reason: None,
            detail: None,
            dry_run: false,
        }
    }

    /// Attaches a crawl identifier.
    #[must_use]
    pub fn crawl(mut self, crawl_id: &CrawlId) -> Self {
        self.crawl_id = Some(crawl_id.key());
        self
    }

    /// Attaches a decision outcome and its reason code.
    #[must_use]
    pub fn decision(mut self, decision: Decision) -> Self {
        self.outcome = Some(decision.outcome());
        self.reason = Some(decision.reason().to_string());
        self
    }

    /// Attaches a reason without an outcome.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches free-form detail.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Marks the event as produced by a dry run.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Returns the current unix epoch in milliseconds.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|now| now.as_millis()).unwrap_or_default()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ArchiveEventSink for StderrEventSink {
    fn record(&self, event: &ArchiveEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ArchiveEventSink for FileEventSink {
    fn record(&self, event: &ArchiveEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl ArchiveEventSink for NoopEventSink {
    fn record(&self, _event: &ArchiveEvent) {}
}

/// Event sink that keeps events in memory for tests and dry-run reports.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ArchiveEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ArchiveEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Removes and returns the recorded events.
    #[must_use]
    pub fn drain(&self) -> Vec<ArchiveEvent> {
        self.events.lock().map(|mut events| std::mem::take(&mut *events)).unwrap_or_default()
    }
}

impl ArchiveEventSink for MemoryEventSink {
    fn record(&self, event: &ArchiveEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
