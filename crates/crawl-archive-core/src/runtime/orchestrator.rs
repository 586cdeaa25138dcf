// crates/crawl-archive-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Archive Orchestrator
// Description: Sequential processing of every discovered crawl.
// Purpose: Tie discovery, cache, index, decision policy, and uploader together.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! One crawl is fully processed before the next starts:
//! cache check, metrics, log summary, baseline lookups, decision, then
//! upload and cache write. A crawl whose processing fails is reported and
//! left unclassified so the next run retries it; the pass continues.
//!
//! Invariants:
//! - Classified crawls are never re-evaluated.
//! - Baseline lookups run only once every precondition holds.
//! - The cache is written after the upload commits, never before.
//! - Dry runs read the cache and the index and write nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::CacheRecord;
use crate::core::Candidate;
use crate::core::Decision;
use crate::core::Disposition;
use crate::core::RecordMetrics;
use crate::core::decide;
use crate::core::precheck;
use crate::interfaces::ArchiveEventSink;
use crate::interfaces::ArchiveIndex;
use crate::interfaces::LogSummarySource;
use crate::interfaces::StateCache;
use crate::runtime::discovery::Crawl;
use crate::runtime::discovery::CrawlDiscovery;
use crate::runtime::error::ArchiveError;
use crate::runtime::events::ArchiveEvent;
use crate::runtime::events::EVENT_ALREADY_CLASSIFIED;
use crate::runtime::events::EVENT_ARCHIVED;
use crate::runtime::events::EVENT_DRY_RUN;
use crate::runtime::events::EVENT_FAILED;
use crate::runtime::events::EVENT_IGNORED;
use crate::runtime::events::EVENT_REJECTED;
use crate::runtime::events::EVENT_RUN_SUMMARY;
use crate::runtime::events::EventLevel;
use crate::runtime::metrics::measure_directory;
use crate::runtime::uploader::StagedUploader;

// ============================================================================
// SECTION: Report
// ============================================================================

/// Crawl whose processing failed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlFailure {
    /// Crawl identifier, or the offending path for discovery failures.
    pub crawl_id: String,
    /// Rendered error.
    pub error: String,
}

/// Totals for one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Crawls uploaded and recorded as archived.
    pub archived: u64,
    /// Crawls recorded as rejected.
    pub rejected: u64,
    /// Crawls skipped because the cache already classified them.
    pub already_classified: u64,
    /// Dry-run crawls that would have been archived.
    pub dry_run_accepted: u64,
    /// Dry-run crawls that would have been rejected.
    pub dry_run_rejected: u64,
    /// Directories under the data root that are not crawls.
    pub ignored: u64,
    /// Crawls left unclassified by an error.
    pub failures: Vec<CrawlFailure>,
}

impl RunReport {
    /// Returns true when at least one crawl failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Renders the totals as a single line.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "archived={} rejected={} already_classified={} dry_run_accepted={} \
             dry_run_rejected={} ignored={} failed={}",
            self.archived,
            self.rejected,
            self.already_classified,
            self.dry_run_accepted,
            self.dry_run_rejected,
            self.ignored,
            self.failures.len()
        )
    }
}

/// Outcome of processing one crawl.
enum CrawlOutcome {
    /// Cache already held a classification.
    AlreadyClassified,
    /// Decision recorded (or only reported, in a dry run).
    Decided(Decision),
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives one archival pass over the data root.
pub struct Orchestrator {
    /// Crawl enumeration.
    discovery: CrawlDiscovery,
    /// Durable crawl lifecycle state.
    cache: Box<dyn StateCache>,
    /// Remote baseline lookups.
    index: Box<dyn ArchiveIndex>,
    /// Log summary resolution.
    logs: Box<dyn LogSummarySource>,
    /// Accept-path executor.
    uploader: StagedUploader,
    /// Event sink.
    events: Arc<dyn ArchiveEventSink>,
}

impl Orchestrator {
    /// Creates an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        discovery: CrawlDiscovery,
        cache: Box<dyn StateCache>,
        index: Box<dyn ArchiveIndex>,
        logs: Box<dyn LogSummarySource>,
        uploader: StagedUploader,
        events: Arc<dyn ArchiveEventSink>,
    ) -> Self {
        Self {
            discovery,
            cache,
            index,
            logs,
            uploader,
            events,
        }
    }

    /// Processes every discovered crawl once.
    ///
    /// Per-crawl failures are collected in the report; only failing to list
    /// the data root aborts the run.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when the data root cannot be listed.
    pub fn process(&self, dry_run: bool) -> Result<RunReport, ArchiveError> {
        let mut report = RunReport::default();
        for item in self.discovery.crawls()? {
            let crawl = match item {
                Ok(crawl) => crawl,
                Err(ArchiveError::Io(message)) => {
                    self.record_failure(&mut report, "discovery".to_string(), message, dry_run);
                    continue;
                }
                Err(err) => {
                    self.events.record(
                        &ArchiveEvent::new(EVENT_IGNORED, EventLevel::Warn)
                            .detail(err.to_string())
                            .dry_run(dry_run),
                    );
                    report.ignored += 1;
                    continue;
                }
            };
            match self.process_crawl(&crawl, dry_run) {
                Ok(CrawlOutcome::AlreadyClassified) => report.already_classified += 1,
                Ok(CrawlOutcome::Decided(decision)) => match (dry_run, decision.is_accept()) {
                    (true, true) => report.dry_run_accepted += 1,
                    (true, false) => report.dry_run_rejected += 1,
                    (false, true) => report.archived += 1,
                    (false, false) => report.rejected += 1,
                },
                Err(err) => {
                    self.record_failure(&mut report, crawl.id.key(), err.to_string(), dry_run);
                }
            }
        }
        let level = if report.has_failures() { EventLevel::Error } else { EventLevel::Info };
        self.events.record(
            &ArchiveEvent::new(EVENT_RUN_SUMMARY, level).detail(report.summary()).dry_run(dry_run),
        );
        Ok(report)
    }

    /// Processes a single crawl.
    fn process_crawl(&self, crawl: &Crawl, dry_run: bool) -> Result<CrawlOutcome, ArchiveError> {
        let cached = self.cache.get(&crawl.id)?;
        if cached.disposition.is_classified() {
            let mut event = ArchiveEvent::new(EVENT_ALREADY_CLASSIFIED, EventLevel::Info)
                .crawl(&crawl.id)
                .detail(cached.disposition.as_str())
                .dry_run(dry_run);
            if let Some(reason) = cached.reason {
                event = event.reason(reason);
            }
            self.events.record(&event);
            return Ok(CrawlOutcome::AlreadyClassified);
        }

        let metrics = measure_directory(&crawl.directory)?;
        // No data files rejects before the log lookup can fail.
        let log = match metrics {
            Some(_) => self.logs.resolve(&crawl.id)?,
            None => None,
        };
        let candidate = Candidate {
            metrics: metrics.clone(),
            signals: log.as_ref().map(|summary| summary.signals),
        };
        let decision = self.evaluate(crawl, &candidate)?;

        if dry_run {
            self.events.record(
                &ArchiveEvent::new(EVENT_DRY_RUN, EventLevel::Info)
                    .crawl(&crawl.id)
                    .decision(decision)
                    .dry_run(true),
            );
            return Ok(CrawlOutcome::Decided(decision));
        }

        let (disposition, event) = match (decision, metrics.as_ref(), log.as_ref()) {
            (Decision::Accept(_), Some(metrics), Some(log)) => {
                self.uploader.archive(crawl, metrics, log)?;
                (Disposition::Archived, EVENT_ARCHIVED)
            }
            (Decision::Accept(_), ..) => {
                return Err(ArchiveError::Invalid(
                    "accepted crawl is missing metrics or log summary".to_string(),
                ));
            }
            (Decision::Reject(_), ..) => (Disposition::Rejected, EVENT_REJECTED),
        };
        self.cache.set(&CacheRecord {
            crawl_id: crawl.id.clone(),
            disposition,
            reason: Some(decision.reason().to_string()),
            metrics: RecordMetrics::from_parts(
                metrics.as_ref(),
                log.as_ref().map(|summary| &summary.signals),
            ),
        })?;
        self.events.record(
            &ArchiveEvent::new(event, EventLevel::Info).crawl(&crawl.id).decision(decision),
        );
        Ok(CrawlOutcome::Decided(decision))
    }

    /// Runs preconditions, then the baseline lookups the policy needs.
    fn evaluate(&self, crawl: &Crawl, candidate: &Candidate) -> Result<Decision, ArchiveError> {
        if let Err(reason) = precheck(candidate) {
            return Ok(Decision::Reject(reason));
        }
        let source_id = &crawl.id.source_id;
        let period = &crawl.id.period;
        let exact = self.index.lookup_exact(source_id, period)?;
        let prior = match exact {
            Some(_) => None,
            None => self.index.lookup_latest_before(source_id, period)?,
        };
        Ok(decide(candidate, exact.as_ref(), prior.as_ref()))
    }

    /// Reports a failed crawl.
    fn record_failure(&self, report: &mut RunReport, crawl_id: String, error: String, dry_run: bool) {
        let mut event =
            ArchiveEvent::new(EVENT_FAILED, EventLevel::Error).detail(error.clone()).dry_run(dry_run);
        event.crawl_id = Some(crawl_id.clone());
        self.events.record(&event);
        report.failures.push(CrawlFailure {
            crawl_id,
            error,
        });
    }
}
