// crates/crawl-archive-core/tests/decision.rs
// ============================================================================
// Module: Decision Policy Tests
// Description: Accept/reject rules against exact and prior baselines.
// Purpose: Pin every reason code and the rule ordering.
// ============================================================================

//! Decision policy tests covering preconditions and baseline comparisons.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use crawl_archive_core::AcceptReason;
use crawl_archive_core::ArchivedMetadata;
use crawl_archive_core::Candidate;
use crawl_archive_core::CrawlMetrics;
use crawl_archive_core::Decision;
use crawl_archive_core::Partition;
use crawl_archive_core::PriorBaseline;
use crawl_archive_core::QualitySignals;
use crawl_archive_core::RejectReason;
use crawl_archive_core::decide;
use proptest::prelude::*;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn finished(errors_count: u64) -> QualitySignals {
    QualitySignals {
        finished: true,
        subset: false,
        errors_count,
    }
}

fn candidate(checksum: &str, bytes: u64, errors_count: u64) -> Candidate {
    Candidate {
        metrics: Some(CrawlMetrics {
            checksum: checksum.to_string(),
            bytes,
            files_count: 1,
        }),
        signals: Some(finished(errors_count)),
    }
}

fn archived(checksum: &str, bytes: u64, errors_count: Option<u64>) -> ArchivedMetadata {
    ArchivedMetadata {
        checksum: checksum.to_string(),
        bytes,
        errors_count,
        files_count: None,
    }
}

fn prior(checksum: &str, bytes: u64, errors_count: Option<u64>) -> PriorBaseline {
    PriorBaseline {
        metadata: archived(checksum, bytes, errors_count),
        partition: Partition {
            year: 2020,
            month: 8,
        },
    }
}

// ============================================================================
// SECTION: Preconditions
// ============================================================================

#[test]
fn missing_data_wins_over_missing_log() {
    let decision = decide(&Candidate::default(), None, None);
    assert_eq!(decision, Decision::Reject(RejectReason::NoDataFiles));
    assert_eq!(decision.reason(), "no_data_files");
}

#[test]
fn missing_log_rejects_crawl_with_data() {
    let mut crawl = candidate("a", 10, 0);
    crawl.signals = None;
    assert_eq!(decide(&crawl, None, None), Decision::Reject(RejectReason::NoLogFile));
}

#[test]
fn subset_is_checked_before_finished() {
    let mut crawl = candidate("a", 10, 0);
    crawl.signals = Some(QualitySignals {
        finished: false,
        subset: true,
        errors_count: 0,
    });
    assert_eq!(decide(&crawl, None, None), Decision::Reject(RejectReason::Subset));
}

#[test]
fn unfinished_run_is_rejected() {
    let mut crawl = candidate("a", 10, 0);
    crawl.signals = Some(QualitySignals::default());
    assert_eq!(decide(&crawl, None, None).reason(), "not_finished");
}

#[test]
fn preconditions_apply_even_with_baselines() {
    let mut crawl = candidate("a", 1_000, 0);
    crawl.signals = Some(QualitySignals::default());
    let decision = decide(&crawl, Some(&archived("b", 1, None)), Some(&prior("c", 1, None)));
    assert_eq!(decision, Decision::Reject(RejectReason::NotFinished));
}

// ============================================================================
// SECTION: Same Period
// ============================================================================

#[test]
fn same_period_size_threshold() {
    let baseline = archived("old", 239, None);
    let equal = decide(&candidate("new", 239, 0), Some(&baseline), None);
    assert_eq!(equal.reason(), "same_period_same_or_smaller");
    let larger = decide(&candidate("new", 240, 0), Some(&baseline), None);
    assert_eq!(larger, Decision::Accept(AcceptReason::SamePeriodImproved));
}

#[test]
fn same_period_identical_checksum_is_rejected() {
    let decision = decide(&candidate("same", 1_000, 0), Some(&archived("same", 10, None)), None);
    assert_eq!(decision.reason(), "same_period_same_checksum");
}

#[test]
fn same_period_more_errors_dominates_size() {
    let decision = decide(&candidate("new", 10_000, 1), Some(&archived("old", 10, Some(0))), None);
    assert_eq!(decision, Decision::Reject(RejectReason::SamePeriodMoreErrors));
}

#[test]
fn same_period_unknown_baseline_errors_fall_through_to_size() {
    let decision = decide(&candidate("new", 11, 50), Some(&archived("old", 10, None)), None);
    assert_eq!(decision.reason(), "same_period_improved");
}

#[test]
fn exact_baseline_shadows_prior_baseline() {
    let decision = decide(
        &candidate("new", 100, 0),
        Some(&archived("old", 100, None)),
        Some(&prior("older", 1, Some(9))),
    );
    assert_eq!(decision.reason(), "same_period_same_or_smaller");
}

// ============================================================================
// SECTION: Prior Period
// ============================================================================

#[test]
fn prior_period_much_larger_ignores_errors() {
    let decision = decide(&candidate("new", 240, 99), None, Some(&prior("old", 160, Some(0))));
    assert_eq!(decision, Decision::Accept(AcceptReason::PriorPeriodMuchLarger));
    assert_eq!(decision.reason(), "prior_period_much_larger");
}

#[test]
fn prior_period_equal_size_and_errors_accepts() {
    let decision = decide(&candidate("new", 160, 2), None, Some(&prior("old", 160, Some(2))));
    assert_eq!(decision.reason(), "prior_period_cleaner_or_equal_and_larger_or_equal");
}

#[test]
fn prior_period_identical_checksum_is_rejected() {
    let decision = decide(&candidate("same", 1_000, 0), None, Some(&prior("same", 10, Some(0))));
    assert_eq!(decision.reason(), "prior_period_same_checksum");
}

#[test]
fn prior_period_unknown_errors_below_threshold_rejects() {
    let decision = decide(&candidate("new", 200, 0), None, Some(&prior("old", 160, None)));
    assert_eq!(decision, Decision::Reject(RejectReason::PriorPeriodNoImprovement));
}

#[test]
fn prior_period_more_errors_below_threshold_rejects() {
    let decision = decide(&candidate("new", 200, 3), None, Some(&prior("old", 160, Some(2))));
    assert_eq!(decision.reason(), "prior_period_no_improvement");
}

#[test]
fn prior_period_smaller_rejects() {
    let decision = decide(&candidate("new", 159, 0), None, Some(&prior("old", 160, Some(5))));
    assert_eq!(decision.reason(), "prior_period_no_improvement");
}

#[test]
fn no_baseline_accepts() {
    let decision = decide(&candidate("new", 1, 100), None, None);
    assert_eq!(decision, Decision::Accept(AcceptReason::NoExistingArchive));
    assert_eq!(decision.outcome(), "archive");
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn much_larger_matches_integer_rule(candidate_bytes in any::<u64>(), baseline_bytes in any::<u64>()) {
        let decision = decide(
            &candidate("new", candidate_bytes, 1),
            None,
            Some(&prior("old", baseline_bytes, Some(0))),
        );
        let much_larger =
            2 * u128::from(candidate_bytes) >= 3 * u128::from(baseline_bytes);
        prop_assert_eq!(
            decision == Decision::Accept(AcceptReason::PriorPeriodMuchLarger),
            much_larger
        );
    }

    #[test]
    fn identical_checksum_never_archives(bytes in any::<u64>(), base in any::<u64>(), exact in any::<bool>()) {
        let crawl = candidate("same", bytes, 0);
        let decision = if exact {
            decide(&crawl, Some(&archived("same", base, None)), None)
        } else {
            decide(&crawl, None, Some(&prior("same", base, None)))
        };
        prop_assert!(!decision.is_accept());
    }

    #[test]
    fn same_period_accepts_only_strictly_larger(bytes in any::<u64>(), base in any::<u64>()) {
        let decision = decide(&candidate("new", bytes, 0), Some(&archived("old", base, Some(0))), None);
        prop_assert_eq!(decision.is_accept(), bytes > base);
    }
}
