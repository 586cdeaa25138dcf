// crates/crawl-archive-core/src/core/decision.rs
// ============================================================================
// Module: Archive Decision Policy
// Description: Accept/reject classification of a local crawl against remote baselines.
// Purpose: Decide whether a local crawl supersedes what is already archived.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`decide`] is a pure function. Preconditions on the local crawl are
//! evaluated first in a fixed order; then the crawl is compared against the
//! exact-period baseline if one exists, otherwise against the latest
//! earlier-period baseline, otherwise it is accepted.
//!
//! ## Invariants
//! - The same-period size rule is strict (`<=` rejects); the prior-period
//!   rules use `>=`. The two are intentionally not unified.
//! - The 1.5x prior-period rule is exact integer arithmetic.
//! - Reason codes are stable strings; logs and tests match them verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::core::archive::ArchivedMetadata;
use crate::core::archive::Candidate;
use crate::core::archive::CrawlMetrics;
use crate::core::archive::PriorBaseline;
use crate::core::archive::QualitySignals;

// ============================================================================
// SECTION: Reasons
// ============================================================================

/// Why a crawl is archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptReason {
    /// Same-period archive exists and the local crawl improves on it.
    SamePeriodImproved,
    /// Local crawl is at least 1.5x the size of the prior-period archive.
    PriorPeriodMuchLarger,
    /// Local crawl has no more errors and no less data than the prior archive.
    PriorPeriodCleanerOrEqualAndLargerOrEqual,
    /// Nothing archived for this source yet.
    NoExistingArchive,
}

impl AcceptReason {
    /// Returns the stable reason code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SamePeriodImproved => "same_period_improved",
            Self::PriorPeriodMuchLarger => "prior_period_much_larger",
            Self::PriorPeriodCleanerOrEqualAndLargerOrEqual => {
                "prior_period_cleaner_or_equal_and_larger_or_equal"
            }
            Self::NoExistingArchive => "no_existing_archive",
        }
    }
}

/// Why a crawl is not archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Data directory missing or empty.
    NoDataFiles,
    /// No log summary could be resolved.
    NoLogFile,
    /// Run was bounded by from/until arguments or sampled.
    Subset,
    /// Run did not finish normally.
    NotFinished,
    /// Same-period archive has the same checksum.
    SamePeriodSameChecksum,
    /// Same-period archive has fewer errors.
    SamePeriodMoreErrors,
    /// Same-period archive is at least as large.
    SamePeriodSameOrSmaller,
    /// Prior-period archive has the same checksum.
    PriorPeriodSameChecksum,
    /// No rule found the crawl better than the prior-period archive.
    PriorPeriodNoImprovement,
}

impl RejectReason {
    /// Returns the stable reason code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoDataFiles => "no_data_files",
            Self::NoLogFile => "no_log_file",
            Self::Subset => "subset",
            Self::NotFinished => "not_finished",
            Self::SamePeriodSameChecksum => "same_period_same_checksum",
            Self::SamePeriodMoreErrors => "same_period_more_errors",
            Self::SamePeriodSameOrSmaller => "same_period_same_or_smaller",
            Self::PriorPeriodSameChecksum => "prior_period_same_checksum",
            Self::PriorPeriodNoImprovement => "prior_period_no_improvement",
        }
    }
}

/// Outcome of the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// Archive the crawl.
    Accept(AcceptReason),
    /// Leave the crawl out of the archive.
    Reject(RejectReason),
}

impl Decision {
    /// Returns true for [`Decision::Accept`].
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept(_))
    }

    /// Returns the stable reason code.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Accept(reason) => reason.as_str(),
            Self::Reject(reason) => reason.as_str(),
        }
    }

    /// Returns the outcome label used in logs.
    #[must_use]
    pub const fn outcome(self) -> &'static str {
        match self {
            Self::Accept(_) => "archive",
            Self::Reject(_) => "skip",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.outcome(), self.reason())
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Crawl facts that survived every precondition.
#[derive(Debug, Clone, Copy)]
pub struct Qualified<'a> {
    /// Data directory metrics.
    pub metrics: &'a CrawlMetrics,
    /// Log-derived quality signals.
    pub signals: &'a QualitySignals,
}

/// Evaluates baseline-independent preconditions in their fixed order.
///
/// # Errors
///
/// Returns the [`RejectReason`] of the first violated precondition.
pub fn precheck(candidate: &Candidate) -> Result<Qualified<'_>, RejectReason> {
    let Some(metrics) = candidate.metrics.as_ref() else {
        return Err(RejectReason::NoDataFiles);
    };
    let Some(signals) = candidate.signals.as_ref() else {
        return Err(RejectReason::NoLogFile);
    };
    if signals.is_subset() {
        return Err(RejectReason::Subset);
    }
    if !signals.is_finished() {
        return Err(RejectReason::NotFinished);
    }
    Ok(Qualified {
        metrics,
        signals,
    })
}

/// Classifies a candidate crawl against its baselines.
///
/// `prior` is ignored whenever `exact` is present.
#[must_use]
pub fn decide(
    candidate: &Candidate,
    exact: Option<&ArchivedMetadata>,
    prior: Option<&PriorBaseline>,
) -> Decision {
    let qualified = match precheck(candidate) {
        Ok(qualified) => qualified,
        Err(reason) => return Decision::Reject(reason),
    };
    if let Some(baseline) = exact {
        return compare_same_period(qualified, baseline);
    }
    if let Some(baseline) = prior {
        return compare_prior_period(qualified, &baseline.metadata);
    }
    Decision::Accept(AcceptReason::NoExistingArchive)
}

/// Compares against an archive of the exact same period.
fn compare_same_period(crawl: Qualified<'_>, baseline: &ArchivedMetadata) -> Decision {
    if crawl.metrics.checksum == baseline.checksum {
        return Decision::Reject(RejectReason::SamePeriodSameChecksum);
    }
    if let Some(baseline_errors) = baseline.errors_count
        && crawl.signals.errors_count > baseline_errors
    {
        return Decision::Reject(RejectReason::SamePeriodMoreErrors);
    }
    if crawl.metrics.bytes <= baseline.bytes {
        return Decision::Reject(RejectReason::SamePeriodSameOrSmaller);
    }
    Decision::Accept(AcceptReason::SamePeriodImproved)
}

/// Compares against the latest archive from an earlier period.
fn compare_prior_period(crawl: Qualified<'_>, baseline: &ArchivedMetadata) -> Decision {
    if crawl.metrics.checksum == baseline.checksum {
        return Decision::Reject(RejectReason::PriorPeriodSameChecksum);
    }
    if at_least_one_and_a_half_times(crawl.metrics.bytes, baseline.bytes) {
        return Decision::Accept(AcceptReason::PriorPeriodMuchLarger);
    }
    if let Some(baseline_errors) = baseline.errors_count
        && crawl.signals.errors_count <= baseline_errors
        && crawl.metrics.bytes >= baseline.bytes
    {
        return Decision::Accept(AcceptReason::PriorPeriodCleanerOrEqualAndLargerOrEqual);
    }
    Decision::Reject(RejectReason::PriorPeriodNoImprovement)
}

/// Returns `candidate >= 1.5 * baseline` without floating point.
fn at_least_one_and_a_half_times(candidate: u64, baseline: u64) -> bool {
    u128::from(candidate) * 2 >= u128::from(baseline) * 3
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::at_least_one_and_a_half_times;

    #[test]
    fn size_multiplier_is_inclusive() {
        assert!(at_least_one_and_a_half_times(240, 160));
        assert!(!at_least_one_and_a_half_times(239, 160));
        assert!(at_least_one_and_a_half_times(0, 0));
    }

    #[test]
    fn size_multiplier_does_not_overflow() {
        assert!(at_least_one_and_a_half_times(u64::MAX, u64::MAX / 2));
        assert!(!at_least_one_and_a_half_times(u64::MAX / 2, u64::MAX));
    }
}
