// crates/crawl-archive-core/src/core/identifiers.rs
// ============================================================================
// Module: Crawl Identifiers
// Description: Source, period, and crawl identifiers with stable string forms.
// Purpose: Provide strongly typed keys for local directories, cache rows, and remote partitions.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! A crawl is identified by its source and its period. The period is the
//! crawl start time truncated to the second and is spelled on disk as
//! `YYYYMMDD_HHMMSS`; its year and month select the remote partition.
//! [`CrawlId`] renders as `source_id/period`, which is also the cache key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// On-disk period format (`YYYYMMDD_HHMMSS`).
const PERIOD_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");
/// Maximum length of a source identifier.
const MAX_SOURCE_ID_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Source identifier is empty or contains forbidden characters.
    #[error("invalid source id: {0}")]
    InvalidSource(String),
    /// Period label does not match `YYYYMMDD_HHMMSS`.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    /// Crawl identifier is not `source_id/period`.
    #[error("invalid crawl id: {0}")]
    InvalidCrawlId(String),
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Source (spider) identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a new source identifier without validation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses a source identifier usable as a path segment and object key prefix.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidSource`] for empty, dotted, overlong,
    /// or separator-bearing values.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.is_empty()
            || value == "."
            || value == ".."
            || value.len() > MAX_SOURCE_ID_LENGTH
            || value.contains('/')
            || value.contains('\\')
        {
            return Err(IdentifierError::InvalidSource(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Period
// ============================================================================

/// Crawl period: start timestamp truncated to the second.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    /// Start timestamp.
    at: PrimitiveDateTime,
    /// Canonical `YYYYMMDD_HHMMSS` label.
    label: String,
}

impl Period {
    /// Parses a `YYYYMMDD_HHMMSS` label.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidPeriod`] when the label does not parse.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let at = PrimitiveDateTime::parse(value, PERIOD_FORMAT)
            .map_err(|_| IdentifierError::InvalidPeriod(value.to_string()))?;
        Self::from_datetime(at)
    }

    /// Builds a period from a timestamp, dropping sub-second precision.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidPeriod`] when the timestamp cannot be
    /// rendered in the on-disk format (e.g. negative years).
    pub fn from_datetime(at: PrimitiveDateTime) -> Result<Self, IdentifierError> {
        let at = at
            .replace_nanosecond(0)
            .map_err(|err| IdentifierError::InvalidPeriod(err.to_string()))?;
        let label =
            at.format(PERIOD_FORMAT).map_err(|err| IdentifierError::InvalidPeriod(err.to_string()))?;
        Ok(Self {
            at,
            label,
        })
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn datetime(&self) -> PrimitiveDateTime {
        self.at
    }

    /// Returns the partition year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.at.year()
    }

    /// Returns the partition month (1-12).
    #[must_use]
    pub fn month(&self) -> u8 {
        u8::from(self.at.month())
    }

    /// Returns the remote partition for this period.
    #[must_use]
    pub fn partition(&self) -> Partition {
        Partition {
            year: self.year(),
            month: self.month(),
        }
    }

    /// Returns the canonical label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.label.fmt(f)
    }
}

impl TryFrom<String> for Period {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.label
    }
}

/// Remote `(year, month)` partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Partition {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u8,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month)
    }
}

// ============================================================================
// SECTION: Crawl
// ============================================================================

/// Natural key of a crawl: `source_id/period`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CrawlId {
    /// Source identifier.
    pub source_id: SourceId,
    /// Crawl period.
    pub period: Period,
}

impl CrawlId {
    /// Creates a crawl identifier.
    #[must_use]
    pub const fn new(source_id: SourceId, period: Period) -> Self {
        Self {
            source_id,
            period,
        }
    }

    /// Parses a `source_id/period` key.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when either half is invalid.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let Some((source, period)) = value.split_once('/') else {
            return Err(IdentifierError::InvalidCrawlId(value.to_string()));
        };
        Ok(Self::new(SourceId::parse(source)?, Period::parse(period)?))
    }

    /// Returns the cache key form.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CrawlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_id, self.period)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::CrawlId;
    use super::Partition;
    use super::Period;
    use super::SourceId;

    #[test]
    fn period_parses_directory_label() {
        let period = Period::parse("20200902_052458").expect("period");
        assert_eq!(period.year(), 2020);
        assert_eq!(period.month(), 9);
        assert_eq!(period.as_str(), "20200902_052458");
        assert_eq!(
            period.partition(),
            Partition {
                year: 2020,
                month: 9
            }
        );
    }

    #[test]
    fn period_rejects_malformed_labels() {
        assert!(Period::parse("2020-09-02").is_err());
        assert!(Period::parse("20201302_052458").is_err());
        assert!(Period::parse("").is_err());
    }

    #[test]
    fn periods_order_chronologically() {
        let earlier = Period::parse("20200131_235959").expect("period");
        let later = Period::parse("20200201_000000").expect("period");
        assert!(earlier < later);
    }

    #[test]
    fn crawl_id_roundtrips_through_key() {
        let id = CrawlId::parse("scotland/20200902_052458").expect("crawl id");
        assert_eq!(id.source_id, SourceId::new("scotland"));
        assert_eq!(id.key(), "scotland/20200902_052458");
        assert!(CrawlId::parse("scotland").is_err());
        assert!(CrawlId::parse("../20200902_052458").is_err());
    }

    #[test]
    fn partition_renders_zero_padded_month() {
        let partition = Partition {
            year: 2021,
            month: 3,
        };
        assert_eq!(partition.to_string(), "2021/03");
    }
}
