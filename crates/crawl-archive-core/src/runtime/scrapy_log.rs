// crates/crawl-archive-core/src/runtime/scrapy_log.rs
// ============================================================================
// Module: Scrapy Log Summaries
// Description: Quality signals extracted from Scrapy crawl logs.
// Purpose: Resolve a crawl's log file and read its finish, subset, and error signals.
// Dependencies: crate::{core, interfaces, runtime::events}, time
// ============================================================================

//! ## Overview
//! Logs live at `{logs_root}/{source_id}/*.log`. A log belongs to a crawl
//! when the `'start_time': datetime.datetime(...)` entry of its final stats
//! dump equals the crawl period to the second. Only three facts are read:
//! - finished: `'finish_reason': 'finished'`;
//! - subset: the `Spider arguments: {...}` line names `from_date`,
//!   `until_date`, or `sample`;
//! - errors: `'log_count/ERROR': N`, zero when absent.
//!
//! Only the head (spider arguments) and tail (stats dump) of each candidate
//! log are read, so log size does not bound memory. A candidate that cannot
//! be read is reported as `log_skipped` and the search continues.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use time::Date;
use time::Month;
use time::PrimitiveDateTime;
use time::Time;

use crate::core::CrawlId;
use crate::core::QualitySignals;
use crate::interfaces::ArchiveEventSink;
use crate::interfaces::LogSummary;
use crate::interfaces::LogSummaryError;
use crate::interfaces::LogSummarySource;
use crate::runtime::events::ArchiveEvent;
use crate::runtime::events::EVENT_LOG_SKIPPED;
use crate::runtime::events::EventLevel;
use crate::runtime::events::NoopEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Spider arguments that mark a crawl as a subset.
const SUBSET_ARGUMENTS: &[&str] = &["from_date", "until_date", "sample"];
/// Stats key holding the crawl start.
const START_TIME_MARKER: &str = "'start_time': datetime.datetime(";
/// Stats key holding the finish reason.
const FINISH_REASON_MARKER: &str = "'finish_reason': '";
/// Stats key holding the error count.
const ERROR_COUNT_MARKER: &str = "'log_count/ERROR': ";
/// Log line prefix listing spider arguments.
const SPIDER_ARGUMENTS_MARKER: &str = "Spider arguments: {";
/// Bytes read from each end of a log.
const EXCERPT_BYTES: u64 = 64 * 1024;

// ============================================================================
// SECTION: Parsed Log
// ============================================================================

/// Facts read from one Scrapy log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrapyLog {
    /// Crawl start from the stats dump.
    pub start_time: Option<PrimitiveDateTime>,
    /// Finish reason from the stats dump.
    pub finish_reason: Option<String>,
    /// Logged error count.
    pub errors_count: u64,
    /// Spider argument names.
    pub spider_arguments: Vec<String>,
}

impl ScrapyLog {
    /// Parses log text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            start_time: last_value_after(text, START_TIME_MARKER).and_then(parse_datetime_call),
            finish_reason: last_value_after(text, FINISH_REASON_MARKER)
                .and_then(|rest| rest.split('\'').next())
                .map(str::to_string),
            errors_count: last_value_after(text, ERROR_COUNT_MARKER)
                .and_then(|rest| {
                    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                    digits.parse().ok()
                })
                .unwrap_or(0),
            spider_arguments: text
                .lines()
                .find_map(|line| line.split_once(SPIDER_ARGUMENTS_MARKER))
                .map(|(_, rest)| dict_keys(rest))
                .unwrap_or_default(),
        }
    }

    /// Returns the quality signals of the crawl.
    #[must_use]
    pub fn signals(&self) -> QualitySignals {
        QualitySignals {
            finished: self.finish_reason.as_deref() == Some("finished"),
            subset: self
                .spider_arguments
                .iter()
                .any(|name| SUBSET_ARGUMENTS.contains(&name.as_str())),
            errors_count: self.errors_count,
        }
    }
}

// ============================================================================
// SECTION: Log Directory
// ============================================================================

/// Log summary source reading `{root}/{source_id}/*.log`.
#[derive(Clone)]
pub struct ScrapyLogDirectory {
    /// Directory holding one subdirectory per source.
    root: PathBuf,
    /// Sink for skipped candidate logs.
    events: Arc<dyn ArchiveEventSink>,
}

impl ScrapyLogDirectory {
    /// Creates a source over a logs root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            events: Arc::new(NoopEventSink),
        }
    }

    /// Reports unreadable candidate logs to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn ArchiveEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Lists `*.log` entries of a source directory in name order.
    fn candidates(directory: &Path) -> Result<Vec<PathBuf>, LogSummaryError> {
        let mut logs = Vec::new();
        for entry in fs::read_dir(directory).map_err(|err| LogSummaryError::Io(err.to_string()))? {
            let path = entry.map_err(|err| LogSummaryError::Io(err.to_string()))?.path();
            if !path.is_dir() && path.extension().is_some_and(|ext| ext == "log") {
                logs.push(path);
            }
        }
        logs.sort();
        Ok(logs)
    }
}

impl LogSummarySource for ScrapyLogDirectory {
    fn resolve(&self, crawl_id: &CrawlId) -> Result<Option<LogSummary>, LogSummaryError> {
        let directory = self.root.join(crawl_id.source_id.as_str());
        if !directory.is_dir() {
            return Ok(None);
        }
        let wanted = crawl_id.period.datetime();
        for path in Self::candidates(&directory)? {
            let text = match read_excerpt(&path) {
                Ok(text) => text,
                Err(err) => {
                    self.events.record(
                        &ArchiveEvent::new(EVENT_LOG_SKIPPED, EventLevel::Warn)
                            .crawl(crawl_id)
                            .detail(format!("{}: {err}", path.display())),
                    );
                    continue;
                }
            };
            let log = ScrapyLog::parse(&text);
            if log.start_time == Some(wanted) {
                return Ok(Some(LogSummary {
                    location: path,
                    signals: log.signals(),
                }));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the head and tail of a log, tolerating invalid UTF-8.
fn read_excerpt(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut head = Vec::new();
    (&mut file).take(EXCERPT_BYTES).read_to_end(&mut head)?;
    if size <= EXCERPT_BYTES * 2 {
        file.take(EXCERPT_BYTES).read_to_end(&mut head)?;
        return Ok(String::from_utf8_lossy(&head).into_owned());
    }
    file.seek(SeekFrom::Start(size - EXCERPT_BYTES))?;
    let mut tail = Vec::new();
    file.take(EXCERPT_BYTES).read_to_end(&mut tail)?;
    let mut text = String::from_utf8_lossy(&head).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&tail));
    Ok(text)
}

/// Returns the text following the last occurrence of `marker`.
fn last_value_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.rfind(marker).map(|index| &text[index + marker.len() ..])
}

/// Parses `Y, M, D, h, m, s[, us])` into a timestamp truncated to the second.
fn parse_datetime_call(rest: &str) -> Option<PrimitiveDateTime> {
    let arguments = rest.split(')').next()?;
    let mut fields = arguments.split(',').map(|field| field.trim().parse::<i32>().ok());
    let year = fields.next()??;
    let month = Month::try_from(u8::try_from(fields.next()??).ok()?).ok()?;
    let day = u8::try_from(fields.next()??).ok()?;
    let hour = u8::try_from(fields.next()??).ok()?;
    let minute = u8::try_from(fields.next()??).ok()?;
    let second = fields.next().flatten().map_or(Some(0), |value| u8::try_from(value).ok())?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

/// Extracts quoted keys from a Python dict literal body (`'a': 1, 'b': 2}`).
fn dict_keys(body: &str) -> Vec<String> {
    let body = body.split('}').next().unwrap_or_default();
    body.split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(key, _)| key.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::fs;
    use std::io::Seek;
    use std::io::SeekFrom;
    use std::io::Write;

    use time::macros::datetime;

    use super::ScrapyLog;
    use super::dict_keys;
    use super::read_excerpt;

    const FINISHED_LOG: &str = "2020-09-02 05:24:58 [scrapy.crawler] INFO: Overridden settings: {}
2020-09-02 05:24:58 [scrapy.crawler] INFO: Spider arguments: {'crawl_time': '2020-09-02T05:24:58'}
2020-09-02 05:30:00 [scrapy.statscollectors] INFO: Dumping Scrapy stats:
{'downloader/request_count': 2,
 'finish_reason': 'finished',
 'log_count/ERROR': 1,
 'log_count/INFO': 9,
 'start_time': datetime.datetime(2020, 9, 2, 5, 24, 58, 123456)}
";

    #[test]
    fn parses_finished_log() {
        let log = ScrapyLog::parse(FINISHED_LOG);
        let signals = log.signals();
        assert!(signals.is_finished());
        assert!(!signals.is_subset());
        assert_eq!(signals.errors_count(), 1);
        assert_eq!(log.start_time, Some(datetime!(2020-09-02 05:24:58)));
    }

    #[test]
    fn in_progress_log_is_not_finished() {
        let log = ScrapyLog::parse("INFO: Spider opened\n");
        let signals = log.signals();
        assert!(!signals.is_finished());
        assert_eq!(signals.errors_count(), 0);
        assert!(log.start_time.is_none());
    }

    #[test]
    fn sample_and_date_bounds_mark_subsets() {
        let sample = ScrapyLog::parse("INFO: Spider arguments: {'sample': 'true'}\n");
        assert!(sample.signals().is_subset());
        let bounded = ScrapyLog::parse("INFO: Spider arguments: {'until_date': '2020-01-01'}\n");
        assert!(bounded.signals().is_subset());
    }

    #[test]
    fn dict_keys_reads_quoted_keys() {
        assert_eq!(dict_keys("'a': '1', \"b\": 2}"), vec!["a".to_string(), "b".to_string()]);
        assert!(dict_keys("}").is_empty());
    }

    #[test]
    fn large_log_is_read_from_both_ends() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("big.log");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(b"INFO: Spider arguments: {'sample': 'true'}\n").expect("head");
        file.seek(SeekFrom::Start(10 * 1024 * 1024)).expect("seek");
        file.write_all(FINISHED_LOG.as_bytes()).expect("tail");
        drop(file);

        let log = ScrapyLog::parse(&read_excerpt(&path).expect("excerpt"));

        assert!(log.signals().is_subset());
        assert!(log.signals().is_finished());
        assert_eq!(log.start_time, Some(datetime!(2020-09-02 05:24:58)));
    }
}
