// crates/crawl-archive-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite State Cache
// Description: Durable StateCache backed by SQLite.
// Purpose: Persist per-crawl dispositions with overwrite semantics.
// Dependencies: crawl-archive-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`StateCache`] using `SQLite`. The
//! `crawls` table holds at most one row per crawl id; `set` upserts, `get`
//! maps a missing row to [`Disposition::Unclassified`]. Rows are validated
//! on read and fail closed on unknown dispositions or negative counters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crawl_archive_core::CacheError;
use crawl_archive_core::CacheRecord;
use crawl_archive_core::CrawlId;
use crawl_archive_core::Disposition;
use crawl_archive_core::RecordMetrics;
use crawl_archive_core::StateCache;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the cache.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` state cache.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteCacheConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteCacheConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` cache errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteCacheError {
    /// Cache I/O error.
    #[error("sqlite cache io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite cache db error: {0}")]
    Db(String),
    /// Stored row failed validation.
    #[error("sqlite cache corruption: {0}")]
    Corrupt(String),
    /// Cache schema version mismatch.
    #[error("sqlite cache version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid cache data or configuration.
    #[error("sqlite cache invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteCacheError> for CacheError {
    fn from(error: SqliteCacheError) -> Self {
        match error {
            SqliteCacheError::Io(message) => Self::Io(message),
            SqliteCacheError::Db(message) => Self::Db(message),
            SqliteCacheError::Corrupt(message) => Self::Corrupt(message),
            SqliteCacheError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteCacheError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// `SQLite`-backed crawl state cache.
///
/// # Invariants
/// - The connection is opened once and shared behind a mutex.
/// - Each write runs in its own transaction.
#[derive(Clone)]
pub struct SqliteStateCache {
    /// Shared database connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStateCache {
    /// Opens an `SQLite`-backed state cache, creating the schema on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteCacheConfig) -> Result<Self, SqliteCacheError> {
        validate_cache_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Loads the stored row for a crawl.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError`] when the query fails or the row is invalid.
    pub fn load(&self, crawl_id: &CrawlId) -> Result<Option<CacheRecord>, SqliteCacheError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteCacheError::Io("sqlite cache mutex poisoned".to_string()))?;
        let row = guard
            .query_row(
                "SELECT disposition, reason, bytes, checksum, errors_count, files_count
                 FROM crawls WHERE crawl_id = ?1",
                params![crawl_id.key()],
                |row| {
                    Ok(CrawlRow {
                        disposition: row.get(0)?,
                        reason: row.get(1)?,
                        bytes: row.get(2)?,
                        checksum: row.get(3)?,
                        errors_count: row.get(4)?,
                        files_count: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        row.map(|row| row.into_record(crawl_id)).transpose()
    }

    /// Inserts or overwrites the row for a crawl.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError::Invalid`] for unclassified records and
    /// [`SqliteCacheError::Db`] when the write fails.
    pub fn store(&self, record: &CacheRecord) -> Result<(), SqliteCacheError> {
        if !record.disposition.is_classified() {
            return Err(SqliteCacheError::Invalid(format!(
                "cannot persist unclassified record for {}",
                record.crawl_id
            )));
        }
        let metrics = &record.metrics;
        let bytes = metrics.bytes.map(to_sql_integer).transpose()?;
        let errors_count = metrics.errors_count.map(to_sql_integer).transpose()?;
        let files_count = metrics.files_count.map(to_sql_integer).transpose()?;

        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteCacheError::Io("sqlite cache mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        tx.execute(
            "INSERT INTO crawls (
                crawl_id, source_id, period, disposition, reason,
                bytes, checksum, errors_count, files_count, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(crawl_id) DO UPDATE SET
                disposition = excluded.disposition,
                reason = excluded.reason,
                bytes = excluded.bytes,
                checksum = excluded.checksum,
                errors_count = excluded.errors_count,
                files_count = excluded.files_count,
                updated_at = excluded.updated_at",
            params![
                record.crawl_id.key(),
                record.crawl_id.source_id.as_str(),
                record.crawl_id.period.as_str(),
                record.disposition.as_str(),
                record.reason,
                bytes,
                metrics.checksum,
                errors_count,
                files_count,
                unix_millis(),
            ],
        )
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        Ok(())
    }

    /// Returns every stored crawl id in key order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError`] when the query fails or an id is invalid.
    pub fn crawl_ids(&self) -> Result<Vec<CrawlId>, SqliteCacheError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteCacheError::Io("sqlite cache mutex poisoned".to_string()))?;
        let mut statement = guard
            .prepare("SELECT crawl_id FROM crawls ORDER BY crawl_id")
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        let keys = statement
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        keys.iter()
            .map(|key| {
                CrawlId::parse(key).map_err(|err| SqliteCacheError::Corrupt(err.to_string()))
            })
            .collect()
    }
}

impl StateCache for SqliteStateCache {
    fn get(&self, crawl_id: &CrawlId) -> Result<CacheRecord, CacheError> {
        Ok(self.load(crawl_id)?.unwrap_or_else(|| CacheRecord::unclassified(crawl_id.clone())))
    }

    fn set(&self, record: &CacheRecord) -> Result<(), CacheError> {
        self.store(record).map_err(CacheError::from)
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw `crawls` row.
struct CrawlRow {
    /// Disposition label.
    disposition: String,
    /// Decision reason code.
    reason: Option<String>,
    /// Data size in bytes.
    bytes: Option<i64>,
    /// Data checksum.
    checksum: Option<String>,
    /// Logged error count.
    errors_count: Option<i64>,
    /// Data file count.
    files_count: Option<i64>,
}

impl CrawlRow {
    /// Validates the row and converts it into a record.
    fn into_record(self, crawl_id: &CrawlId) -> Result<CacheRecord, SqliteCacheError> {
        let disposition = Disposition::parse(&self.disposition)
            .filter(|disposition| disposition.is_classified())
            .ok_or_else(|| {
                SqliteCacheError::Corrupt(format!(
                    "unknown disposition for {crawl_id}: {}",
                    self.disposition
                ))
            })?;
        Ok(CacheRecord {
            crawl_id: crawl_id.clone(),
            disposition,
            reason: self.reason,
            metrics: RecordMetrics {
                bytes: self.bytes.map(from_sql_integer).transpose()?,
                checksum: self.checksum,
                errors_count: self.errors_count.map(from_sql_integer).transpose()?,
                files_count: self.files_count.map(from_sql_integer).transpose()?,
            },
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a counter into an `SQLite` integer.
fn to_sql_integer(value: u64) -> Result<i64, SqliteCacheError> {
    i64::try_from(value)
        .map_err(|_| SqliteCacheError::Invalid(format!("counter too large for sqlite: {value}")))
}

/// Converts an `SQLite` integer back into a counter.
fn from_sql_integer(value: i64) -> Result<u64, SqliteCacheError> {
    u64::try_from(value)
        .map_err(|_| SqliteCacheError::Corrupt(format!("negative counter in cache: {value}")))
}

/// Ensures the parent directory for the cache exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteCacheError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteCacheError::Io("cache path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteCacheError::Io(err.to_string()))
}

/// Validates cache paths for safety limits.
fn validate_cache_path(path: &Path) -> Result<(), SqliteCacheError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteCacheError::Invalid("cache path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteCacheError::Invalid("cache path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteCacheError::Invalid(
                "cache path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteCacheError::Invalid(
            "cache path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteCacheConfig) -> Result<Connection, SqliteCacheError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteCacheConfig,
) -> Result<(), SqliteCacheError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteCacheError> {
    let tx = connection.transaction().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS crawls (
                    crawl_id TEXT PRIMARY KEY NOT NULL,
                    source_id TEXT NOT NULL,
                    period TEXT NOT NULL,
                    disposition TEXT NOT NULL,
                    reason TEXT,
                    bytes INTEGER,
                    checksum TEXT,
                    errors_count INTEGER,
                    files_count INTEGER,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_crawls_source
                    ON crawls (source_id, period);",
            )
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteCacheError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
