// crates/crawl-archive-config/src/config.rs
// ============================================================================
// Module: Crawl Archive Configuration
// Description: Configuration loading and validation for the archiver.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: crawl-archive-store-s3, crawl-archive-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path resolves from an explicit argument, then the
//! `CRAWL_ARCHIVE_CONFIG` environment variable, then `crawl-archive.toml` in
//! the working directory. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crawl_archive_store_s3::S3ObjectStoreConfig;
use crawl_archive_store_sqlite::SqliteCacheConfig;
use crawl_archive_store_sqlite::SqliteStoreMode;
use crawl_archive_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "crawl-archive.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CRAWL_ARCHIVE_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level archiver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlArchiveConfig {
    /// Local filesystem locations.
    pub paths: PathsConfig,
    /// Remote object storage.
    pub storage: S3ObjectStoreConfig,
    /// State cache tuning.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Event sink selection.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CrawlArchiveConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.storage
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("storage: {err}")))?;
        self.cache.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the `SQLite` cache settings for the configured cache file.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteCacheConfig {
        SqliteCacheConfig {
            path: self.paths.cache_file.clone(),
            busy_timeout_ms: self.cache.busy_timeout_ms,
            journal_mode: self.cache.journal_mode,
            sync_mode: self.cache.sync_mode,
        }
    }
}

/// Local filesystem locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root of `{source_id}/{period}` crawl directories.
    pub data_directory: PathBuf,
    /// Root of `{source_id}/*.log` crawl logs.
    pub logs_directory: PathBuf,
    /// `SQLite` state cache file.
    pub cache_file: PathBuf,
    /// Directory for temporary archive artifacts (system default when unset).
    #[serde(default)]
    pub work_directory: Option<PathBuf>,
}

impl PathsConfig {
    /// Validates path lengths.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.data_directory", &self.data_directory)?;
        validate_path_string("paths.logs_directory", &self.logs_directory)?;
        validate_path_string("paths.cache_file", &self.cache_file)?;
        if let Some(work) = &self.work_directory {
            validate_path_string("paths.work_directory", work)?;
        }
        Ok(())
    }
}

/// State cache tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl CacheConfig {
    /// Validates cache tuning.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: EventSinkKind,
    /// Output file for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (EventSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.sink = \"file\" requires path".to_string()))
            }
            (EventSinkKind::File, Some(path)) => validate_path_string("logging.path", path),
            (_, Some(_)) => {
                Err(ConfigError::Invalid("logging.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

/// Event sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved config path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path against emptiness and length constraints.
fn validate_path_string(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Returns the default cache busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}
