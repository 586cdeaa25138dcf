// crates/crawl-archive-core/src/runtime/uploader.rs
// ============================================================================
// Module: Staged Uploader
// Description: Package, stage, promote, and clean up an accepted crawl.
// Purpose: Make a two-object remote write appear atomic to index readers.
// Dependencies: crate::{core, interfaces}, flate2, serde_json, tar, tempfile
// ============================================================================

//! ## Overview
//! [`StagedUploader::archive`] runs five steps, each a precondition of the
//! next:
//! 1. package the data directory as `data.tar.gz` and serialize
//!    `metadata.json` into local temporary files;
//! 2. upload both to their `staging/` keys;
//! 3. server-side copy data, then metadata, to their final keys;
//! 4. delete the staging copies (best-effort);
//! 5. delete the temporary files, the data directory, and the log file.
//!
//! ## Invariants
//! - Nothing is written to a final key before both staging uploads succeed.
//! - The metadata copy is the commit point; the index only reads metadata.
//!   When it fails while replacing an archive, the new data object sits next
//!   to the previous metadata until a retry overwrites both.
//! - Local files are only removed after the commit point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::Builder;
use tempfile::NamedTempFile;

use crate::core::ArchivedMetadata;
use crate::core::CrawlMetrics;
use crate::core::Partition;
use crate::core::SourceId;
use crate::interfaces::ArchiveEventSink;
use crate::interfaces::LogSummary;
use crate::interfaces::ObjectStore;
use crate::runtime::discovery::Crawl;
use crate::runtime::error::ArchiveError;
use crate::runtime::events::ArchiveEvent;
use crate::runtime::events::EVENT_PARTIAL_COMMIT;
use crate::runtime::events::EVENT_STAGING_CLEANUP_FAILED;
use crate::runtime::events::EventLevel;
use crate::runtime::layout::ArchiveArtifact;
use crate::runtime::layout::final_key;
use crate::runtime::layout::staging_key;

// ============================================================================
// SECTION: Uploader
// ============================================================================

/// Executes the accept path for a crawl.
#[derive(Clone)]
pub struct StagedUploader {
    /// Shared object store.
    store: Arc<dyn ObjectStore>,
    /// Event sink for cleanup and commit warnings.
    events: Arc<dyn ArchiveEventSink>,
    /// Directory for temporary artifacts (system default when `None`).
    work_dir: Option<PathBuf>,
}

/// Local artifacts ready for upload.
struct PackagedCrawl {
    /// Compressed data directory.
    data: NamedTempFile,
    /// Serialized metadata.
    metadata: NamedTempFile,
}

impl StagedUploader {
    /// Creates an uploader writing temporary artifacts to the system temp dir.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, events: Arc<dyn ArchiveEventSink>) -> Self {
        Self {
            store,
            events,
            work_dir: None,
        }
    }

    /// Writes temporary artifacts under `work_dir` instead of the system temp dir.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Archives an accepted crawl and removes its local files.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when packaging, staging, or promotion fails;
    /// local files are untouched in that case. Returns
    /// [`ArchiveError::PartialCommit`] when the data artifact was promoted but
    /// the metadata artifact was not.
    pub fn archive(
        &self,
        crawl: &Crawl,
        metrics: &CrawlMetrics,
        log: &LogSummary,
    ) -> Result<(), ArchiveError> {
        let source_id = &crawl.id.source_id;
        let partition = crawl.id.period.partition();
        let metadata = ArchivedMetadata::from_crawl(metrics, &log.signals);

        let packaged = self.package(&crawl.directory, &metadata)?;
        self.stage(source_id, partition, &packaged)?;
        self.promote(crawl, partition)?;
        self.remove_staging(crawl, partition);

        packaged.data.close().map_err(|err| ArchiveError::Io(err.to_string()))?;
        packaged.metadata.close().map_err(|err| ArchiveError::Io(err.to_string()))?;
        fs::remove_dir_all(&crawl.directory).map_err(|err| {
            ArchiveError::Io(format!("cannot remove {}: {err}", crawl.directory.display()))
        })?;
        match fs::remove_file(&log.location) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ArchiveError::Io(format!(
                "cannot remove {}: {err}",
                log.location.display()
            ))),
        }
    }

    /// Step 1: writes the data and metadata artifacts to temporary files.
    fn package(
        &self,
        directory: &Path,
        metadata: &ArchivedMetadata,
    ) -> Result<PackagedCrawl, ArchiveError> {
        if !directory.is_dir() {
            return Err(ArchiveError::Invalid(format!(
                "data directory missing: {}",
                directory.display()
            )));
        }
        let data = self.temp_file(".tar.gz")?;
        let file = data.reopen().map_err(|err| ArchiveError::Io(err.to_string()))?;
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        append_dir_recursive(&mut builder, directory, directory)?;
        let encoder = builder.into_inner().map_err(|err| ArchiveError::Io(err.to_string()))?;
        let file = encoder.finish().map_err(|err| ArchiveError::Io(err.to_string()))?;
        file.sync_all().map_err(|err| ArchiveError::Io(err.to_string()))?;

        let mut metadata_file = self.temp_file(".json")?;
        let payload = serde_json::to_vec_pretty(metadata)
            .map_err(|err| ArchiveError::Invalid(err.to_string()))?;
        metadata_file.write_all(&payload).map_err(|err| ArchiveError::Io(err.to_string()))?;
        metadata_file.as_file().sync_all().map_err(|err| ArchiveError::Io(err.to_string()))?;
        Ok(PackagedCrawl {
            data,
            metadata: metadata_file,
        })
    }

    /// Step 2: uploads both artifacts to their staging keys.
    fn stage(
        &self,
        source_id: &SourceId,
        partition: Partition,
        packaged: &PackagedCrawl,
    ) -> Result<(), ArchiveError> {
        for (artifact, file) in [
            (ArchiveArtifact::Data, &packaged.data),
            (ArchiveArtifact::Metadata, &packaged.metadata),
        ] {
            self.store.put(
                &staging_key(source_id, partition, artifact),
                file.path(),
                artifact.content_type(),
            )?;
        }
        Ok(())
    }

    /// Step 3: copies data then metadata from staging to their final keys.
    fn promote(&self, crawl: &Crawl, partition: Partition) -> Result<(), ArchiveError> {
        let source_id = &crawl.id.source_id;
        let copy = |artifact| {
            self.store.copy(
                &staging_key(source_id, partition, artifact),
                &final_key(source_id, partition, artifact),
            )
        };
        copy(ArchiveArtifact::Data)?;
        if let Err(err) = copy(ArchiveArtifact::Metadata) {
            let detail = format!(
                "{} promoted without {}: {err}",
                final_key(source_id, partition, ArchiveArtifact::Data),
                ArchiveArtifact::Metadata.file_name()
            );
            self.events.record(
                &ArchiveEvent::new(EVENT_PARTIAL_COMMIT, EventLevel::Error)
                    .crawl(&crawl.id)
                    .detail(detail.clone()),
            );
            return Err(ArchiveError::PartialCommit(detail));
        }
        Ok(())
    }

    /// Step 4: deletes staging copies, reporting failures without failing.
    fn remove_staging(&self, crawl: &Crawl, partition: Partition) {
        for artifact in [ArchiveArtifact::Data, ArchiveArtifact::Metadata] {
            let key = staging_key(&crawl.id.source_id, partition, artifact);
            if let Err(err) = self.store.delete(&key) {
                self.events.record(
                    &ArchiveEvent::new(EVENT_STAGING_CLEANUP_FAILED, EventLevel::Warn)
                        .crawl(&crawl.id)
                        .detail(format!("{key}: {err}")),
                );
            }
        }
    }

    /// Creates a named temporary file in the work directory.
    fn temp_file(&self, suffix: &str) -> Result<NamedTempFile, ArchiveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("crawl-archive-").suffix(suffix);
        let file = match &self.work_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        file.map_err(|err| ArchiveError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Recursively appends directory contents to a tar builder.
fn append_dir_recursive<W: Write>(
    builder: &mut Builder<W>,
    root: &Path,
    path: &Path,
) -> Result<(), ArchiveError> {
    let mut entries = fs::read_dir(path)
        .map_err(|err| ArchiveError::Io(err.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ArchiveError::Io(err.to_string()))?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let file_type = entry.file_type().map_err(|err| ArchiveError::Io(err.to_string()))?;
        let entry_path = entry.path();
        if file_type.is_symlink() {
            return Err(ArchiveError::Invalid(
                "data directories must not contain symlinks".to_string(),
            ));
        }
        let relative = entry_path
            .strip_prefix(root)
            .map_err(|_| ArchiveError::Invalid("data path escapes its root".to_string()))?;
        if file_type.is_dir() {
            builder
                .append_dir(relative, &entry_path)
                .map_err(|err| ArchiveError::Io(err.to_string()))?;
            append_dir_recursive(builder, root, &entry_path)?;
        } else if file_type.is_file() {
            builder
                .append_path_with_name(&entry_path, relative)
                .map_err(|err| ArchiveError::Io(err.to_string()))?;
        } else {
            return Err(ArchiveError::Invalid(
                "data directories must contain only files and directories".to_string(),
            ));
        }
    }
    Ok(())
}
