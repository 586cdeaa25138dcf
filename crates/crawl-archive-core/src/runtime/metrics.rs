// crates/crawl-archive-core/src/runtime/metrics.rs
// ============================================================================
// Module: Crawl Directory Metrics
// Description: Size, file count, and content checksum of a crawl data directory.
// Purpose: Produce deterministic metrics comparable with archived metadata.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Files are visited in sorted relative-path order. The checksum is SHA-256
//! over, for each file, its `/`-separated relative path, a NUL byte, its
//! length as little-endian `u64`, and its contents, so renames and content
//! changes both alter it. Symlinks are refused.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use sha2::Digest;
use sha2::Sha256;

use crate::core::CrawlMetrics;
use crate::runtime::error::ArchiveError;

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Measures a crawl data directory.
///
/// Returns `None` when the directory does not exist or contains no files.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the directory cannot be read or contains
/// symlinks or special files.
pub fn measure_directory(directory: &Path) -> Result<Option<CrawlMetrics>, ArchiveError> {
    if !directory.is_dir() {
        return Ok(None);
    }
    let mut files = Vec::new();
    collect_files(directory, directory, &mut files)?;
    if files.is_empty() {
        return Ok(None);
    }
    files.sort();
    let mut hasher = Sha256::new();
    let mut bytes = 0u64;
    let mut buffer = [0u8; 8192];
    for (relative, path) in &files {
        let mut file = fs::File::open(path).map_err(|err| ArchiveError::Io(err.to_string()))?;
        let length = file.metadata().map_err(|err| ArchiveError::Io(err.to_string()))?.len();
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        hasher.update(length.to_le_bytes());
        loop {
            let read = file.read(&mut buffer).map_err(|err| ArchiveError::Io(err.to_string()))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[.. read]);
        }
        bytes = bytes
            .checked_add(length)
            .ok_or_else(|| ArchiveError::Invalid("data directory size overflow".to_string()))?;
    }
    let files_count = u64::try_from(files.len())
        .map_err(|_| ArchiveError::Invalid("too many data files".to_string()))?;
    Ok(Some(CrawlMetrics {
        checksum: hex_encode(&hasher.finalize()),
        bytes,
        files_count,
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Recursively collects `(relative path, absolute path)` for regular files.
fn collect_files(
    root: &Path,
    path: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(path).map_err(|err| ArchiveError::Io(err.to_string()))? {
        let entry = entry.map_err(|err| ArchiveError::Io(err.to_string()))?;
        let file_type = entry.file_type().map_err(|err| ArchiveError::Io(err.to_string()))?;
        let entry_path = entry.path();
        if file_type.is_symlink() {
            return Err(ArchiveError::Invalid(format!(
                "data directories must not contain symlinks: {}",
                entry_path.display()
            )));
        }
        if file_type.is_dir() {
            collect_files(root, &entry_path, files)?;
        } else if file_type.is_file() {
            let relative = entry_path
                .strip_prefix(root)
                .map_err(|_| ArchiveError::Invalid("data path escapes its root".to_string()))?;
            files.push((relative_label(relative), entry_path.clone()));
        } else {
            return Err(ArchiveError::Invalid(format!(
                "data directories must contain only files and directories: {}",
                entry_path.display()
            )));
        }
    }
    Ok(())
}

/// Renders a relative path with `/` separators on every platform.
fn relative_label(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::fs;

    use super::measure_directory;

    #[test]
    fn missing_or_empty_directory_has_no_metrics() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(measure_directory(&temp.path().join("missing")).expect("measure").is_none());
        fs::create_dir_all(temp.path().join("empty/nested")).expect("mkdir");
        assert!(measure_directory(&temp.path().join("empty")).expect("measure").is_none());
    }

    #[test]
    fn metrics_count_nested_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("a")).expect("mkdir");
        fs::write(temp.path().join("0.json"), b"{}").expect("write");
        fs::write(temp.path().join("a/1.json"), b"[1,2]").expect("write");
        let metrics = measure_directory(temp.path()).expect("measure").expect("metrics");
        assert_eq!(metrics.bytes, 7);
        assert_eq!(metrics.files_count, 2);
        assert_eq!(metrics.checksum.len(), 64);
    }

    #[test]
    fn checksum_tracks_names_and_contents() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        fs::write(first.path().join("0.json"), b"{}").expect("write");
        fs::write(second.path().join("0.json"), b"{}").expect("write");
        let a = measure_directory(first.path()).expect("measure").expect("metrics");
        let b = measure_directory(second.path()).expect("measure").expect("metrics");
        assert_eq!(a.checksum, b.checksum);

        fs::rename(second.path().join("0.json"), second.path().join("1.json")).expect("rename");
        let renamed = measure_directory(second.path()).expect("measure").expect("metrics");
        assert_ne!(a.checksum, renamed.checksum);

        fs::write(second.path().join("1.json"), b"[]").expect("write");
        let edited = measure_directory(second.path()).expect("measure").expect("metrics");
        assert_ne!(renamed.checksum, edited.checksum);
    }
}
