// crates/crawl-archive-core/src/runtime/discovery.rs
// ============================================================================
// Module: Crawl Discovery
// Description: Lazy enumeration of `{data_root}/{source_id}/{period}` directories.
// Purpose: Feed candidate crawls to the orchestrator one source at a time.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`CrawlDiscovery::crawls`] returns a fresh iterator on every call, so a
//! pass can be restarted. Sources are listed up front; each source's periods
//! are read only when the iterator reaches it. Both levels are sorted so
//! repeated passes over an unchanged tree yield the same order. Entries that
//! are not crawls surface as `Err` items and do not stop the pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::core::CrawlId;
use crate::core::Period;
use crate::core::SourceId;
use crate::runtime::error::ArchiveError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A crawl found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crawl {
    /// Crawl identity.
    pub id: CrawlId,
    /// Local data directory.
    pub directory: PathBuf,
}

impl Crawl {
    /// Creates a crawl rooted at `data_root/source_id/period`.
    #[must_use]
    pub fn new(data_root: &Path, id: CrawlId) -> Self {
        let directory = data_root.join(id.source_id.as_str()).join(id.period.as_str());
        Self {
            id,
            directory,
        }
    }
}

/// Enumerates crawls under a data root.
#[derive(Debug, Clone)]
pub struct CrawlDiscovery {
    /// Root holding one directory per source.
    data_root: PathBuf,
}

impl CrawlDiscovery {
    /// Creates a discovery over `data_root`.
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Returns the data root.
    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Starts a new pass over the data root.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] when the data root cannot be listed.
    pub fn crawls(&self) -> Result<Crawls, ArchiveError> {
        let sources = sorted_directories(&self.data_root)?;
        Ok(Crawls {
            data_root: self.data_root.clone(),
            sources: sources.into_iter(),
            current: None,
        })
    }
}

/// Iterator over the crawls of one discovery pass.
#[derive(Debug)]
pub struct Crawls {
    /// Data root.
    data_root: PathBuf,
    /// Remaining source directory names.
    sources: std::vec::IntoIter<String>,
    /// Source being walked and its remaining period directory names.
    current: Option<(SourceId, std::vec::IntoIter<String>)>,
}

impl Iterator for Crawls {
    type Item = Result<Crawl, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((source_id, periods)) = self.current.as_mut()
                && let Some(label) = periods.next()
            {
                let item = Period::parse(&label)
                    .map(|period| {
                        Crawl::new(&self.data_root, CrawlId::new(source_id.clone(), period))
                    })
                    .map_err(|err| ArchiveError::Invalid(format!("{source_id}/{label}: {err}")));
                return Some(item);
            }
            self.current = None;
            let name = self.sources.next()?;
            let source_id = match SourceId::parse(&name) {
                Ok(source_id) => source_id,
                Err(err) => return Some(Err(ArchiveError::from(err))),
            };
            match sorted_directories(&self.data_root.join(&name)) {
                Ok(periods) => self.current = Some((source_id, periods.into_iter())),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lists the names of immediate subdirectories in lexical order.
fn sorted_directories(path: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut names = Vec::new();
    let entries = fs::read_dir(path)
        .map_err(|err| ArchiveError::Io(format!("cannot list {}: {err}", path.display())))?;
    for entry in entries {
        let entry = entry.map_err(|err| ArchiveError::Io(err.to_string()))?;
        let file_type = entry.file_type().map_err(|err| ArchiveError::Io(err.to_string()))?;
        if file_type.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
