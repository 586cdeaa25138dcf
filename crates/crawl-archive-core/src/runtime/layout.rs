// crates/crawl-archive-core/src/runtime/layout.rs
// ============================================================================
// Module: Remote Archive Layout
// Description: Object key construction and parsing for archived crawls.
// Purpose: Keep the final and staging key schemes in one place.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Final objects live at `{source_id}/{year}/{month:02}/{artifact}`; staging
//! copies live under the same path prefixed with `staging/`. Keys are
//! relative to the object store's configured prefix.

use crate::core::Partition;
use crate::core::SourceId;

/// Top-level prefix for staging copies.
pub const STAGING_PREFIX: &str = "staging";

/// Artifacts written for each archived crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveArtifact {
    /// Packaged data directory.
    Data,
    /// Metadata summary.
    Metadata,
}

impl ArchiveArtifact {
    /// Returns the object basename.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Data => "data.tar.gz",
            Self::Metadata => "metadata.json",
        }
    }

    /// Returns the content type used on upload.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Data => "application/gzip",
            Self::Metadata => "application/json",
        }
    }
}

/// Returns the key prefix holding every final object of a source.
#[must_use]
pub fn source_prefix(source_id: &SourceId) -> String {
    format!("{source_id}/")
}

/// Returns the final key of an artifact.
#[must_use]
pub fn final_key(source_id: &SourceId, partition: Partition, artifact: ArchiveArtifact) -> String {
    format!("{source_id}/{}/{:02}/{}", partition.year, partition.month, artifact.file_name())
}

/// Returns the staging key of an artifact.
#[must_use]
pub fn staging_key(
    source_id: &SourceId,
    partition: Partition,
    artifact: ArchiveArtifact,
) -> String {
    format!("{STAGING_PREFIX}/{}", final_key(source_id, partition, artifact))
}

/// Extracts the partition from a final metadata key of `source_id`.
///
/// Returns `None` for keys of other sources, other artifacts, or malformed
/// partitions.
#[must_use]
pub fn metadata_partition(source_id: &SourceId, key: &str) -> Option<Partition> {
    let rest = key.strip_prefix(&source_prefix(source_id))?;
    let mut parts = rest.split('/');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month_label = parts.next()?;
    let file_name = parts.next()?;
    if parts.next().is_some()
        || file_name != ArchiveArtifact::Metadata.file_name()
        || month_label.len() != 2
    {
        return None;
    }
    let month = month_label.parse::<u8>().ok()?;
    if !(1 ..= 12).contains(&month) {
        return None;
    }
    Some(Partition {
        year,
        month,
    })
}

#[cfg(test)]
mod tests {
    use super::ArchiveArtifact;
    use super::final_key;
    use super::metadata_partition;
    use super::staging_key;
    use crate::core::Partition;
    use crate::core::SourceId;

    fn september() -> Partition {
        Partition {
            year: 2020,
            month: 9,
        }
    }

    #[test]
    fn keys_follow_partition_layout() {
        let source = SourceId::new("scotland");
        assert_eq!(
            final_key(&source, september(), ArchiveArtifact::Data),
            "scotland/2020/09/data.tar.gz"
        );
        assert_eq!(
            staging_key(&source, september(), ArchiveArtifact::Metadata),
            "staging/scotland/2020/09/metadata.json"
        );
    }

    #[test]
    fn metadata_partition_parses_only_metadata_keys() {
        let source = SourceId::new("scotland");
        assert_eq!(metadata_partition(&source, "scotland/2020/09/metadata.json"), Some(september()));
        assert_eq!(metadata_partition(&source, "scotland/2020/09/data.tar.gz"), None);
        assert_eq!(metadata_partition(&source, "scotland/2020/9/metadata.json"), None);
        assert_eq!(metadata_partition(&source, "scotland/2020/13/metadata.json"), None);
        assert_eq!(metadata_partition(&source, "scotland2/2020/09/metadata.json"), None);
        assert_eq!(metadata_partition(&source, "scotland/2020/09/x/metadata.json"), None);
    }
}
