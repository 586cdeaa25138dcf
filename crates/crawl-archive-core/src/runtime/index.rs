// crates/crawl-archive-core/src/runtime/index.rs
// ============================================================================
// Module: Remote Archive Index
// Description: Baseline lookups over an object store.
// Purpose: Find the exact-period and latest earlier-period archives of a source.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! [`RemoteArchiveIndex`] reads `metadata.json` objects. A missing object is
//! absence, never an error; every other store failure propagates so the
//! orchestrator aborts the crawl instead of deciding on partial knowledge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::ArchivedMetadata;
use crate::core::Period;
use crate::core::PriorBaseline;
use crate::core::SourceId;
use crate::interfaces::ArchiveIndex;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::runtime::layout::ArchiveArtifact;
use crate::runtime::layout::final_key;
use crate::runtime::layout::metadata_partition;
use crate::runtime::layout::source_prefix;

// ============================================================================
// SECTION: Index
// ============================================================================

/// Archive index backed by an object store.
#[derive(Clone)]
pub struct RemoteArchiveIndex {
    /// Shared object store.
    store: Arc<dyn ObjectStore>,
}

impl RemoteArchiveIndex {
    /// Creates an index over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
        }
    }

    /// Loads and parses a metadata object; `None` when it does not exist.
    fn load_metadata(&self, key: &str) -> Result<Option<ArchivedMetadata>, ObjectStoreError> {
        let bytes = match self.store.get(key) {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };
        let metadata = serde_json::from_slice(&bytes).map_err(|err| {
            ObjectStoreError::Invalid(format!("metadata at {key} is malformed: {err}"))
        })?;
        Ok(Some(metadata))
    }
}

impl ArchiveIndex for RemoteArchiveIndex {
    fn lookup_exact(
        &self,
        source_id: &SourceId,
        period: &Period,
    ) -> Result<Option<ArchivedMetadata>, ObjectStoreError> {
        let key = final_key(source_id, period.partition(), ArchiveArtifact::Metadata);
        self.load_metadata(&key)
    }

    fn lookup_latest_before(
        &self,
        source_id: &SourceId,
        period: &Period,
    ) -> Result<Option<PriorBaseline>, ObjectStoreError> {
        let current = period.partition();
        let mut partitions: Vec<_> = self
            .store
            .list(&source_prefix(source_id))?
            .iter()
            .filter_map(|key| metadata_partition(source_id, key))
            .filter(|partition| *partition < current)
            .collect();
        partitions.sort_unstable_by(|a, b| b.cmp(a));
        partitions.dedup();
        for partition in partitions {
            let key = final_key(source_id, partition, ArchiveArtifact::Metadata);
            if let Some(metadata) = self.load_metadata(&key)? {
                return Ok(Some(PriorBaseline {
                    metadata,
                    partition,
                }));
            }
        }
        Ok(None)
    }
}
