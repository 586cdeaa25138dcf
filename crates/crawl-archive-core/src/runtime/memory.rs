// crates/crawl-archive-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Backends
// Description: Object store and state cache held in process memory.
// Purpose: Deterministic doubles for tests and local dry runs.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryObjectStore`] records every call and can be told to fail a
//! given operation on a given key, which is how upload atomicity is
//! exercised. [`InMemoryStateCache`] enforces the same write rules as the
//! durable cache. Both are cheap to clone and share state between clones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::CacheRecord;
use crate::core::CrawlId;
use crate::core::Disposition;
use crate::interfaces::CacheError;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::StateCache;

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Kind of object store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperationKind {
    /// `put`.
    Put,
    /// `get`.
    Get,
    /// `copy`.
    Copy,
    /// `delete`.
    Delete,
    /// `list`.
    List,
}

impl StoreOperationKind {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Get => "get",
            Self::Copy => "copy",
            Self::Delete => "delete",
            Self::List => "list",
        }
    }
}

/// Object store call as observed by [`InMemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// Upload of a local file.
    Put {
        /// Destination key.
        key: String,
    },
    /// Object read.
    Get {
        /// Object key.
        key: String,
    },
    /// Server-side copy.
    Copy {
        /// Source key.
        from: String,
        /// Destination key.
        to: String,
    },
    /// Object delete.
    Delete {
        /// Object key.
        key: String,
    },
    /// Key listing.
    List {
        /// Listed prefix.
        prefix: String,
    },
}

impl StoreOperation {
    /// Returns the call kind.
    #[must_use]
    pub const fn kind(&self) -> StoreOperationKind {
        match self {
            Self::Put {
                ..
            } => StoreOperationKind::Put,
            Self::Get {
                ..
            } => StoreOperationKind::Get,
            Self::Copy {
                ..
            } => StoreOperationKind::Copy,
            Self::Delete {
                ..
            } => StoreOperationKind::Delete,
            Self::List {
                ..
            } => StoreOperationKind::List,
        }
    }

    /// Returns the key an injected failure is matched against.
    ///
    /// Copies match on their destination; listings on their prefix.
    fn target(&self) -> &str {
        match self {
            Self::Put {
                key,
            }
            | Self::Get {
                key,
            }
            | Self::Delete {
                key,
            } => key,
            Self::Copy {
                to, ..
            } => to,
            Self::List {
                prefix,
            } => prefix,
        }
    }
}

/// Shared state behind [`InMemoryObjectStore`].
#[derive(Debug, Default)]
struct MemoryObjects {
    /// Object bodies by key.
    objects: BTreeMap<String, Vec<u8>>,
    /// Calls in arrival order.
    operations: Vec<StoreOperation>,
    /// Calls that must fail, with the error to return.
    failures: Vec<(StoreOperationKind, String, ObjectStoreError)>,
}

/// Object store held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    /// Shared state.
    state: Arc<Mutex<MemoryObjects>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object without recording an operation.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        if let Ok(mut state) = self.state.lock() {
            state.objects.insert(key.into(), body.into());
        }
    }

    /// Returns an object body.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().ok().and_then(|state| state.objects.get(key).cloned())
    }

    /// Returns every stored key in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().map(|state| state.objects.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns the calls made so far.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.state.lock().map(|state| state.operations.clone()).unwrap_or_default()
    }

    /// Counts the calls of one kind.
    #[must_use]
    pub fn count(&self, kind: StoreOperationKind) -> usize {
        self.operations().iter().filter(|operation| operation.kind() == kind).count()
    }

    /// Makes every `kind` call on `key` fail with a remote error.
    pub fn fail_on(&self, kind: StoreOperationKind, key: impl Into<String>) {
        let key = key.into();
        let error = ObjectStoreError::Remote(format!("injected {} failure on {key}", kind.as_str()));
        self.fail_with(kind, key, error);
    }

    /// Makes every `kind` call on `key` fail with `error`.
    pub fn fail_with(&self, kind: StoreOperationKind, key: impl Into<String>, error: ObjectStoreError) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push((kind, key.into(), error));
        }
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.clear();
        }
    }

    /// Records a call and runs it unless a failure is injected for it.
    fn run<T>(
        &self,
        operation: StoreOperation,
        body: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> Result<T, ObjectStoreError>,
    ) -> Result<T, ObjectStoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store mutex poisoned".to_string()))?;
        let injected = state
            .failures
            .iter()
            .find(|(kind, key, _)| *kind == operation.kind() && key == operation.target())
            .map(|(_, _, error)| error.clone());
        state.operations.push(operation);
        if let Some(error) = injected {
            return Err(error);
        }
        body(&mut state.objects)
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, key: &str, source: &Path, _content_type: &str) -> Result<(), ObjectStoreError> {
        let body = fs::read(source).map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        self.run(
            StoreOperation::Put {
                key: key.to_string(),
            },
            |objects| {
                objects.insert(key.to_string(), body);
                Ok(())
            },
        )
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.run(
            StoreOperation::Get {
                key: key.to_string(),
            },
            |objects| {
                objects.get(key).cloned().ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
            },
        )
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        self.run(
            StoreOperation::Copy {
                from: from.to_string(),
                to: to.to_string(),
            },
            |objects| {
                let body = objects
                    .get(from)
                    .cloned()
                    .ok_or_else(|| ObjectStoreError::NotFound(from.to_string()))?;
                objects.insert(to.to_string(), body);
                Ok(())
            },
        )
    }

    fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.run(
            StoreOperation::Delete {
                key: key.to_string(),
            },
            |objects| {
                objects.remove(key);
                Ok(())
            },
        )
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        self.run(
            StoreOperation::List {
                prefix: prefix.to_string(),
            },
            |objects| Ok(objects.keys().filter(|key| key.starts_with(prefix)).cloned().collect()),
        )
    }
}

// ============================================================================
// SECTION: State Cache
// ============================================================================

/// State cache held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateCache {
    /// Records keyed by crawl id.
    records: Arc<Mutex<BTreeMap<String, CacheRecord>>>,
}

impl InMemoryStateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored record ordered by crawl id.
    #[must_use]
    pub fn records(&self) -> Vec<CacheRecord> {
        self.records.lock().map(|records| records.values().cloned().collect()).unwrap_or_default()
    }
}

impl StateCache for InMemoryStateCache {
    fn get(&self, crawl_id: &CrawlId) -> Result<CacheRecord, CacheError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| CacheError::Io("state cache mutex poisoned".to_string()))?;
        Ok(guard
            .get(&crawl_id.key())
            .cloned()
            .unwrap_or_else(|| CacheRecord::unclassified(crawl_id.clone())))
    }

    fn set(&self, record: &CacheRecord) -> Result<(), CacheError> {
        if record.disposition == Disposition::Unclassified {
            return Err(CacheError::Invalid(format!(
                "cannot persist unclassified record for {}",
                record.crawl_id
            )));
        }
        self.records
            .lock()
            .map_err(|_| CacheError::Io("state cache mutex poisoned".to_string()))?
            .insert(record.crawl_id.key(), record.clone());
        Ok(())
    }
}
