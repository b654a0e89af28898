//! Process-wide catalog snapshot with atomic replacement.
//!
//! Readers take an `Arc` to the current snapshot and keep using it for the
//! whole ranking call. A reload builds the replacement catalog completely
//! before taking the write lock, so the lock is only held for the pointer
//! swap and no reader ever sees a half-loaded catalog.

use std::ops::Deref;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::CatalogLoadError;
use crate::loader::CatalogSource;
use crate::types::Catalog;

/// An immutable, versioned catalog.
#[derive(Debug)]
pub struct CatalogSnapshot {
    catalog: Catalog,
    version: u64,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Monotonic counter, bumped on every publish.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl Deref for CatalogSnapshot {
    type Target = Catalog;

    fn deref(&self) -> &Catalog {
        &self.catalog
    }
}

/// Holder of the "current" catalog snapshot.
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot {
                catalog,
                version: 1,
                loaded_at: Utc::now(),
            })),
        }
    }

    /// A store whose first snapshot is empty; useful before the first load.
    pub fn empty() -> Self {
        Self::new(Catalog::empty())
    }

    /// Load `source` into a new store.
    pub fn load(source: &CatalogSource) -> Result<Self, CatalogLoadError> {
        source.load().map(Self::new)
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the current snapshot with `catalog` and return the new one.
    pub fn publish(&self, catalog: Catalog) -> Arc<CatalogSnapshot> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = Arc::new(CatalogSnapshot {
            catalog,
            version: guard.version + 1,
            loaded_at: Utc::now(),
        });
        *guard = Arc::clone(&next);
        drop(guard);

        tracing::info!(
            version = next.version,
            entries = next.catalog.len(),
            "published catalog snapshot"
        );
        next
    }

    /// Load `source` and publish it. On failure the current snapshot stays.
    pub fn reload(&self, source: &CatalogSource) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        match source.load() {
            Ok(catalog) => Ok(self.publish(catalog)),
            Err(err) => {
                tracing::error!(error = %err, "catalog reload failed; keeping previous snapshot");
                Err(err)
            }
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::empty()
    }
}
