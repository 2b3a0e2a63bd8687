//! Drug detail cache in front of the catalog.

use std::sync::Arc;

use dashmap::DashMap;

use crate::catalog::CatalogLookup;
use crate::models::{fold_name, DrugRecord};
use crate::resolver::{ResolverError, ResolverResult};

use super::{CacheStats, Counters};

/// Catalog adapter that memoizes successful lookups by case-folded name.
pub struct DrugDetailCache {
    lookup: Arc<dyn CatalogLookup>,
    entries: DashMap<String, DrugRecord>,
    counters: Counters,
}

impl DrugDetailCache {
    /// Create an empty cache over a catalog.
    pub fn new(lookup: Arc<dyn CatalogLookup>) -> Self {
        Self {
            lookup,
            entries: DashMap::new(),
            counters: Counters::default(),
        }
    }

    /// Resolve catalog details for a drug name.
    ///
    /// Cached names are answered without I/O. On a miss the catalog is
    /// queried; only successes are stored. Any catalog failure comes back as
    /// [`ResolverError::CandidateInvalid`], meaning "try the next candidate".
    pub fn resolve_details(&self, name: &str) -> ResolverResult<DrugRecord> {
        let key = fold_name(name);

        if let Some(record) = self.entries.get(&key) {
            self.counters.hit();
            tracing::debug!(name = %key, "drug detail cache hit");
            return Ok(record.value().clone());
        }
        self.counters.miss();

        match self.lookup.fetch(&key) {
            Ok(raw) => {
                let record = DrugRecord::from(raw);
                self.entries.insert(key.clone(), record.clone());
                tracing::debug!(name = %key, equivalents = record.equivalent_drugs.len(), "drug details cached");
                Ok(record)
            }
            Err(source) => {
                tracing::debug!(name = %key, error = %source, "catalog rejected name");
                Err(ResolverError::CandidateInvalid {
                    candidate: key,
                    source,
                })
            }
        }
    }

    /// Peek at a cached record without touching the catalog or counters.
    pub fn cached(&self, name: &str) -> Option<DrugRecord> {
        self.entries.get(&fold_name(name)).map(|r| r.value().clone())
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }
}
