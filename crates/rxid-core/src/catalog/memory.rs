//! In-memory catalog for tests and offline use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{fold_name, RawDrugData, RawEquivalentDrug};

use super::{CatalogError, CatalogLookup, CatalogResult};

/// Catalog backed by a fixed map of drug names.
///
/// Counts every [`CatalogLookup::fetch`] call so tests can assert how often
/// the catalog was actually hit. Names can be marked as failing to simulate
/// transport errors.
#[derive(Default)]
pub struct MemoryCatalog {
    drugs: HashMap<String, RawDrugData>,
    failing: Mutex<HashMap<String, CatalogError>>,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog that knows the given names, each with a single
    /// equivalent drug of the same name.
    pub fn with_names(names: &[&str]) -> Self {
        let mut catalog = Self::new();
        for name in names {
            catalog.insert_name(name);
        }
        catalog
    }

    /// Add a drug with explicit raw data.
    pub fn insert(&mut self, name: &str, data: RawDrugData) {
        self.drugs.insert(fold_name(name), data);
    }

    /// Add a drug whose only equivalent is itself.
    pub fn insert_name(&mut self, name: &str) {
        let mut data = RawDrugData::default();
        data.equivalent_drugs.insert(
            name.to_string(),
            RawEquivalentDrug {
                slug: Some(fold_name(name).into()),
                ..Default::default()
            },
        );
        self.insert(name, data);
    }

    /// Make lookups for `name` fail with `error` until [`Self::recover`].
    pub fn fail_with(&self, name: &str, error: CatalogError) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(fold_name(name), error);
        }
    }

    /// Clear a failure set by [`Self::fail_with`].
    pub fn recover(&self, name: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(&fold_name(name));
        }
    }

    /// Number of fetch calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl CatalogLookup for MemoryCatalog {
    fn fetch(&self, name: &str) -> CatalogResult<RawDrugData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(name.to_string());
        }

        let key = fold_name(name);
        if let Some(error) = self.failing.lock().ok().and_then(|f| f.get(&key).cloned()) {
            return Err(error);
        }

        self.drugs
            .get(&key)
            .cloned()
            .ok_or(CatalogError::NotFound(key))
    }
}
