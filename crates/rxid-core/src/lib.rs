//! rxid Core Library
//!
//! Identifies the drug on a photographed prescription label and returns its
//! catalog details.
//!
//! # Architecture
//!
//! ```text
//! Image bytes + key
//!        │
//!        ▼
//! ImageResolutionCache ──hit──▶ DrugDetailCache ──▶ Resolution
//!        │ miss
//!        ▼
//! TextRecognizer → normalize_text → CandidateGenerator
//!                                         │ (lazy: dosage, phrase, strength)
//!                                         ▼
//!                      for each candidate: DrugDetailCache → CatalogLookup
//!                                         │ first success
//!                                         ▼
//!                          record image → name, return Resolution
//! ```
//!
//! # Core Principle
//!
//! **First validated candidate wins.** Candidates are never scored against
//! each other, and failures are never cached.
//!
//! # Modules
//!
//! - [`models`]: Domain types (DrugRecord, Candidate, ImageKey, pricing)
//! - [`catalog`]: Catalog and pricing lookup boundary
//! - [`recognizer`]: OCR boundary
//! - [`cache`]: Drug detail and image resolution caches
//! - [`resolver`]: Candidate generation and the resolution pipeline
//! - [`config`]: Resolver configuration

pub mod cache;
pub mod catalog;
pub mod config;
pub mod models;
pub mod recognizer;
pub mod resolver;

// Re-export commonly used types
pub use cache::{CacheStats, DrugDetailCache, ImageResolutionCache};
pub use catalog::{CatalogError, CatalogLookup, MemoryCatalog, PriceLookup};
pub use config::ResolverConfig;
pub use models::{
    Candidate, CandidatePass, Coupon, DrugRecord, ImageKey, RawDrugData, Resolution,
    ResolutionSource, StorePrice, StoreQuery,
};
pub use recognizer::{RecognitionError, TextRecognizer};
pub use resolver::{CandidateGenerator, PrescriptionResolver, ResolverError, ResolverResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxIdError {
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Unresolved prescription: {0}")]
    UnresolvedPrescription(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl From<ResolverError> for RxIdError {
    fn from(e: ResolverError) -> Self {
        match e {
            ResolverError::RecognitionFailed(_) => RxIdError::RecognitionFailed(e.to_string()),
            ResolverError::CandidateInvalid { .. } => RxIdError::CatalogError(e.to_string()),
            ResolverError::UnresolvedPrescription { .. } => {
                RxIdError::UnresolvedPrescription(e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for RxIdError {
    fn from(e: serde_json::Error) -> Self {
        RxIdError::SerializationError(e.to_string())
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for RxIdError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        RxIdError::CallbackError(e.reason)
    }
}

// =========================================================================
// Foreign Collaborators
// =========================================================================

/// OCR engine implemented by the host application.
#[uniffi::export(with_foreign)]
pub trait FfiTextRecognizer: Send + Sync {
    /// Return the text on the image, or an empty string when none is found.
    fn recognize(&self, image_bytes: Vec<u8>) -> Result<String, RxIdError>;
}

/// Catalog page client implemented by the host application.
#[uniffi::export(with_foreign)]
pub trait FfiCatalogLookup: Send + Sync {
    /// Return the drug payload JSON (`{"equivalent_drugs": {...}}`) for a
    /// case-folded name. Unknown drugs should fail with `NotFound`.
    fn fetch_drug(&self, name: String) -> Result<String, RxIdError>;
}

struct ForeignRecognizer(Arc<dyn FfiTextRecognizer>);

impl TextRecognizer for ForeignRecognizer {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, RecognitionError> {
        self.0
            .recognize(image_bytes.to_vec())
            .map_err(|e| RecognitionError::Service(e.to_string()))
    }
}

struct ForeignCatalog(Arc<dyn FfiCatalogLookup>);

impl CatalogLookup for ForeignCatalog {
    fn fetch(&self, name: &str) -> catalog::CatalogResult<RawDrugData> {
        let payload = self.0.fetch_drug(name.to_string()).map_err(|e| match e {
            RxIdError::NotFound(_) => CatalogError::NotFound(name.to_string()),
            other => CatalogError::Lookup(other.to_string()),
        })?;
        RawDrugData::from_json(&payload).map_err(|e| CatalogError::Lookup(e.to_string()))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create a resolver over host-provided OCR and catalog clients.
#[uniffi::export]
pub fn open_resolver(
    recognizer: Arc<dyn FfiTextRecognizer>,
    catalog: Arc<dyn FfiCatalogLookup>,
) -> Arc<RxIdCore> {
    open_resolver_with_config_impl(recognizer, catalog, ResolverConfig::default())
}

/// Create a resolver with a JSON configuration (see [`ResolverConfig`]).
#[uniffi::export]
pub fn open_resolver_with_config(
    recognizer: Arc<dyn FfiTextRecognizer>,
    catalog: Arc<dyn FfiCatalogLookup>,
    config_json: String,
) -> Result<Arc<RxIdCore>, RxIdError> {
    let config = ResolverConfig::from_json(&config_json)
        .map_err(|e| RxIdError::InvalidInput(e.to_string()))?;
    Ok(open_resolver_with_config_impl(recognizer, catalog, config))
}

fn open_resolver_with_config_impl(
    recognizer: Arc<dyn FfiTextRecognizer>,
    catalog: Arc<dyn FfiCatalogLookup>,
    config: ResolverConfig,
) -> Arc<RxIdCore> {
    let details = Arc::new(DrugDetailCache::new(Arc::new(ForeignCatalog(catalog))));
    let images = Arc::new(ImageResolutionCache::new());
    let resolver = PrescriptionResolver::with_config(
        Arc::new(ForeignRecognizer(recognizer)),
        details,
        images,
        &config,
    );
    Arc::new(RxIdCore { resolver })
}

/// Install a fmt subscriber for `tracing` output, e.g. `"rxid_core=debug"`.
///
/// Safe to call more than once; later calls are ignored.
#[uniffi::export]
pub fn init_logging(filter: String) {
    let filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe resolver wrapper for FFI.
#[derive(uniffi::Object)]
pub struct RxIdCore {
    resolver: PrescriptionResolver,
}

#[uniffi::export]
impl RxIdCore {
    /// Identify the drug on a label image submitted from `image_source`
    /// (a URL or any stable identifier).
    pub fn resolve_from_image(
        &self,
        image_bytes: Vec<u8>,
        image_source: String,
    ) -> Result<FfiResolution, RxIdError> {
        if image_source.trim().is_empty() {
            return Err(RxIdError::InvalidInput("image_source is empty".into()));
        }
        let key = ImageKey::from_source(&image_source);
        let resolution = self.resolver.resolve_from_image(&image_bytes, &key)?;
        FfiResolution::try_from(resolution)
    }

    /// Identify the drug on a label image keyed by its content hash.
    pub fn resolve_image(&self, image_bytes: Vec<u8>) -> Result<FfiResolution, RxIdError> {
        let resolution = self.resolver.resolve_image(&image_bytes)?;
        FfiResolution::try_from(resolution)
    }

    /// Look up a drug by name.
    pub fn resolve_from_name(&self, name: String) -> Result<FfiResolution, RxIdError> {
        if name.trim().is_empty() {
            return Err(RxIdError::InvalidInput("name is empty".into()));
        }
        let resolution = self.resolver.resolve_from_name(&name)?;
        FfiResolution::try_from(resolution)
    }

    /// Current cache counters.
    pub fn cache_stats(&self) -> FfiCacheStats {
        FfiCacheStats {
            drug_details: self.resolver.details().stats().into(),
            images: self.resolver.images().stats().into(),
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe resolution.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolution {
    pub drug_name: String,
    /// Stripped drug record as JSON
    pub record_json: String,
    pub equivalent_names: Vec<String>,
    pub from_image_cache: bool,
    pub resolved_at: String,
}

impl TryFrom<Resolution> for FfiResolution {
    type Error = RxIdError;

    fn try_from(resolution: Resolution) -> Result<Self, Self::Error> {
        Ok(Self {
            record_json: resolution.record.to_json()?,
            equivalent_names: resolution.record.drug_names().map(String::from).collect(),
            from_image_cache: resolution.is_cache_hit(),
            drug_name: resolution.drug_name,
            resolved_at: resolution.resolved_at,
        })
    }
}

/// FFI-safe counters for one cache.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCacheCounters {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

impl From<CacheStats> for FfiCacheCounters {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
        }
    }
}

/// FFI-safe counters for both caches.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCacheStats {
    pub drug_details: FfiCacheCounters,
    pub images: FfiCacheCounters,
}
