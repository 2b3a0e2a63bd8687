//! Prescription resolver.
//!
//! Pipeline: Image Cache → Recognition → Normalization → Candidate Cascade → Catalog Validation
//!
//! Candidates are validated one at a time in generation order and the first
//! one the catalog accepts wins. Failures are never cached, so an image that
//! could not be identified pays the full recognition and cascade cost again
//! on the next submission.

mod candidates;
mod text;

pub use candidates::*;
pub use text::*;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{DrugDetailCache, ImageResolutionCache};
use crate::catalog::CatalogError;
use crate::config::ResolverConfig;
use crate::models::{fold_name, ImageKey, Resolution, ResolutionSource};
use crate::recognizer::{RecognitionError, TextRecognizer};

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Recognition failed: {0}")]
    RecognitionFailed(#[from] RecognitionError),

    #[error("Candidate '{candidate}' did not validate: {source}")]
    CandidateInvalid {
        candidate: String,
        source: CatalogError,
    },

    #[error("Could not identify prescription ({attempted} candidates tried)")]
    UnresolvedPrescription { attempted: usize },
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Orchestrates recognition, candidate generation and validation.
pub struct PrescriptionResolver {
    recognizer: Arc<dyn TextRecognizer>,
    details: Arc<DrugDetailCache>,
    images: Arc<ImageResolutionCache>,
    generator: CandidateGenerator,
    max_candidates: Option<usize>,
}

impl PrescriptionResolver {
    /// Create a resolver with default configuration.
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        details: Arc<DrugDetailCache>,
        images: Arc<ImageResolutionCache>,
    ) -> Self {
        Self::with_config(recognizer, details, images, &ResolverConfig::default())
    }

    /// Create a resolver with explicit configuration.
    pub fn with_config(
        recognizer: Arc<dyn TextRecognizer>,
        details: Arc<DrugDetailCache>,
        images: Arc<ImageResolutionCache>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            recognizer,
            details,
            images,
            generator: CandidateGenerator::new(config),
            max_candidates: config.max_candidates,
        }
    }

    /// Identify the drug on a prescription label image.
    pub fn resolve_from_image(
        &self,
        image_bytes: &[u8],
        image_key: &ImageKey,
    ) -> ResolverResult<Resolution> {
        let _span = tracing::info_span!("resolve_from_image", image_key = %image_key).entered();

        // Step 1: Fast path for images resolved before
        if let Some(name) = self.images.lookup_resolved_name(image_key) {
            match self.details.resolve_details(&name) {
                Ok(record) => {
                    info!(drug = %name, "image cache hit");
                    return Ok(Resolution::new(name, record, ResolutionSource::ImageCache));
                }
                Err(e) => {
                    warn!(drug = %name, error = %e, "cached image name no longer validates, rerunning cascade");
                }
            }
        }

        // Step 2: Recognize
        let raw = match self.recognizer.recognize(image_bytes) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return Err(self.recognition_failed(RecognitionError::NoText)),
            Err(e) => return Err(self.recognition_failed(e)),
        };

        // Step 3: Normalize
        let text = normalize_text(&raw);
        debug!(chars = text.len(), "recognized label text");

        // Step 4-5: Cascade, first success wins
        let mut attempted = 0;
        let limit = self.max_candidates.unwrap_or(usize::MAX);
        for candidate in self.generator.candidates(&text).take(limit) {
            attempted += 1;
            debug!(candidate = %candidate.name, pass = %candidate.pass, attempt = attempted, "validating candidate");

            match self.details.resolve_details(&candidate.name) {
                Ok(record) => {
                    let name = candidate.key();
                    self.images.record_resolved_name(image_key, &name);
                    info!(drug = %name, pass = %candidate.pass, attempts = attempted, "prescription identified");
                    return Ok(Resolution::new(
                        name,
                        record,
                        ResolutionSource::Cascade {
                            pass: candidate.pass,
                            attempts: attempted,
                        },
                    ));
                }
                Err(ResolverError::CandidateInvalid { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        // Step 6: Exhausted
        warn!(attempted, "no candidate validated");
        Err(ResolverError::UnresolvedPrescription { attempted })
    }

    /// Identify a label image keyed by a hash of its content.
    pub fn resolve_image(&self, image_bytes: &[u8]) -> ResolverResult<Resolution> {
        self.resolve_from_image(image_bytes, &ImageKey::from_bytes(image_bytes))
    }

    /// Look up a drug by a name the caller already knows.
    pub fn resolve_from_name(&self, name: &str) -> ResolverResult<Resolution> {
        match self.details.resolve_details(name) {
            Ok(record) => Ok(Resolution::new(
                fold_name(name),
                record,
                ResolutionSource::DirectName,
            )),
            Err(ResolverError::CandidateInvalid { candidate, source }) => {
                warn!(drug = %candidate, error = %source, "name did not validate");
                Err(ResolverError::UnresolvedPrescription { attempted: 1 })
            }
            Err(e) => Err(e),
        }
    }

    /// The drug detail cache backing this resolver.
    pub fn details(&self) -> &DrugDetailCache {
        &self.details
    }

    /// The image resolution cache backing this resolver.
    pub fn images(&self) -> &ImageResolutionCache {
        &self.images
    }

    fn recognition_failed(&self, error: RecognitionError) -> ResolverError {
        warn!(error = %error, "recognition failed");
        ResolverError::RecognitionFailed(error)
    }
}
