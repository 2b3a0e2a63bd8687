//! Resolution models for the prescription resolver.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::drug::DrugRecord;

/// Candidate generation pass that produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePass {
    /// Single token directly before an "Nmg" strength
    Dosage,
    /// Up to three tokens before an "Nmg" strength, shortest suffix first
    Phrase,
    /// Single token before a large bare number
    Strength,
}

impl fmt::Display for CandidatePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CandidatePass::Dosage => "dosage",
            CandidatePass::Phrase => "phrase",
            CandidatePass::Strength => "strength",
        };
        f.write_str(label)
    }
}

/// A hypothesized drug name extracted from label text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Trimmed name as it appeared in the text
    pub name: String,
    /// Pass that produced it
    pub pass: CandidatePass,
}

impl Candidate {
    /// Create a candidate, trimming surrounding whitespace.
    pub fn new(name: &str, pass: CandidatePass) -> Self {
        Self {
            name: name.trim().to_string(),
            pass,
        }
    }

    /// Case-folded name used as a cache key.
    pub fn key(&self) -> String {
        fold_name(&self.name)
    }
}

/// Case-fold a drug name for cache keying.
pub fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Identifier of a submitted image, case-folded.
///
/// Either the source the image was fetched from (usually a URL) or a SHA-256
/// digest of its bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    /// Key an image by where it came from.
    pub fn from_source(source: &str) -> Self {
        Self(source.trim().to_lowercase())
    }

    /// Key an image by its content.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a resolution was reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ResolutionSource {
    /// Image seen before; recognition and the cascade were skipped
    ImageCache,
    /// Found by the cascade
    Cascade {
        /// Pass that produced the winning candidate
        pass: CandidatePass,
        /// Candidates tried, the winner included
        attempts: usize,
    },
    /// Name supplied directly by the caller
    DirectName,
}

/// A validated prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resolution {
    /// Case-folded drug name that validated
    pub drug_name: String,
    /// Catalog data for that name
    pub record: DrugRecord,
    /// How the name was found
    pub source: ResolutionSource,
    /// Resolution timestamp
    pub resolved_at: String,
}

impl Resolution {
    pub(crate) fn new(drug_name: String, record: DrugRecord, source: ResolutionSource) -> Self {
        Self {
            drug_name,
            record,
            source,
            resolved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Check whether the image fast path produced this resolution.
    pub fn is_cache_hit(&self) -> bool {
        matches!(self.source, ResolutionSource::ImageCache)
    }
}
