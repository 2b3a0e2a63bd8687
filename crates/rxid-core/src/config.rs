//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::models::CandidatePass;

/// Smallest bare number treated as a dosage strength by the strength pass.
pub const DEFAULT_MIN_STRENGTH: u64 = 50;

/// Tunables for candidate generation and validation.
///
/// ```rust
/// # use rxid_core::ResolverConfig;
/// let config = ResolverConfig::new()
///     .min_strength(100)
///     .max_candidates(10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum number for the strength pass. Default: 50.
    pub min_strength: u64,
    /// Passes to run, in order. Default: dosage, phrase, strength.
    pub passes: Vec<CandidatePass>,
    /// Cap on catalog validations per request. Default: unlimited.
    pub max_candidates: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_strength: DEFAULT_MIN_STRENGTH,
            passes: vec![
                CandidatePass::Dosage,
                CandidatePass::Phrase,
                CandidatePass::Strength,
            ],
            max_candidates: None,
        }
    }
}

impl ResolverConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the strength pass threshold.
    pub fn min_strength(mut self, n: u64) -> Self {
        self.min_strength = n;
        self
    }

    /// Set which passes run, and in which order.
    pub fn passes(mut self, passes: Vec<CandidatePass>) -> Self {
        self.passes = passes;
        self
    }

    /// Cap the number of candidates validated per request.
    pub fn max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = Some(n);
        self
    }
}
