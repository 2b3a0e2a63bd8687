//! Candidate generation from recognized label text.
//!
//! Three independent passes, run in configured order (default below):
//! - Dosage: `DRUGNAME 50mg` → `DRUGNAME`
//! - Phrase: `Metformin Hcl 500mg` → `Hcl`, `Metformin Hcl`, ... (up to three tokens)
//! - Strength: `Ibuprofen 75` → `Ibuprofen`, only when the number clears the minimum strength
//!
//! Candidates are produced lazily so the resolver stops scanning as soon as
//! one validates. Nothing here touches the catalog.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::ResolverConfig;
use crate::models::{Candidate, CandidatePass};

static DOSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{L}+)\s*(\d+)\s*(?i:mg)").expect("valid regex"));
static PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:\p{L}+\s+){0,2}\p{L}+)\s*(\d+)\s*(?i:mg)").expect("valid regex")
});
static STRENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{L}+)\s*(\d+)").expect("valid regex"));

/// Generator of drug-name candidates.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    passes: Vec<CandidatePass>,
    min_strength: u64,
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl CandidateGenerator {
    /// Create a generator from resolver configuration.
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            passes: config.passes.clone(),
            min_strength: config.min_strength,
        }
    }

    /// Lazily generate candidates for punctuation-free text.
    ///
    /// Calling this again restarts from the first pass.
    pub fn candidates<'a>(&'a self, text: &'a str) -> Candidates<'a> {
        Candidates {
            generator: self,
            text,
            pass_index: 0,
            offset: 0,
            pending: VecDeque::new(),
        }
    }

    /// Run a single pass eagerly (mostly useful for inspection and tests).
    pub fn run_pass(&self, pass: CandidatePass, text: &str) -> Vec<Candidate> {
        let single = Self {
            passes: vec![pass],
            min_strength: self.min_strength,
        };
        single.candidates(text).collect()
    }

    fn pattern(pass: CandidatePass) -> &'static Regex {
        match pass {
            CandidatePass::Dosage => &*DOSAGE_RE,
            CandidatePass::Phrase => &*PHRASE_RE,
            CandidatePass::Strength => &*STRENGTH_RE,
        }
    }

    /// Turn one match into zero or more candidates.
    fn expand(&self, pass: CandidatePass, caps: &Captures<'_>, out: &mut VecDeque<Candidate>) {
        match pass {
            CandidatePass::Dosage => out.push_back(Candidate::new(&caps[1], pass)),
            CandidatePass::Phrase => {
                // Shortest suffix first: the token nearest the strength is
                // most often the drug name.
                let tokens: Vec<&str> = caps[1].split_whitespace().collect();
                for len in 1..=tokens.len() {
                    let phrase = tokens[tokens.len() - len..].join(" ");
                    out.push_back(Candidate::new(&phrase, pass));
                }
            }
            CandidatePass::Strength => {
                // Digit runs too long for u64 are certainly large
                let large = caps[2]
                    .parse::<u64>()
                    .map_or(true, |n| n >= self.min_strength);
                if large {
                    out.push_back(Candidate::new(&caps[1], pass));
                }
            }
        }
    }
}

/// Lazy candidate sequence over one text.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    generator: &'a CandidateGenerator,
    text: &'a str,
    pass_index: usize,
    offset: usize,
    pending: VecDeque<Candidate>,
}

impl Candidates<'_> {
    /// Pass currently being scanned, or `None` once exhausted.
    pub fn current_pass(&self) -> Option<CandidatePass> {
        self.generator.passes.get(self.pass_index).copied()
    }

    /// Scan the next match of the current pass. Returns false when the pass
    /// has no more matches.
    fn scan(&mut self, pass: CandidatePass) -> bool {
        let Some(caps) = CandidateGenerator::pattern(pass).captures_at(self.text, self.offset)
        else {
            return false;
        };
        // Every pattern consumes at least one letter, so matches are never
        // empty and the end always lies on a char boundary past the offset.
        self.offset = caps.get(0).map_or(self.text.len(), |m| m.end());
        self.generator.expand(pass, &caps, &mut self.pending);
        true
    }
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if let Some(candidate) = self.pending.pop_front() {
                return Some(candidate);
            }
            let pass = self.current_pass()?;
            if !self.scan(pass) {
                self.pass_index += 1;
                self.offset = 0;
            }
        }
    }
}
