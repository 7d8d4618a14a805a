//! Symptom extraction from free-text messages.
//!
//! Matching cascade:
//! - Tier 1: catalog name appears verbatim in the lowercased input
//! - Tier 2: every normalized symptom token is contained in the joined
//!   normalized input tokens (cumulative with tier 1)
//! - Tier 3: per-token fuzzy match, only when tiers 1-2 found nothing

use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::debug;

use crate::normalize::TextNormalizer;

/// Minimum similarity for a tier-3 fuzzy match.
const FUZZY_CUTOFF: f64 = 0.80;

/// Extractor mapping free text to catalog symptom names.
pub struct SymptomExtractor {
    normalizer: TextNormalizer,
}

impl Default for SymptomExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymptomExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
        }
    }

    /// Extract catalog symptom names mentioned in `text`.
    ///
    /// `catalog` is the display-name vocabulary of a trained predictor,
    /// borrowed read-only. Returns matches in catalog order for tiers 1-2
    /// and input-token order for tier 3; never errors, worst case is an
    /// empty list.
    pub fn extract_symptoms<S: AsRef<str>>(&self, text: &str, catalog: &[S]) -> Vec<String> {
        let tokens = self.normalizer.normalize(text);
        let text_lower = text.to_lowercase();

        let mut found: Vec<String> = Vec::new();

        // Tier 1: verbatim substring of the raw lowercased input
        for name in catalog {
            let name = name.as_ref();
            if text_lower.contains(&name.to_lowercase()) {
                push_unique(&mut found, name);
            }
        }

        // Tier 2: symptom tokens contained in the joined input tokens.
        // Containment is substring-based, not token-set equality, so short
        // symptom tokens can over-match; kept for output compatibility.
        let joined = tokens.join(" ");
        for name in catalog {
            let name = name.as_ref();
            let symptom_tokens = self.normalizer.normalize(name);
            if !symptom_tokens.is_empty()
                && symptom_tokens.iter().all(|t| joined.contains(t.as_str()))
            {
                push_unique(&mut found, name);
            }
        }

        // Tier 3: fuzzy fallback, one best match per input token
        if found.is_empty() {
            debug!(token_count = tokens.len(), "no direct matches, trying fuzzy tier");
            for token in &tokens {
                if let Some(best) = best_fuzzy_match(token, catalog) {
                    push_unique(&mut found, best);
                }
            }
        }

        found
    }
}

/// Append `name` unless already present, preserving insertion order.
fn push_unique(found: &mut Vec<String>, name: &str) {
    if !found.iter().any(|f| f == name) {
        found.push(name.to_string());
    }
}

/// Best catalog name for a single token, if any clears the cutoff.
fn best_fuzzy_match<'a, S: AsRef<str>>(token: &str, catalog: &'a [S]) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;

    for name in catalog {
        let name = name.as_ref();
        let score = fuzzy_match(token, &name.to_lowercase());
        if score >= FUZZY_CUTOFF && best.map_or(true, |(_, b)| score > b) {
            best = Some((name, score));
        }
    }

    best.map(|(name, _)| name)
}

/// Compute fuzzy string similarity using combined metrics.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Combine Jaro-Winkler (good for typos) and Levenshtein (good for overall similarity)
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);

    // Weight Jaro-Winkler more heavily as it's better for prefix matching
    jw * 0.6 + lev * 0.4
}
