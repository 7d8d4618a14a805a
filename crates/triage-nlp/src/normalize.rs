//! Text normalization pipeline.
//!
//! Handles:
//! - Lowercasing and tokenization
//! - Punctuation and stopword removal
//! - Rule-based noun lemmatization (plural stripping)

use std::collections::HashSet;

/// Normalizer for free-text patient messages.
pub struct TextNormalizer {
    /// English stopwords dropped before matching
    stop_words: HashSet<&'static str>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a new normalizer with the default stopword list.
    pub fn new() -> Self {
        Self {
            stop_words: Self::default_stop_words(),
        }
    }

    /// Run the full pipeline: lowercase, tokenize, drop punctuation and
    /// stopwords, lemmatize each surviving token.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|token| !self.stop_words.contains(token.as_str()))
            .map(|token| lemmatize(&token))
            .collect()
    }

    /// Split lowercased text into word tokens, discarding punctuation.
    ///
    /// Splitting on non-alphanumeric boundaries cannot fail the way a
    /// resource-backed tokenizer can, but if it produces nothing for a
    /// non-empty input we still fall back to plain whitespace splitting
    /// so extraction always gets tokens to work with.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<String> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();

        if tokens.is_empty() && !lowered.trim().is_empty() {
            return lowered.split_whitespace().map(|t| t.to_string()).collect();
        }

        tokens
    }

    /// Default English stopword list.
    fn default_stop_words() -> HashSet<&'static str> {
        [
            "a", "about", "above", "after", "again", "against", "all", "am",
            "an", "and", "any", "are", "as", "at", "be", "because", "been",
            "before", "being", "below", "between", "both", "but", "by", "can",
            "could", "did", "do", "does", "doing", "down", "during", "each",
            "few", "for", "from", "further", "had", "has", "have", "having",
            "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in",
            "into", "is", "it", "its", "just", "me", "more", "most", "my",
            "no", "nor", "not", "now", "of", "off", "on", "once", "only",
            "or", "other", "our", "ours", "out", "over", "own", "same",
            "she", "should", "so", "some", "such", "than", "that", "the",
            "their", "theirs", "them", "then", "there", "these", "they",
            "this", "those", "through", "to", "too", "under", "until", "up",
            "very", "was", "we", "were", "what", "when", "where", "which",
            "while", "who", "whom", "why", "will", "with", "would", "you",
            "your", "yours",
        ]
        .into_iter()
        .collect()
    }
}

/// Reduce a token to its dictionary base form.
///
/// Noun plurals only ("rashes" -> "rash", "allergies" -> "allergy"),
/// matching how symptom vocabulary is phrased. Verb inflections are left
/// alone so both the catalog and the input pass through identical rules.
pub fn lemmatize(token: &str) -> String {
    if token.len() <= 3 {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }

    if let Some(stem) = token.strip_suffix("es") {
        if stem.ends_with('s')
            || stem.ends_with('x')
            || stem.ends_with('z')
            || stem.ends_with("ch")
            || stem.ends_with("sh")
        {
            return stem.to_string();
        }
    }

    if token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") && !token.ends_with("is") {
        return token[..token.len() - 1].to_string();
    }

    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation() {
        let normalizer = TextNormalizer::new();

        let tokens = normalizer.tokenize("I have itching, and a skin rash!");
        assert_eq!(
            tokens,
            vec!["i", "have", "itching", "and", "a", "skin", "rash"]
        );
    }

    #[test]
    fn test_tokenize_lowercases() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.tokenize("Joint PAIN"), vec!["joint", "pain"]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        let normalizer = TextNormalizer::new();

        assert!(normalizer.tokenize("").is_empty());
        assert!(normalizer.tokenize("   ").is_empty());
    }

    #[test]
    fn test_normalize_drops_stopwords() {
        let normalizer = TextNormalizer::new();

        let tokens = normalizer.normalize("I have a headache and some nausea");
        assert_eq!(tokens, vec!["headache", "nausea"]);
    }

    #[test]
    fn test_lemmatize_plurals() {
        assert_eq!(lemmatize("rashes"), "rash");
        assert_eq!(lemmatize("headaches"), "headache");
        assert_eq!(lemmatize("allergies"), "allergy");
        assert_eq!(lemmatize("cramps"), "cramp");
    }

    #[test]
    fn test_lemmatize_leaves_base_forms() {
        assert_eq!(lemmatize("itching"), "itching");
        assert_eq!(lemmatize("dizziness"), "dizziness");
        assert_eq!(lemmatize("nausea"), "nausea");
        // Short and irregular-looking endings pass through
        assert_eq!(lemmatize("gas"), "gas");
        assert_eq!(lemmatize("pus"), "pus");
        assert_eq!(lemmatize("arthritis"), "arthritis");
    }
}
