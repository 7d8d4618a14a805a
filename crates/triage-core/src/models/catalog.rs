//! Symptom catalog and feature index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Injective mapping from symptom display name to feature position.
///
/// Built once from the training table's column names and immutable
/// afterwards. The extractor borrows the display names read-only; only
/// the predictor owns an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomIndex {
    /// Display names in feature-column order
    names: Vec<String>,
    /// Display name -> feature position (0..N)
    positions: HashMap<String, usize>,
}

impl SymptomIndex {
    /// Build an index from raw training column names (`word_word` form).
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let names: Vec<String> = columns
            .iter()
            .map(|c| display_form(c.as_ref()))
            .collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self { names, positions }
    }

    /// Feature position for a display name, if known.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Display names in feature order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of catalog symptoms (feature vector length).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Encode a set of symptom names as a binary feature vector.
    ///
    /// Names absent from the catalog are silently dropped; duplicates
    /// set the same bit twice and are therefore harmless.
    pub fn feature_vector<S: AsRef<str>>(&self, symptoms: &[S]) -> Vec<f64> {
        let mut vector = vec![0.0; self.names.len()];
        for symptom in symptoms {
            match self.position(symptom.as_ref()) {
                Some(pos) => vector[pos] = 1.0,
                None => {
                    tracing::debug!(symptom = symptom.as_ref(), "unknown symptom dropped");
                }
            }
        }
        vector
    }
}

/// Format a raw column name into display form.
///
/// `skin_rash` -> `Skin Rash`
pub fn display_form(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_form() {
        assert_eq!(display_form("itching"), "Itching");
        assert_eq!(display_form("skin_rash"), "Skin Rash");
        assert_eq!(display_form("continuous_sneezing"), "Continuous Sneezing");
    }

    #[test]
    fn test_index_is_bijective() {
        let index = SymptomIndex::from_columns(&["itching", "skin_rash", "joint_pain"]);

        assert_eq!(index.len(), 3);
        for (i, name) in index.names().iter().enumerate() {
            assert_eq!(index.position(name), Some(i));
        }
    }

    #[test]
    fn test_feature_vector_encoding() {
        let index = SymptomIndex::from_columns(&["itching", "skin_rash", "joint_pain"]);

        let vector = index.feature_vector(&["Skin Rash", "Itching"]);
        assert_eq!(vector, vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_symptoms_silently_dropped() {
        let index = SymptomIndex::from_columns(&["itching", "skin_rash"]);

        let vector = index.feature_vector(&["Itching", "Time Travel Sickness"]);
        assert_eq!(vector, vec![1.0, 0.0]);
    }

    #[test]
    fn test_duplicates_are_harmless() {
        let index = SymptomIndex::from_columns(&["itching", "skin_rash"]);

        let vector = index.feature_vector(&["Itching", "Itching"]);
        assert_eq!(vector, vec![1.0, 0.0]);
    }
}
