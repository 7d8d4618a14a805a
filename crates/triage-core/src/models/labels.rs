//! Disease label encoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Invertible mapping between disease label strings and dense class ids.
///
/// Classes are assigned ids in sorted label order, so the encoding is
/// stable for a given training table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelEncoder {
    /// Class id -> label string
    classes: Vec<String>,
    /// Label string -> class id
    ids: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Build an encoder from the training label column.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        let ids = classes
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();

        Self { classes, ids }
    }

    /// Build an encoder and encode the same labels in one pass.
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> (Self, Vec<usize>) {
        let encoder = Self::fit(labels);
        let encoded = labels
            .iter()
            .filter_map(|l| encoder.encode(l.as_ref()))
            .collect();
        (encoder, encoded)
    }

    /// Class id for a label.
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Label string for a class id.
    pub fn decode(&self, class: usize) -> Option<&str> {
        self.classes.get(class).map(|s| s.as_str())
    }

    /// All labels in class-id order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no classes are known.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
