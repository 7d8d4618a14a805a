//! Prediction result types.

use serde::{Deserialize, Serialize};

/// Ranked prediction output: parallel disease / confidence sequences,
/// at most three entries, descending by confidence percentage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    /// Disease labels, best first
    pub diseases: Vec<String>,
    /// Confidence percentages in [0, 100], parallel to `diseases`
    pub confidences: Vec<f64>,
}

impl Prediction {
    /// Empty prediction (no symptoms supplied).
    pub fn empty() -> Self {
        Self {
            diseases: Vec::new(),
            confidences: Vec::new(),
        }
    }

    /// True when no diseases were ranked.
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    /// Best-ranked disease with its confidence, if any.
    pub fn top(&self) -> Option<(&str, f64)> {
        self.diseases
            .first()
            .zip(self.confidences.first())
            .map(|(d, &c)| (d.as_str(), c))
    }

    /// Iterate (disease, confidence) pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.diseases
            .iter()
            .map(|d| d.as_str())
            .zip(self.confidences.iter().copied())
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
