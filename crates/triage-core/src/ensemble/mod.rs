//! Weighted multi-model ensemble prediction engine.
//!
//! Four probabilistic classifiers are trained on the same table and
//! combined with fixed weights: SVM 0.30, naive Bayes 0.20, random
//! forest 0.25, gradient boosting 0.25. A consensus bonus is applied
//! when every model independently backs the same class.

mod boosting;
mod forest;
mod naive_bayes;
mod svm;

pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use naive_bayes::GaussianNb;
pub use svm::SvmClassifier;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::{DataError, TrainingTable};
use crate::models::{LabelEncoder, Prediction, SymptomIndex};

/// Fixed seed for the randomized learners; makes a trained instance
/// deterministic.
const RANDOM_SEED: u64 = 42;

/// Number of ranked diseases returned.
const TOP_K: usize = 3;

/// Per-model probability every classifier must exceed for the
/// agreement boost.
const AGREEMENT_THRESHOLD: f64 = 0.3;

/// Confidence multiplier for consensus predictions.
const AGREEMENT_BOOST: f64 = 1.2;

/// Ensemble errors.
#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("ensemble weights must sum to 1.0, got {0}")]
    InvalidWeights(f64),

    #[error("predictor has not been trained")]
    NotTrained,

    #[error("training data error: {0}")]
    Data(#[from] DataError),
}

pub type EnsembleResult<T> = Result<T, EnsembleError>;

/// A probabilistic classifier over a fixed class set.
pub trait Classifier {
    /// Probability distribution over the classes for one feature vector.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;
}

/// Fixed per-model coefficients. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleWeights {
    pub svm: f64,
    pub naive_bayes: f64,
    pub forest: f64,
    pub boosting: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            svm: 0.30,
            naive_bayes: 0.20,
            forest: 0.25,
            boosting: 0.25,
        }
    }
}

impl EnsembleWeights {
    /// Check the sum-to-one invariant, returning the weights on success.
    pub fn validated(self) -> EnsembleResult<Self> {
        let sum = self.svm + self.naive_bayes + self.forest + self.boosting;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(EnsembleError::InvalidWeights(sum));
        }
        Ok(self)
    }
}

/// Everything fixed at training time; read-only afterwards, so a trained
/// predictor can be shared freely across threads.
struct TrainedState {
    index: SymptomIndex,
    encoder: LabelEncoder,
    svm: SvmClassifier,
    naive_bayes: GaussianNb,
    forest: RandomForest,
    boosting: GradientBoosting,
}

/// Ensemble disease predictor.
pub struct DiseasePredictor {
    weights: EnsembleWeights,
    state: Option<TrainedState>,
}

impl Default for DiseasePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl DiseasePredictor {
    /// Create an untrained predictor with the standard weights.
    pub fn new() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            state: None,
        }
    }

    /// Create an untrained predictor with custom weights.
    pub fn with_weights(weights: EnsembleWeights) -> EnsembleResult<Self> {
        Ok(Self {
            weights: weights.validated()?,
            state: None,
        })
    }

    /// Train all four models from a training table file.
    pub fn train<P: AsRef<Path>>(&mut self, path: P) -> EnsembleResult<()> {
        let table = TrainingTable::load(path)?;
        self.train_table(&table)
    }

    /// Train all four models from an already-parsed table.
    pub fn train_table(&mut self, table: &TrainingTable) -> EnsembleResult<()> {
        let index = SymptomIndex::from_columns(table.feature_columns());
        let (encoder, y) = LabelEncoder::fit_transform(table.labels());
        let x = table.features();
        let n_classes = encoder.len();

        info!(
            rows = table.n_rows(),
            symptoms = index.len(),
            diseases = n_classes,
            "training ensemble"
        );

        let svm = SvmClassifier::fit(x, &y, n_classes, RANDOM_SEED);
        let naive_bayes = GaussianNb::fit(x, &y, n_classes);
        let forest = RandomForest::fit(x, &y, n_classes, RANDOM_SEED);
        let boosting = GradientBoosting::fit(x, &y, n_classes);

        self.state = Some(TrainedState {
            index,
            encoder,
            svm,
            naive_bayes,
            forest,
            boosting,
        });
        Ok(())
    }

    /// True once `train` has completed successfully.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Symptom index built at training time.
    pub fn symptom_index(&self) -> EnsembleResult<&SymptomIndex> {
        self.state
            .as_ref()
            .map(|s| &s.index)
            .ok_or(EnsembleError::NotTrained)
    }

    /// Disease labels known to the trained models.
    pub fn disease_labels(&self) -> EnsembleResult<&[String]> {
        self.state
            .as_ref()
            .map(|s| s.encoder.classes())
            .ok_or(EnsembleError::NotTrained)
    }

    /// Rank the top diseases for a set of symptom display names.
    ///
    /// Unknown symptoms are dropped silently; an empty input yields an
    /// empty prediction so callers decide their own fallback policy.
    /// Ranking is decided on the weighted probabilities; the agreement
    /// boost is applied per ranked class afterwards, so the reported
    /// percentages are not necessarily non-increasing.
    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> EnsembleResult<Prediction> {
        let state = self.state.as_ref().ok_or(EnsembleError::NotTrained)?;

        if symptoms.is_empty() {
            return Ok(Prediction::empty());
        }

        let features = state.index.feature_vector(symptoms);

        let svm_proba = state.svm.predict_proba(&features);
        let nb_proba = state.naive_bayes.predict_proba(&features);
        let forest_proba = state.forest.predict_proba(&features);
        let boosting_proba = state.boosting.predict_proba(&features);

        let weighted = weighted_combination(
            self.weights,
            &svm_proba,
            &nb_proba,
            &forest_proba,
            &boosting_proba,
        );

        let mut diseases = Vec::with_capacity(TOP_K);
        let mut confidences = Vec::with_capacity(TOP_K);

        for class in top_indices(&weighted, TOP_K) {
            let per_model = [
                svm_proba[class],
                nb_proba[class],
                forest_proba[class],
                boosting_proba[class],
            ];
            let confidence = boosted_confidence(weighted[class], &per_model);

            if let Some(label) = state.encoder.decode(class) {
                debug!(disease = label, confidence, "ranked candidate");
                diseases.push(label.to_string());
                confidences.push(confidence);
            }
        }

        Ok(Prediction {
            diseases,
            confidences,
        })
    }
}

/// Weighted sum of the four per-class probability vectors.
fn weighted_combination(
    weights: EnsembleWeights,
    svm: &[f64],
    naive_bayes: &[f64],
    forest: &[f64],
    boosting: &[f64],
) -> Vec<f64> {
    svm.iter()
        .zip(naive_bayes)
        .zip(forest)
        .zip(boosting)
        .map(|(((&s, &n), &f), &b)| {
            s * weights.svm + n * weights.naive_bayes + f * weights.forest + b * weights.boosting
        })
        .collect()
}

/// Indices of the `k` largest probabilities, descending; ties go to the
/// lower index.
fn top_indices(probs: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probs.len()).collect();
    indices.sort_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    indices.truncate(k);
    indices
}

/// Confidence percentage with the agreement boost applied.
///
/// When every model gives the class more than `AGREEMENT_THRESHOLD`,
/// the percentage is multiplied by `AGREEMENT_BOOST` and clamped to 100.
fn boosted_confidence(weighted_probability: f64, per_model: &[f64; 4]) -> f64 {
    let mut confidence = weighted_probability * 100.0;
    if per_model.iter().all(|&p| p > AGREEMENT_THRESHOLD) {
        confidence *= AGREEMENT_BOOST;
    }
    confidence.min(100.0)
}

/// Numerically stable in-place softmax.
pub(crate) fn softmax_in_place(scores: &mut [f64]) {
    if scores.is_empty() {
        return;
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    for s in scores.iter_mut() {
        *s /= sum;
    }
}

/// `ln(sum(exp(values)))` without overflow.
pub(crate) fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|&v| (v - max).exp()).sum::<f64>().ln()
}
