//! Triage Core Library
//!
//! Symptom-based disease prediction with a weighted four-model ensemble.
//!
//! # Architecture
//!
//! ```text
//! Training.csv ──► dataset ──► ensemble (SVM / NB / RF / GB)
//!                                   │
//!            user text ──► triage-nlp extractor
//!                                   │
//!                        ┌──────────▼──────────┐
//!                        │    TriageSession    │
//!                        │  confirm symptoms   │
//!                        │  predict at ≥ 3     │
//!                        └──────────┬──────────┘
//!                                   │
//!                     recommendations (meds, tests)
//! ```
//!
//! Trained state (symptom index, label encoder, fitted models) is
//! immutable after training and safe to share across threads; only a
//! [`TriageSession`] is mutable, and each conversation owns its own.
//!
//! # Modules
//!
//! - [`dataset`]: training table parsing with the column-drop policy
//! - [`models`]: domain types (SymptomIndex, LabelEncoder, Prediction)
//! - [`ensemble`]: the four classifiers and the weighted predictor
//! - [`recommend`]: medication and diagnostic-test tables
//! - [`session`]: conversational turn handling

pub mod dataset;
pub mod ensemble;
pub mod models;
pub mod recommend;
pub mod session;

// Re-export commonly used types
pub use dataset::{DataError, TrainingTable};
pub use ensemble::{Classifier, DiseasePredictor, EnsembleError, EnsembleWeights};
pub use models::{LabelEncoder, Prediction, SymptomIndex};
pub use recommend::Recommendations;
pub use session::{TriageEngine, TriageSession, TurnReply};
