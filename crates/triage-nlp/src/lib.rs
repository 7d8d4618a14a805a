//! Triage NLP
//!
//! Free-text symptom extraction for the symptom triage assistant.
//!
//! Pipeline: Normalization (lowercase → tokenize → stopwords → lemmatize)
//! → matching cascade (substring → token subset → fuzzy fallback).
//!
//! This crate is standalone: it matches against a borrowed slice of
//! catalog display names and knows nothing about the prediction engine.

pub mod extraction;
pub mod normalize;

pub use extraction::SymptomExtractor;
pub use normalize::TextNormalizer;
