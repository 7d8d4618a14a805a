//! Conversational triage session.
//!
//! The trained engine (predictor, extractor, recommendation tables) is
//! read-only and shareable; all per-conversation mutable state lives in
//! a [`TriageSession`] passed explicitly into each turn. One session per
//! conversation, never shared.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use triage_nlp::SymptomExtractor;

use crate::ensemble::{DiseasePredictor, EnsembleResult};
use crate::models::Prediction;
use crate::recommend::Recommendations;

/// Distinct confirmed symptoms required before predicting.
pub const MIN_SYMPTOMS_FOR_PREDICTION: usize = 3;

/// Top confidence below this percentage triggers the low-confidence note.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 50.0;

/// Immutable trained components shared by all sessions.
pub struct TriageEngine {
    predictor: DiseasePredictor,
    extractor: SymptomExtractor,
    recommendations: Recommendations,
    /// Catalog display names, cached for extraction
    catalog: Vec<String>,
}

impl TriageEngine {
    /// Train a fresh engine from a training table file.
    pub fn train<P: AsRef<Path>>(path: P) -> EnsembleResult<Self> {
        let mut predictor = DiseasePredictor::new();
        predictor.train(path)?;
        Self::from_predictor(predictor)
    }

    /// Wrap an already-trained predictor.
    pub fn from_predictor(predictor: DiseasePredictor) -> EnsembleResult<Self> {
        let catalog = predictor.symptom_index()?.names().to_vec();
        Ok(Self {
            predictor,
            extractor: SymptomExtractor::new(),
            recommendations: Recommendations::new(),
            catalog,
        })
    }

    /// Extract catalog symptoms from free text.
    pub fn extract_symptoms(&self, text: &str) -> Vec<String> {
        self.extractor.extract_symptoms(text, &self.catalog)
    }

    /// The trained predictor.
    pub fn predictor(&self) -> &DiseasePredictor {
        &self.predictor
    }

    /// The recommendation tables.
    pub fn recommendations(&self) -> &Recommendations {
        &self.recommendations
    }
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One transcript line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Mutable state of one conversation.
#[derive(Debug, Clone, Default)]
pub struct TriageSession {
    /// Distinct confirmed symptoms, in confirmation order
    confirmed: Vec<String>,
    transcript: Vec<ChatMessage>,
}

impl TriageSession {
    /// Start an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Symptoms confirmed so far.
    pub fn confirmed_symptoms(&self) -> &[String] {
        &self.confirmed
    }

    /// Full conversation transcript.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Clear all conversation state.
    pub fn reset(&mut self) {
        self.confirmed.clear();
        self.transcript.clear();
    }

    /// Process one user message and produce the assistant's reply.
    pub fn handle_message(
        &mut self,
        engine: &TriageEngine,
        text: &str,
    ) -> EnsembleResult<TurnReply> {
        self.transcript.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
        });

        let recognized = engine.extract_symptoms(text);
        debug!(?recognized, "extracted symptoms for turn");

        let reply = if recognized.is_empty() {
            TurnReply::Clarify
        } else {
            for symptom in &recognized {
                if !self.confirmed.contains(symptom) {
                    self.confirmed.push(symptom.clone());
                }
            }

            if self.confirmed.len() < MIN_SYMPTOMS_FOR_PREDICTION {
                TurnReply::NeedMore {
                    recognized,
                    remaining: MIN_SYMPTOMS_FOR_PREDICTION - self.confirmed.len(),
                }
            } else {
                let prediction = engine.predictor().predict(&self.confirmed)?;
                TurnReply::Report(DiagnosisReport::build(engine, recognized, prediction))
            }
        };

        self.transcript.push(ChatMessage {
            role: Role::Assistant,
            content: reply.to_string(),
        });
        Ok(reply)
    }
}

/// Assistant reply for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnReply {
    /// Nothing recognized; ask the user to rephrase
    Clarify,
    /// Below the prediction threshold; ask for more symptoms
    NeedMore {
        recognized: Vec<String>,
        remaining: usize,
    },
    /// Enough evidence gathered; full diagnosis report
    Report(DiagnosisReport),
}

/// Ranked diseases with their recommendations.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisReport {
    /// Symptoms recognized in this turn
    pub recognized: Vec<String>,
    /// Ranked prediction over all confirmed symptoms
    pub prediction: Prediction,
    /// Per-disease recommendations, parallel to the prediction ranking
    pub advice: Vec<DiseaseAdvice>,
    /// Medications recommended for more than one predicted disease
    pub shared_medications: Vec<String>,
    /// Tests recommended by more than one predicted disease
    pub shared_tests: Vec<String>,
    /// True when the top confidence is below the threshold
    pub low_confidence: bool,
}

/// Recommendations for one predicted disease.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseAdvice {
    pub disease: String,
    pub confidence: f64,
    pub medications: Vec<String>,
    pub tests: Vec<String>,
}

impl DiagnosisReport {
    fn build(engine: &TriageEngine, recognized: Vec<String>, prediction: Prediction) -> Self {
        let advice = prediction
            .iter()
            .map(|(disease, confidence)| DiseaseAdvice {
                disease: disease.to_string(),
                confidence,
                medications: engine.recommendations().medications(disease),
                tests: engine.recommendations().diagnostic_tests(disease),
            })
            .collect();

        let shared_medications = engine
            .recommendations()
            .shared_medications(&prediction.diseases);
        let shared_tests = engine.recommendations().shared_tests(&prediction.diseases);
        let low_confidence = prediction
            .top()
            .is_some_and(|(_, confidence)| confidence < LOW_CONFIDENCE_THRESHOLD);

        Self {
            recognized,
            prediction,
            advice,
            shared_medications,
            shared_tests,
            low_confidence,
        }
    }
}

impl fmt::Display for TurnReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnReply::Clarify => write!(
                f,
                "I couldn't identify any specific symptoms. Please try being more specific."
            ),
            TurnReply::NeedMore {
                recognized,
                remaining,
            } => {
                writeln!(f, "I identified the following symptoms:")?;
                for symptom in recognized {
                    writeln!(f, "- {symptom}")?;
                }
                let plural = if *remaining > 1 { "s" } else { "" };
                write!(
                    f,
                    "Please describe {remaining} more symptom{plural} for a prediction."
                )
            }
            TurnReply::Report(report) => report.fmt(f),
        }
    }
}

impl fmt::Display for DiagnosisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "I identified the following symptoms:")?;
        for symptom in &self.recognized {
            writeln!(f, "- {symptom}")?;
        }

        writeln!(f, "Top 3 Predictions:")?;
        for (rank, advice) in self.advice.iter().enumerate() {
            writeln!(
                f,
                "{}. {} (Confidence: {:.1}%)",
                rank + 1,
                advice.disease,
                advice.confidence
            )?;
            if !advice.medications.is_empty() {
                writeln!(f, "   Suggested medications: {}", advice.medications.join(", "))?;
            }
            if !advice.tests.is_empty() {
                writeln!(
                    f,
                    "   Recommended diagnostic tests: {}",
                    advice.tests.join(", ")
                )?;
            }
        }

        if !self.shared_medications.is_empty() {
            writeln!(f, "Common medicine recommendations:")?;
            for medication in &self.shared_medications {
                writeln!(f, "- {medication}")?;
            }
        }

        if !self.shared_tests.is_empty() {
            writeln!(f, "Common diagnostic test recommendations:")?;
            for test in &self.shared_tests {
                writeln!(f, "- {test}")?;
            }
        }

        writeln!(
            f,
            "Note: These are general recommendations. Please consult a healthcare professional for further diagnosis."
        )?;
        if self.low_confidence {
            writeln!(
                f,
                "Note: The confidence is low. Please consult a healthcare professional for accurate diagnosis."
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrainingTable;

    const TRAINING_DATA: &str = "\
itching,skin_rash,joint_pain,continuous_sneezing,chills,headache,nausea,prognosis
1,1,1,0,0,0,0,Fungal infection
1,1,0,0,0,0,0,Fungal infection
1,1,1,0,0,0,0,Fungal infection
1,1,0,0,0,0,0,Fungal infection
0,0,0,1,1,0,0,Common Cold
0,0,0,1,1,1,0,Common Cold
0,0,0,1,1,0,0,Common Cold
0,0,0,1,1,1,0,Common Cold
0,0,0,0,0,1,1,Migraine
0,0,1,0,0,1,1,Migraine
0,0,0,0,0,1,1,Migraine
0,0,1,0,0,1,1,Migraine
";

    fn engine() -> TriageEngine {
        let table = TrainingTable::from_reader(TRAINING_DATA.as_bytes()).unwrap();
        let mut predictor = DiseasePredictor::new();
        predictor.train_table(&table).unwrap();
        TriageEngine::from_predictor(predictor).unwrap()
    }

    #[test]
    fn test_clarification_on_unrecognized_text() {
        let engine = engine();
        let mut session = TriageSession::new();

        let reply = session.handle_message(&engine, "asdkjasd qweqwe").unwrap();
        assert_eq!(reply, TurnReply::Clarify);
        assert!(session.confirmed_symptoms().is_empty());
    }

    #[test]
    fn test_prompts_until_threshold() {
        let engine = engine();
        let mut session = TriageSession::new();

        let reply = session
            .handle_message(&engine, "I have itching and skin rash")
            .unwrap();
        assert_eq!(
            reply,
            TurnReply::NeedMore {
                recognized: vec!["Itching".into(), "Skin Rash".into()],
                remaining: 1,
            }
        );
    }

    #[test]
    fn test_prediction_after_threshold() {
        let engine = engine();
        let mut session = TriageSession::new();

        session
            .handle_message(&engine, "I have itching and skin rash")
            .unwrap();
        let reply = session
            .handle_message(&engine, "also some joint pain")
            .unwrap();

        let report = match reply {
            TurnReply::Report(report) => report,
            other => panic!("expected a report, got {other:?}"),
        };
        assert_eq!(report.prediction.top().map(|(d, _)| d), Some("Fungal infection"));
        assert_eq!(
            session.confirmed_symptoms(),
            ["Itching", "Skin Rash", "Joint Pain"]
        );
    }

    #[test]
    fn test_repeated_symptoms_confirmed_once() {
        let engine = engine();
        let mut session = TriageSession::new();

        session.handle_message(&engine, "itching").unwrap();
        session.handle_message(&engine, "still itching").unwrap();

        assert_eq!(session.confirmed_symptoms(), ["Itching"]);
    }

    #[test]
    fn test_reset_clears_state() {
        let engine = engine();
        let mut session = TriageSession::new();

        session.handle_message(&engine, "itching and headache").unwrap();
        assert!(!session.transcript().is_empty());

        session.reset();
        assert!(session.confirmed_symptoms().is_empty());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_low_confidence_rendering() {
        let report = DiagnosisReport {
            recognized: vec!["Headache".into()],
            prediction: Prediction {
                diseases: vec!["Migraine".into()],
                confidences: vec![32.0],
            },
            advice: vec![DiseaseAdvice {
                disease: "Migraine".into(),
                confidence: 32.0,
                medications: vec!["Paracetamol".into()],
                tests: vec![],
            }],
            shared_medications: vec![],
            shared_tests: vec![],
            low_confidence: true,
        };

        let rendered = TurnReply::Report(report).to_string();
        assert!(rendered.contains("The confidence is low"));
        assert!(rendered.contains("1. Migraine (Confidence: 32.0%)"));
        assert!(!rendered.contains("Common medicine recommendations"));
    }

    #[test]
    fn test_report_surfaces_shared_recommendations() {
        let engine = engine();
        let recommendations = engine.recommendations();

        // Both diseases recommend Paracetamol
        let prediction = Prediction {
            diseases: vec!["Pneumonia".into(), "Flu".into()],
            confidences: vec![55.0, 30.0],
        };
        let shared_medications = recommendations.shared_medications(&prediction.diseases);
        assert_eq!(shared_medications, vec!["Paracetamol"]);

        let report = DiagnosisReport::build(&engine, vec!["Headache".into()], prediction);
        assert_eq!(report.shared_medications, vec!["Paracetamol"]);

        let rendered = TurnReply::Report(report).to_string();
        assert!(rendered.contains("Common medicine recommendations:"));
        assert!(rendered.contains("- Paracetamol"));
    }
}
