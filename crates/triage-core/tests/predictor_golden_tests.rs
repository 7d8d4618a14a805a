//! Golden tests for the ensemble predictor.
//!
//! These tests train on a small fixed table and verify ranking,
//! confidence bounds and error semantics against known cases.

use std::io::Write;

use proptest::prelude::*;
use triage_core::dataset::TrainingTable;
use triage_core::ensemble::{DiseasePredictor, EnsembleError};

const TRAINING_DATA: &str = "\
itching,skin_rash,joint_pain,nodal_skin_eruptions,continuous_sneezing,chills,headache,nausea,vomiting,prognosis
1,1,0,1,0,0,0,0,0,Fungal infection
1,1,1,1,0,0,0,0,0,Fungal infection
1,1,0,0,0,0,0,0,0,Fungal infection
1,1,1,1,0,0,0,0,0,Fungal infection
1,1,0,1,0,0,0,0,0,Fungal infection
1,1,1,0,0,0,0,0,0,Fungal infection
0,0,0,0,1,1,0,0,0,Common Cold
0,0,0,0,1,1,1,0,0,Common Cold
0,0,0,0,1,1,0,0,0,Common Cold
0,0,0,0,1,1,1,0,0,Common Cold
0,0,0,0,1,1,0,0,0,Common Cold
0,0,0,0,1,1,1,0,0,Common Cold
0,0,0,0,0,0,1,1,1,Migraine
0,0,0,0,0,0,1,1,0,Migraine
0,0,0,0,0,0,1,1,1,Migraine
0,0,0,0,0,0,1,1,0,Migraine
0,0,0,0,0,0,1,1,1,Migraine
0,0,0,0,0,0,1,1,0,Migraine
";

/// Expected top ranking for a symptom set.
struct GoldenCase {
    id: &'static str,
    symptoms: &'static [&'static str],
    expected_top: &'static str,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "fungal-classic",
            symptoms: &["Itching", "Skin Rash", "Joint Pain"],
            expected_top: "Fungal infection",
        },
        GoldenCase {
            id: "cold-classic",
            symptoms: &["Continuous Sneezing", "Chills", "Headache"],
            expected_top: "Common Cold",
        },
        GoldenCase {
            id: "migraine-classic",
            symptoms: &["Headache", "Nausea", "Vomiting"],
            expected_top: "Migraine",
        },
        GoldenCase {
            id: "unknown-symptoms-ignored",
            symptoms: &["Itching", "Skin Rash", "Joint Pain", "Telepathy Loss"],
            expected_top: "Fungal infection",
        },
    ]
}

fn trained_predictor() -> DiseasePredictor {
    let table = TrainingTable::from_reader(TRAINING_DATA.as_bytes()).unwrap();
    let mut predictor = DiseasePredictor::new();
    predictor.train_table(&table).unwrap();
    predictor
}

#[test]
fn test_golden_rankings() {
    let predictor = trained_predictor();

    for case in golden_cases() {
        let prediction = predictor.predict(case.symptoms).unwrap();
        assert_eq!(
            prediction.top().map(|(d, _)| d),
            Some(case.expected_top),
            "case {} ranked {:?}",
            case.id,
            prediction
        );
    }
}

#[test]
fn test_prediction_shape_and_bounds() {
    let predictor = trained_predictor();
    let prediction = predictor
        .predict(&["Itching", "Skin Rash", "Joint Pain"])
        .unwrap();

    assert!(prediction.diseases.len() <= 3);
    assert_eq!(prediction.diseases.len(), prediction.confidences.len());
    for &confidence in &prediction.confidences {
        assert!((0.0..=100.0).contains(&confidence));
    }
    for pair in prediction.confidences.windows(2) {
        assert!(pair[0] >= pair[1], "confidences not descending: {prediction:?}");
    }
}

#[test]
fn test_empty_symptom_input() {
    let predictor = trained_predictor();
    let prediction = predictor.predict::<&str>(&[]).unwrap();

    assert!(prediction.diseases.is_empty());
    assert!(prediction.confidences.is_empty());
}

#[test]
fn test_symptom_index_is_bijective() {
    let predictor = trained_predictor();
    let index = predictor.symptom_index().unwrap();

    assert_eq!(index.len(), 9);
    for (position, name) in index.names().iter().enumerate() {
        assert_eq!(index.position(name), Some(position));
    }
}

#[test]
fn test_display_names_from_columns() {
    let predictor = trained_predictor();
    let names = predictor.symptom_index().unwrap().names().to_vec();

    assert!(names.contains(&"Nodal Skin Eruptions".to_string()));
    assert!(names.contains(&"Continuous Sneezing".to_string()));
}

#[test]
fn test_predict_before_train() {
    let predictor = DiseasePredictor::new();
    assert!(matches!(
        predictor.predict(&["Itching"]),
        Err(EnsembleError::NotTrained)
    ));
}

#[test]
fn test_train_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TRAINING_DATA.as_bytes()).unwrap();
    file.flush().unwrap();

    let mut predictor = DiseasePredictor::new();
    predictor.train(file.path()).unwrap();

    let prediction = predictor
        .predict(&["Headache", "Nausea", "Vomiting"])
        .unwrap();
    assert_eq!(prediction.top().map(|(d, _)| d), Some("Migraine"));
}

#[test]
fn test_train_surfaces_data_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"itching,prognosis\n1,Fungal infection\n0,\n")
        .unwrap();
    file.flush().unwrap();

    let mut predictor = DiseasePredictor::new();
    let err = predictor.train(file.path()).unwrap_err();
    assert!(matches!(err, EnsembleError::Data(_)));
    assert!(!predictor.is_trained());
}

#[test]
fn test_trained_instance_is_deterministic() {
    let predictor = trained_predictor();
    let symptoms = ["Itching", "Skin Rash", "Joint Pain"];

    let first = predictor.predict(&symptoms).unwrap();
    let second = predictor.predict(&symptoms).unwrap();
    assert_eq!(first, second);

    // A second training run with the same fixed seed agrees too
    let other = trained_predictor();
    assert_eq!(other.predict(&symptoms).unwrap(), first);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prediction_invariants_hold_for_any_symptom_subset(
        subset in prop::collection::vec(0usize..9, 0..6),
    ) {
        let predictor = trained_predictor();
        let names = predictor.symptom_index().unwrap().names().to_vec();
        let symptoms: Vec<String> = subset.iter().map(|&i| names[i].clone()).collect();

        let prediction = predictor.predict(&symptoms).unwrap();

        prop_assert!(prediction.diseases.len() <= 3);
        prop_assert_eq!(prediction.diseases.len(), prediction.confidences.len());
        for &confidence in &prediction.confidences {
            prop_assert!((0.0..=100.0).contains(&confidence));
        }
        // Ranking follows the weighted probabilities; the consensus boost
        // is applied per class afterwards, so reported percentages are not
        // guaranteed to be non-increasing
        if symptoms.is_empty() {
            prop_assert!(prediction.diseases.is_empty());
        }
    }
}
