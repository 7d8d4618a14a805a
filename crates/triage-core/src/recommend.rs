//! Medication and diagnostic-test recommendation tables.
//!
//! Static lookups keyed by disease label. Unknown diseases yield an
//! empty list, never an error.

use std::collections::HashMap;

/// Recommendation tables for predicted diseases.
pub struct Recommendations {
    /// Disease -> medications
    prescriptions: HashMap<String, Vec<String>>,
    /// Disease -> diagnostic tests
    tests: HashMap<String, Vec<String>>,
}

impl Default for Recommendations {
    fn default() -> Self {
        Self::new()
    }
}

impl Recommendations {
    /// Create the tables with the default disease coverage.
    pub fn new() -> Self {
        Self {
            prescriptions: Self::default_prescriptions(),
            tests: Self::default_tests(),
        }
    }

    /// Medications suggested for a disease; empty when unknown.
    pub fn medications(&self, disease: &str) -> Vec<String> {
        self.prescriptions.get(disease).cloned().unwrap_or_default()
    }

    /// Diagnostic tests suggested for a disease; empty when unknown.
    pub fn diagnostic_tests(&self, disease: &str) -> Vec<String> {
        self.tests.get(disease).cloned().unwrap_or_default()
    }

    /// Medications recommended for more than one of the given diseases,
    /// in order of first appearance.
    pub fn shared_medications<S: AsRef<str>>(&self, diseases: &[S]) -> Vec<String> {
        shared_entries(diseases.iter().map(|d| self.medications(d.as_ref())))
    }

    /// Tests recommended by more than one of the given diseases, in
    /// order of first appearance.
    pub fn shared_tests<S: AsRef<str>>(&self, diseases: &[S]) -> Vec<String> {
        shared_entries(diseases.iter().map(|d| self.diagnostic_tests(d.as_ref())))
    }

    /// Add or replace the medication list for a disease.
    pub fn add_prescription(&mut self, disease: &str, medications: Vec<String>) {
        self.prescriptions.insert(disease.to_string(), medications);
    }

    /// Add or replace the diagnostic-test list for a disease.
    pub fn add_tests(&mut self, disease: &str, tests: Vec<String>) {
        self.tests.insert(disease.to_string(), tests);
    }

    /// Default medication table.
    fn default_prescriptions() -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();

        map.insert(
            "Asthma".into(),
            vec!["Salbutamol Inhaler".into(), "Montelukast Tablet".into()],
        );
        map.insert(
            "Pneumonia".into(),
            vec!["Amoxicillin".into(), "Paracetamol".into()],
        );
        map.insert(
            "Tuberculosis".into(),
            vec![
                "Isoniazid".into(),
                "Rifampicin".into(),
                "Pyrazinamide".into(),
                "Ethambutol".into(),
            ],
        );
        map.insert(
            "Hypertension".into(),
            vec!["Amlodipine".into(), "Losartan".into()],
        );
        map.insert(
            "Migraine".into(),
            vec!["Paracetamol".into(), "Sumatriptan".into()],
        );
        map.insert(
            "Flu".into(),
            vec!["Oseltamivir".into(), "Paracetamol".into()],
        );
        map.insert(
            "Diabetes".into(),
            vec!["Metformin".into(), "Glimepiride".into()],
        );
        map.insert(
            "Cold".into(),
            vec!["Paracetamol".into(), "Cetirizine".into()],
        );
        map.insert(
            "Malaria".into(),
            vec!["Chloroquine".into(), "Artemether-Lumefantrine".into()],
        );
        map.insert(
            "COVID-19".into(),
            vec!["Paracetamol".into(), "Vitamin C".into(), "Zinc".into()],
        );

        map
    }

    /// Default diagnostic-test table.
    fn default_tests() -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();

        map.insert(
            "Asthma".into(),
            vec!["Spirometry".into(), "Peak Flow Test".into()],
        );
        map.insert(
            "Pneumonia".into(),
            vec!["Chest X-Ray".into(), "Sputum Culture".into()],
        );
        map.insert(
            "Tuberculosis".into(),
            vec![
                "Mantoux Test".into(),
                "Chest X-Ray".into(),
                "Sputum Culture".into(),
            ],
        );
        map.insert(
            "Hypertension".into(),
            vec!["Blood Pressure Monitoring".into(), "Lipid Profile".into()],
        );
        map.insert(
            "Migraine".into(),
            vec!["Neurological Examination".into(), "MRI Brain".into()],
        );
        map.insert(
            "Flu".into(),
            vec!["Rapid Influenza Test".into(), "Complete Blood Count".into()],
        );
        map.insert(
            "Diabetes".into(),
            vec!["Fasting Blood Sugar".into(), "HbA1c".into()],
        );
        map.insert(
            "Cold".into(),
            vec!["Physical Examination".into(), "Complete Blood Count".into()],
        );
        map.insert(
            "Malaria".into(),
            vec![
                "Blood Smear Microscopy".into(),
                "Rapid Diagnostic Test".into(),
                "Complete Blood Count".into(),
            ],
        );
        map.insert(
            "COVID-19".into(),
            vec!["RT-PCR Test".into(), "Chest CT Scan".into()],
        );

        map
    }
}

/// Entries appearing in more than one of the given lists, in order of
/// first appearance.
fn shared_entries<I: Iterator<Item = Vec<String>>>(lists: I) -> Vec<String> {
    let mut seen: Vec<(String, usize)> = Vec::new();
    for list in lists {
        for entry in list {
            match seen.iter_mut().find(|(name, _)| *name == entry) {
                Some((_, count)) => *count += 1,
                None => seen.push((entry, 1)),
            }
        }
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}
