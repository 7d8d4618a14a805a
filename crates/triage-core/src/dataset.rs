//! Training dataset loader.
//!
//! Expected format: comma-separated table, header row required. Every
//! column except the last holds {0,1} symptom indicators; the last
//! column is named `prognosis` and holds the disease label. Columns
//! containing a missing or unparseable value are dropped whole before
//! training (rows are kept).

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Required name of the label column.
pub const LABEL_COLUMN: &str = "prognosis";

/// Dataset errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("training table is empty")]
    EmptyTable,

    #[error("last column must be `{LABEL_COLUMN}`, found `{0}`")]
    NoLabelColumn(String),

    #[error("row {line} has {found} fields, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {line} has a missing disease label")]
    MissingLabel { line: usize },

    #[error("no usable symptom columns after dropping missing values")]
    NoFeatureColumns,
}

pub type DataResult<T> = Result<T, DataError>;

/// Parsed training table: binary symptom features plus a label column.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTable {
    /// Raw symptom column names, in feature order, after column drops
    feature_columns: Vec<String>,
    /// Feature rows, each of length `feature_columns.len()`
    features: Vec<Vec<f64>>,
    /// Disease label per row
    labels: Vec<String>,
}

impl TrainingTable {
    /// Load a training table from a file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> DataResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a training table from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> DataResult<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(DataError::EmptyTable),
        };
        let columns: Vec<String> = split_row(&header);

        let label_column = columns.last().ok_or(DataError::EmptyTable)?;
        if label_column != LABEL_COLUMN {
            return Err(DataError::NoLabelColumn(label_column.clone()));
        }
        let n_features = columns.len() - 1;

        let mut raw_rows: Vec<Vec<Option<f64>>> = Vec::new();
        let mut labels: Vec<String> = Vec::new();

        for (offset, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = offset + 2; // 1-based, after header

            let fields = split_row(&line);
            if fields.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    line: line_no,
                    expected: columns.len(),
                    found: fields.len(),
                });
            }

            let label = fields[n_features].clone();
            if label.is_empty() {
                // The column-drop policy cannot save the label column
                return Err(DataError::MissingLabel { line: line_no });
            }

            let row: Vec<Option<f64>> = fields[..n_features]
                .iter()
                .map(|cell| cell.parse::<f64>().ok())
                .collect();

            raw_rows.push(row);
            labels.push(label);
        }

        if raw_rows.is_empty() {
            return Err(DataError::EmptyTable);
        }

        // Columns with any missing value are dropped whole
        let dropped: BTreeSet<usize> = (0..n_features)
            .filter(|&col| raw_rows.iter().any(|row| row[col].is_none()))
            .collect();

        for &col in &dropped {
            warn!(column = %columns[col], "dropping column with missing values");
        }

        let feature_columns: Vec<String> = columns[..n_features]
            .iter()
            .enumerate()
            .filter(|(i, _)| !dropped.contains(i))
            .map(|(_, name)| name.clone())
            .collect();

        if feature_columns.is_empty() {
            return Err(DataError::NoFeatureColumns);
        }

        let features: Vec<Vec<f64>> = raw_rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| !dropped.contains(i))
                    .map(|(_, cell)| cell.unwrap_or_default())
                    .collect()
            })
            .collect();

        debug!(
            rows = features.len(),
            columns = feature_columns.len(),
            dropped = dropped.len(),
            "training table parsed"
        );

        Ok(Self {
            feature_columns,
            features,
            labels,
        })
    }

    /// Raw symptom column names in feature order.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Binary feature rows.
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Disease label per row.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of training rows.
    pub fn n_rows(&self) -> usize {
        self.features.len()
    }
}

/// Split a CSV line into trimmed fields.
///
/// The training format is plain comma-separated with no quoting, so a
/// straight split is sufficient.
fn split_row(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(',')
        .map(|f| f.trim().to_string())
        .collect()
}
