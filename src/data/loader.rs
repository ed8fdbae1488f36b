// ============================================================
// Layer 4 — UCR Table Loader
// ============================================================
// Parses the UCR archive's tab-separated format:
//
//   label <TAB> x_0 <TAB> x_1 <TAB> ... <TAB> x_{T-1}
//
// One row = one series. The label column holds a signed integer,
// sometimes written in float notation ("-1.0000000e+00"), and is
// truncated toward zero before use.
//
// FordA labels are {-1, +1}; -1 is remapped to class 0 so the
// classifier sees contiguous class indices {0, 1}.
//
// Every row must have the same number of columns. The csv crate
// enforces this (flexible = false) and reports UnequalLengths.
//
// Reference: csv crate documentation (ReaderBuilder)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::domain::series::{SeriesSet, TimeSeriesSample};
use crate::domain::traits::DatasetSource;

/// Label value that is folded into class 0.
const NEGATIVE_CLASS_LABEL: i64 = -1;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}, column {column}: '{value}' is not a number")]
    InvalidNumber { row: usize, column: usize, value: String },

    #[error("row {row} has a label but no observations")]
    MissingFeatures { row: usize },

    #[error("table contains no rows")]
    Empty,

    #[error("row {row}: label {label} is negative after remapping")]
    NegativeLabel { row: usize, label: i64 },

    #[error("inconsistent series: {0}")]
    Inconsistent(String),
}

/// Parsed but not yet reshaped table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub features: Vec<Vec<f32>>,
    pub labels:   Vec<i64>,
}

pub struct UcrLoader;

impl UcrLoader {
    pub fn new() -> Self {
        Self
    }

    /// Split every row into (label, features).
    pub fn parse(&self, text: &str) -> Result<RawTable, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut features = Vec::new();
        let mut labels   = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record?;

            let mut fields = record.iter().enumerate();
            let label = match fields.next() {
                Some((column, field)) => parse_number(field, row, column)?.trunc() as i64,
                None => continue,
            };

            let values = fields
                .map(|(column, field)| parse_number(field, row, column).map(|v| v as f32))
                .collect::<Result<Vec<f32>, LoadError>>()?;

            if values.is_empty() {
                return Err(LoadError::MissingFeatures { row });
            }

            features.push(values);
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(RawTable { features, labels })
    }

    /// Parse a table and turn it into (N, T, 1) samples with
    /// labels remapped to class indices.
    pub fn load_text(&self, text: &str) -> Result<SeriesSet, LoadError> {
        let RawTable { features, labels } = self.parse(text)?;

        let samples = features
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(row, (values, label))| {
                let label = remap_label(label);
                if label < 0 {
                    return Err(LoadError::NegativeLabel { row, label });
                }
                Ok(TimeSeriesSample::new(values, label as usize))
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        SeriesSet::new(samples).map_err(|e| LoadError::Inconsistent(e.to_string()))
    }

    /// Fetch and load one partition.
    pub fn load(&self, source: &dyn DatasetSource) -> Result<SeriesSet> {
        let location = source.describe();
        let text = source.read_to_string()?;
        let set = self
            .load_text(&text)
            .with_context(|| format!("Cannot parse dataset '{location}'"))?;

        tracing::info!(
            "Loaded {} series of length {} from '{}' ({} classes)",
            set.len(),
            set.timesteps(),
            location,
            set.num_classes()
        );
        Ok(set)
    }
}

impl Default for UcrLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Random permutation of the sample order using the caller's RNG.
pub fn shuffle_samples<R: Rng + ?Sized>(set: SeriesSet, rng: &mut R) -> SeriesSet {
    set.map_samples(|mut samples| {
        samples.shuffle(rng);
        samples
    })
}

fn remap_label(label: i64) -> i64 {
    if label == NEGATIVE_CLASS_LABEL { 0 } else { label }
}

fn parse_number(field: &str, row: usize, column: usize) -> Result<f64, LoadError> {
    field.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        row,
        column,
        value: field.to_string(),
    })
}
