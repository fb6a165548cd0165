//! Error taxonomy for the risk-scoring core.
//!
//! Every failure surfaced by the library is one of these typed kinds:
//! validation (client input), load (artifact), prediction (input or
//! scoring), and training (dataset deficiencies).

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Reason a single input field was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Required field not present
    Missing,
    /// Field present but `null`
    Null,
    /// Value is not a number
    WrongType { found: &'static str },
    /// Binary flag outside {0, 1}
    NotBinary { value: String },
    /// Continuous value is NaN or infinite
    NonFinite,
    /// Key is not part of the feature contract
    UnknownField,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing => write!(f, "field required"),
            Violation::Null => write!(f, "must not be null"),
            Violation::WrongType { found } => write!(f, "expected a number, found {found}"),
            Violation::NotBinary { value } => write!(f, "must be 0 or 1, got {value}"),
            Violation::NonFinite => write!(f, "must be a finite number"),
            Violation::UnknownField => write!(f, "unknown field"),
        }
    }
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: Violation,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Client-caused input rejection, carrying every violation found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, reason: Violation) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason,
            }],
        }
    }

    /// Whether any violation names `field`
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Artifact could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {} is corrupt: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },

    #[error("model artifact {} is missing its `{section}` section", path.display())]
    MissingSection { path: PathBuf, section: &'static str },

    #[error("model artifact {} has format version {found}, expected {expected}", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("model artifact column order does not match the feature contract: {0}")]
    ColumnMismatch(#[from] ColumnOrderMismatch),

    #[error("model artifact parameters are invalid: {0}")]
    ParameterMismatch(String),
}

/// Stored column order differs from the feature contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} columns in contract order, found {found:?}")]
pub struct ColumnOrderMismatch {
    pub expected: usize,
    pub found: Vec<String>,
}

/// Discriminant of [`PredictionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionErrorKind {
    InvalidInput,
    ScoringFailure,
}

/// Failure of a single `predict` call
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("scoring failed: {detail}")]
    ScoringFailure { detail: String },
}

impl PredictionError {
    pub fn kind(&self) -> PredictionErrorKind {
        match self {
            PredictionError::InvalidInput(_) => PredictionErrorKind::InvalidInput,
            PredictionError::ScoringFailure { .. } => PredictionErrorKind::ScoringFailure,
        }
    }

    pub(crate) fn scoring(detail: impl Into<String>) -> Self {
        PredictionError::ScoringFailure {
            detail: detail.into(),
        }
    }
}

/// Dataset deficiency that makes training impossible
#[derive(Debug, Error)]
pub enum TrainingDataError {
    #[error("dataset is empty")]
    Empty,

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(String),

    #[error("label column `{column}` contains a single class ({class}); need both 0 and 1")]
    SingleClass { column: String, class: u8 },

    #[error("label column `{column}` has invalid value {value} at row {row}; expected 0 or 1")]
    InvalidLabel {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column `{column}` has non-numeric value `{value}` at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column `{column}` has non-finite value `{value}` at row {row}")]
    NonFinite {
        column: String,
        row: usize,
        value: String,
    },

    #[error("feature `{column}` at row {row}: {reason}")]
    InvalidFeature {
        column: String,
        row: usize,
        reason: Violation,
    },

    #[error("column `{column}` has a missing value at row {row} and no imputation rule")]
    UnimputedMissing { column: String, row: usize },

    #[error("column `{0}` has no observed values to impute from")]
    NoObservedValues(String),

    #[error("column `{column}` has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("failed to read dataset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed dataset: {0}")]
    Malformed(#[from] csv::Error),
}

/// Artifact could not be written
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize model artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of a training run
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Data(#[from] TrainingDataError),

    #[error("classifier did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error(transparent)]
    Persist(#[from] PersistError),
}
