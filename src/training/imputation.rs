//! Deterministic missing-value imputation.
//!
//! Statistics are computed once over the whole dataset, before any column
//! is filled or dropped, and then applied as plain scalar fills.

use crate::dataset::{Dataset, EDUCATION_COLUMN};
use crate::error::TrainingDataError;
use std::cmp::Ordering;
use tracing::info;

/// Statistic used to fill a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputationStrategy {
    Mean,
    Median,
    /// Most frequent value, smallest value on ties
    Mode,
}

impl ImputationStrategy {
    /// Compute the statistic over the observed values of a column
    pub fn statistic(self, values: &[Option<f64>]) -> Option<f64> {
        match self {
            ImputationStrategy::Mean => mean(values),
            ImputationStrategy::Median => median(values),
            ImputationStrategy::Mode => mode(values),
        }
    }
}

/// Columns filled during cleaning, in fill order
pub const IMPUTATION_RULES: [(&str, ImputationStrategy); 7] = [
    (EDUCATION_COLUMN, ImputationStrategy::Mean),
    ("cigsPerDay", ImputationStrategy::Median),
    ("BPMeds", ImputationStrategy::Median),
    ("glucose", ImputationStrategy::Median),
    ("totChol", ImputationStrategy::Mode),
    ("BMI", ImputationStrategy::Mode),
    ("heartRate", ImputationStrategy::Mode),
];

/// Arithmetic mean of observed values
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.is_empty() {
        return None;
    }
    Some(observed.iter().sum::<f64>() / observed.len() as f64)
}

/// Median of observed values; the average of the two middle values for an
/// even count
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let sorted = sorted_observed(values);
    if sorted.is_empty() {
        return None;
    }

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent observed value; ties go to the smallest value
pub fn mode(values: &[Option<f64>]) -> Option<f64> {
    let sorted = sorted_observed(values);
    let mut best: Option<(f64, usize)> = None;
    let mut start = 0;

    while start < sorted.len() {
        let value = sorted[start];
        let run = sorted[start..]
            .iter()
            .take_while(|v| v.total_cmp(&value) == Ordering::Equal)
            .count();

        if best.map_or(true, |(_, count)| run > count) {
            best = Some((value, run));
        }
        start += run;
    }

    best.map(|(value, _)| value)
}

fn sorted_observed(values: &[Option<f64>]) -> Vec<f64> {
    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    observed.sort_by(f64::total_cmp);
    observed
}

/// A single column fill
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFill {
    pub column: String,
    pub strategy: ImputationStrategy,
    pub value: f64,
    /// Missing cells in the dataset the plan was fitted on
    pub missing: usize,
}

/// Fill values fitted on a dataset
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImputationPlan {
    fills: Vec<ColumnFill>,
}

impl ImputationPlan {
    /// Compute every fill statistic from the raw dataset
    pub fn fit(dataset: &Dataset) -> Result<Self, TrainingDataError> {
        let mut fills = Vec::with_capacity(IMPUTATION_RULES.len());

        for (column, strategy) in IMPUTATION_RULES {
            let values = dataset.require(column)?;
            let value = strategy
                .statistic(values)
                .ok_or_else(|| TrainingDataError::NoObservedValues(column.to_string()))?;
            let missing = values.iter().filter(|v| v.is_none()).count();

            info!(
                column = column,
                strategy = ?strategy,
                value = value,
                missing = missing,
                "Imputation statistic computed"
            );

            fills.push(ColumnFill {
                column: column.to_string(),
                strategy,
                value,
                missing,
            });
        }

        Ok(Self { fills })
    }

    /// Return a copy of `dataset` with every planned column filled
    pub fn apply(&self, dataset: Dataset) -> Result<Dataset, TrainingDataError> {
        self.fills.iter().try_fold(dataset, |dataset, fill| {
            let filled = dataset
                .require(&fill.column)?
                .iter()
                .map(|v| Some(v.unwrap_or(fill.value)))
                .collect();
            dataset.with_column(&fill.column, filled)
        })
    }

    pub fn fills(&self) -> &[ColumnFill] {
        &self.fills
    }

    /// Fill value planned for a column
    pub fn value_for(&self, column: &str) -> Option<f64> {
        self.fills
            .iter()
            .find(|f| f.column == column)
            .map(|f| f.value)
    }
}
