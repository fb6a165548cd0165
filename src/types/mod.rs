//! Type definitions shared by training and inference

pub mod prediction;
pub mod record;

pub use prediction::{PredictionOutput, RiskLabel};
pub use record::{PatientRecord, ValidatedRecord};
