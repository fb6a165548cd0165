//! CHD Risk Pipeline Library
//!
//! Trains a ten-year coronary heart disease risk classifier from a
//! historical cohort and serves single-record predictions from the
//! persisted model artifact.

pub mod config;
pub mod dataset;
pub mod error;
pub mod feature_contract;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod server;
pub mod training;
pub mod types;

pub use config::AppConfig;
pub use dataset::Dataset;
pub use error::{LoadError, PredictionError, TrainingError, ValidationError};
pub use feature_contract::FeatureContract;
pub use models::{InferenceEngine, ModelArtifact, ModelLoader};
pub use training::{TrainingOutcome, TrainingPipeline, TrainingSettings};
pub use types::{PatientRecord, PredictionOutput, RiskLabel};
