//! Inference engine for CHD risk scoring

use crate::error::{LoadError, PredictionError, ValidationError, Violation};
use crate::feature_contract::FeatureContract;
use crate::models::artifact::ModelArtifact;
use crate::models::loader::{self, ModelLoader};
use crate::training::logistic::sigmoid;
use crate::types::prediction::{PredictionOutput, RiskLabel};
use crate::types::record::{PatientRecord, ValidatedRecord};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Probability at or above which a record is labelled high risk
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Decimal digits kept in the reported probability
pub const PROBABILITY_DECIMALS: i32 = 4;

/// Map an unrounded probability to a label
pub fn binarize(probability: f64) -> RiskLabel {
    if probability >= DECISION_THRESHOLD {
        RiskLabel::HighRisk
    } else {
        RiskLabel::NotHighRisk
    }
}

/// Round a probability to [`PROBABILITY_DECIMALS`] digits, half away from zero
pub fn round_probability(probability: f64) -> f64 {
    let scale = 10f64.powi(PROBABILITY_DECIMALS);
    (probability * scale).round() / scale
}

/// Stateless scorer over one immutable model artifact.
///
/// Cloning is cheap and clones share the artifact, so one engine can serve
/// any number of concurrent callers without locking.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifact: Arc<ModelArtifact>,
}

impl InferenceEngine {
    /// Create an engine from an in-memory artifact
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    /// Load and verify an artifact from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        ModelLoader::new().load(path).map(Self::new)
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Score a JSON object of contract fields
    pub fn predict(&self, input: &Map<String, Value>) -> Result<PredictionOutput, PredictionError> {
        let record = FeatureContract::validate(input)?;
        self.predict_validated(&record)
    }

    /// Score an arbitrary JSON value; anything but an object is invalid input
    pub fn predict_value(&self, input: &Value) -> Result<PredictionOutput, PredictionError> {
        match input {
            Value::Object(map) => self.predict(map),
            other => Err(ValidationError::single(
                "body",
                Violation::WrongType {
                    found: json_type(other),
                },
            )
            .into()),
        }
    }

    /// Score a typed record
    pub fn predict_record(&self, record: &PatientRecord) -> Result<PredictionOutput, PredictionError> {
        let record = FeatureContract::validate_record(record)?;
        self.predict_validated(&record)
    }

    /// Score a record that already passed the contract
    pub fn predict_validated(
        &self,
        record: &ValidatedRecord,
    ) -> Result<PredictionOutput, PredictionError> {
        let probability = self.probability(record)?;
        let label = binarize(probability);

        debug!(
            artifact_id = %self.artifact.artifact_id,
            probability = probability,
            prediction = label.as_int(),
            "Record scored"
        );

        Ok(PredictionOutput::new(label, round_probability(probability)))
    }

    /// Unrounded positive-class probability
    pub fn probability(&self, record: &ValidatedRecord) -> Result<f64, PredictionError> {
        let artifact = &self.artifact;
        let features = FeatureContract::project(record, &artifact.columns)
            .map_err(|e| PredictionError::scoring(format!("artifact integrity fault: {e}")))?;

        let classifier = &artifact.classifier;
        if classifier.coefficients.len() != features.len() {
            return Err(PredictionError::scoring(format!(
                "artifact integrity fault: {} coefficients for {} features",
                classifier.coefficients.len(),
                features.len()
            )));
        }

        let logit = classifier.decision_function(&features);
        if !logit.is_finite() {
            return Err(PredictionError::scoring(format!("non-finite log-odds {logit}")));
        }

        let probability = sigmoid(logit);
        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::scoring(format!(
                "probability {probability} outside [0, 1]"
            )));
        }
        Ok(probability)
    }

    /// Re-check the held artifact against the feature contract
    pub fn verify(&self) -> Result<(), LoadError> {
        loader::verify(&self.artifact)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
