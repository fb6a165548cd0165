//! Versioned model artifact: classifier parameters bundled with the column
//! order they were fitted on.

use crate::error::PersistError;
use crate::feature_contract::FeatureContract;
use crate::training::logistic::LogisticParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Current artifact layout version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Facts about the training run that produced an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub rows_total: usize,
    pub rows_train: usize,
    pub rows_test: usize,
    pub iterations: usize,
    pub converged: bool,
    pub test_accuracy: f64,
}

/// Immutable, self-describing model bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub artifact_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub label_column: String,
    /// Feature columns in the order the classifier consumes them
    pub columns: Vec<String>,
    pub classifier: LogisticParams,
    #[serde(default)]
    pub training: Option<TrainingSummary>,
}

impl ModelArtifact {
    /// Bundle fitted parameters with the contract column order
    pub fn new(classifier: LogisticParams, label_column: impl Into<String>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            artifact_id: Uuid::new_v4(),
            created_at: Utc::now(),
            label_column: label_column.into(),
            columns: FeatureContract::feature_names()
                .into_iter()
                .map(String::from)
                .collect(),
            classifier,
            training: None,
        }
    }

    /// Attach training run details
    pub fn with_training_summary(mut self, summary: TrainingSummary) -> Self {
        self.training = Some(summary);
        self
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<Vec<u8>, PersistError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Write the artifact to `path`.
    ///
    /// Bytes go to a uniquely named sibling file which is then renamed over
    /// the target, so readers never observe a partial artifact and
    /// concurrent writers cannot interleave.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let path = path.as_ref();
        let bytes = self.to_json()?;
        let io_error = |source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        fs::create_dir_all(&parent).map_err(io_error)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let temp_path = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        fs::write(&temp_path, &bytes).map_err(io_error)?;
        if let Err(source) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_error(source));
        }

        info!(
            artifact_id = %self.artifact_id,
            path = %path.display(),
            bytes = bytes.len(),
            "Model artifact persisted"
        );
        Ok(())
    }
}
