//! Model artifact loader

use crate::error::{ColumnOrderMismatch, LoadError};
use crate::feature_contract::{FeatureContract, FEATURE_COUNT};
use crate::models::artifact::{ModelArtifact, ARTIFACT_FORMAT_VERSION};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// Sections every artifact must carry
const REQUIRED_SECTIONS: [&str; 2] = ["columns", "classifier"];

/// Loader for persisted model artifacts
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelLoader;

impl ModelLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read, decode and verify an artifact.
    ///
    /// Fails if the file is absent or unreadable, is not a JSON artifact, lacks
    /// its parameters or column order, or stores a column order or
    /// coefficient count that disagrees with the feature contract.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ModelArtifact, LoadError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model artifact");

        let bytes = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let corrupt = |detail: String| LoadError::Corrupt {
            path: path.to_path_buf(),
            detail,
        };

        let document: Value = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        let Value::Object(fields) = &document else {
            return Err(corrupt("expected a JSON object".to_string()));
        };

        for section in REQUIRED_SECTIONS {
            if fields.get(section).map_or(true, Value::is_null) {
                return Err(LoadError::MissingSection {
                    path: path.to_path_buf(),
                    section,
                });
            }
        }

        let version = fields
            .get("format_version")
            .and_then(Value::as_u64)
            .ok_or_else(|| corrupt("missing or invalid format_version".to_string()))?;
        if version != u64::from(ARTIFACT_FORMAT_VERSION) {
            return Err(LoadError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: u32::try_from(version).unwrap_or(u32::MAX),
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact =
            serde_json::from_value(document).map_err(|e| corrupt(e.to_string()))?;
        verify(&artifact)?;

        info!(
            artifact_id = %artifact.artifact_id,
            created_at = %artifact.created_at,
            features = artifact.columns.len(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }
}

/// Check an artifact against the feature contract
pub fn verify(artifact: &ModelArtifact) -> Result<(), LoadError> {
    if !FeatureContract::matches(&artifact.columns) {
        return Err(ColumnOrderMismatch {
            expected: FEATURE_COUNT,
            found: artifact.columns.clone(),
        }
        .into());
    }

    let classifier = &artifact.classifier;
    if classifier.coefficients.len() != FEATURE_COUNT {
        return Err(LoadError::ParameterMismatch(format!(
            "expected {} coefficients, found {}",
            FEATURE_COUNT,
            classifier.coefficients.len()
        )));
    }
    if !classifier.intercept.is_finite() || classifier.coefficients.iter().any(|w| !w.is_finite()) {
        return Err(LoadError::ParameterMismatch(
            "parameters must be finite".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::logistic::LogisticParams;
    use serde_json::json;

    fn artifact() -> ModelArtifact {
        ModelArtifact::new(
            LogisticParams {
                coefficients: vec![0.01; FEATURE_COUNT],
                intercept: -2.0,
            },
            "TenYearCHD",
        )
    }

    fn write_json(dir: &tempfile::TempDir, value: &Value) -> std::path::PathBuf {
        let path = dir.path().join("model.json");
        fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let original = artifact();
        original.persist(&path).unwrap();

        let loaded = ModelLoader::new().load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelLoader::new().load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"\x00\x01 not json").unwrap();

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Corrupt { .. }));
    }

    #[test]
    fn test_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = serde_json::to_value(artifact()).unwrap();
        value.as_object_mut().unwrap().remove("columns");
        let path = write_json(&dir, &value);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingSection { section: "columns", .. }));

        let mut value = serde_json::to_value(artifact()).unwrap();
        value["classifier"] = Value::Null;
        let path = write_json(&dir, &value);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingSection { section: "classifier", .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = serde_json::to_value(artifact()).unwrap();
        value["format_version"] = json!(99);
        let path = write_json(&dir, &value);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = serde_json::to_value(artifact()).unwrap();
        let columns = value["columns"].as_array_mut().unwrap();
        columns.swap(0, 1);
        let path = write_json(&dir, &value);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoadError::ColumnMismatch(_)));
    }

    #[test]
    fn test_wrong_coefficient_count() {
        let mut bad = artifact();
        bad.classifier.coefficients.pop();
        assert!(matches!(verify(&bad), Err(LoadError::ParameterMismatch(_))));
    }
}
