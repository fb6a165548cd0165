//! End-to-end training: raw dataset to model artifact.

use crate::config::TrainingConfig;
use crate::dataset::{Dataset, EDUCATION_COLUMN};
use crate::error::{TrainingDataError, TrainingError};
use crate::feature_contract::FEATURES;
use crate::models::artifact::{ModelArtifact, TrainingSummary};
use crate::models::inference::binarize;
use crate::training::evaluation::ClassificationReport;
use crate::training::imputation::ImputationPlan;
use crate::training::logistic::{FitReport, LogisticRegression};
use crate::training::split::{take, train_test_split};
use std::path::Path;
use tracing::{info, warn};

/// Fixed hyper-parameters of a training run.
///
/// These are part of the reproducibility contract: the same dataset and
/// settings always produce the same fitted parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSettings {
    pub test_fraction: f64,
    pub split_seed: u64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Inverse L2 regularisation strength
    pub inverse_regularization: f64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
            max_iterations: 1000,
            tolerance: 1e-6,
            inverse_regularization: 1.0,
        }
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    /// Held-out diagnostics; not part of the artifact
    pub report: ClassificationReport,
    pub fit: FitReport,
    pub imputation: ImputationPlan,
}

/// Training pipeline bound to explicit configuration
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: TrainingConfig,
    settings: TrainingSettings,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            settings: TrainingSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TrainingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Read the configured dataset and train on it
    pub fn run_from_config(&self) -> Result<TrainingOutcome, TrainingError> {
        let dataset = Dataset::from_csv_path(&self.config.dataset_path)?;
        info!(
            path = %self.config.dataset_path.display(),
            rows = dataset.len(),
            "Historical dataset loaded"
        );
        self.run(&dataset)
    }

    /// Train and write the artifact to `path`
    pub fn train_and_persist<P: AsRef<Path>>(
        &self,
        dataset: &Dataset,
        path: P,
    ) -> Result<TrainingOutcome, TrainingError> {
        let outcome = self.run(dataset)?;
        outcome.artifact.persist(path)?;
        Ok(outcome)
    }

    /// Clean, split, fit and evaluate
    pub fn run(&self, dataset: &Dataset) -> Result<TrainingOutcome, TrainingError> {
        let label_column = self.config.label_column.as_str();

        if dataset.is_empty() {
            return Err(TrainingDataError::Empty.into());
        }
        let labels = parse_labels(label_column, dataset.require(label_column)?)?;
        require_both_classes(label_column, &labels)?;

        let imputation = ImputationPlan::fit(dataset)?;
        let cleaned = imputation
            .apply(dataset.clone())?
            .without_column(EDUCATION_COLUMN);

        let features = feature_rows(&cleaned)?;

        let split = train_test_split(
            features.len(),
            self.settings.test_fraction,
            self.settings.split_seed,
        );
        let x_train = take(&features, &split.train);
        let y_train = take(&labels, &split.train);
        let x_test = take(&features, &split.test);
        let y_test = take(&labels, &split.test);
        require_both_classes(label_column, &y_train)?;

        info!(
            rows = features.len(),
            train = x_train.len(),
            test = x_test.len(),
            seed = self.settings.split_seed,
            "Dataset partitioned"
        );

        let y_train_f: Vec<f64> = y_train.iter().map(|&y| f64::from(y)).collect();
        let (classifier, fit) = LogisticRegression::new(self.settings.inverse_regularization)
            .with_max_iterations(self.settings.max_iterations)
            .with_tolerance(self.settings.tolerance)
            .fit(&x_train, &y_train_f);

        if fit.converged {
            info!(
                iterations = fit.iterations,
                loss = fit.final_loss,
                "Classifier converged"
            );
        } else if self.config.fail_on_non_convergence {
            return Err(TrainingError::NotConverged {
                iterations: fit.iterations,
            });
        } else {
            warn!(
                iterations = fit.iterations,
                gradient = fit.gradient_norm,
                "Classifier did not converge; using best parameters reached"
            );
        }

        let y_pred: Vec<u8> = x_test
            .iter()
            .map(|row| binarize(classifier.predict_proba(row)).as_int())
            .collect();
        let report = ClassificationReport::from_predictions(&y_test, &y_pred);
        info!(accuracy = report.accuracy, "Held-out evaluation complete");

        let artifact = ModelArtifact::new(classifier, label_column).with_training_summary(
            TrainingSummary {
                rows_total: features.len(),
                rows_train: x_train.len(),
                rows_test: x_test.len(),
                iterations: fit.iterations,
                converged: fit.converged,
                test_accuracy: report.accuracy,
            },
        );

        Ok(TrainingOutcome {
            artifact,
            report,
            fit,
            imputation,
        })
    }
}

fn parse_labels(column: &str, values: &[Option<f64>]) -> Result<Vec<u8>, TrainingDataError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Some(v) if *v == 0.0 => Ok(0),
            Some(v) if *v == 1.0 => Ok(1),
            other => Err(TrainingDataError::InvalidLabel {
                column: column.to_string(),
                row: index + 1,
                value: other.map_or_else(|| "missing".to_string(), |v| v.to_string()),
            }),
        })
        .collect()
}

fn require_both_classes(column: &str, labels: &[u8]) -> Result<(), TrainingDataError> {
    let Some(&first) = labels.first() else {
        return Err(TrainingDataError::Empty);
    };
    if labels.iter().all(|&y| y == first) {
        return Err(TrainingDataError::SingleClass {
            column: column.to_string(),
            class: first,
        });
    }
    Ok(())
}

/// Feature matrix in contract order.
///
/// Every cell must satisfy the same per-kind check that inference applies
/// to requests.
fn feature_rows(dataset: &Dataset) -> Result<Vec<Vec<f64>>, TrainingDataError> {
    let columns = FEATURES
        .iter()
        .map(|spec| dataset.require(spec.name).map(|values| (spec, values)))
        .collect::<Result<Vec<_>, _>>()?;

    (0..dataset.len())
        .map(|row| {
            columns
                .iter()
                .map(|(spec, values)| {
                    let value = values[row].ok_or_else(|| TrainingDataError::UnimputedMissing {
                        column: spec.name.to_string(),
                        row: row + 1,
                    })?;
                    spec.accept(value)
                        .map_err(|reason| TrainingDataError::InvalidFeature {
                            column: spec.name.to_string(),
                            row: row + 1,
                            reason,
                        })
                })
                .collect()
        })
        .collect()
}
