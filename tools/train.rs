//! CHD Risk Model Trainer
//!
//! Reads the historical cohort, fits the classifier, prints the held-out
//! evaluation and persists the model artifact.
//!
//! Usage:
//!   chd-train --dataset heart-disease-prediction.csv --artifact heart_disease_model.json

use anyhow::{Context, Result};
use chd_risk_pipeline::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging,
    training::TrainingPipeline,
    Dataset,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Train the ten-year CHD risk classifier
#[derive(Parser, Debug)]
#[command(name = "chd-train")]
#[command(about = "Train the CHD risk classifier and write the model artifact")]
struct Args {
    /// Configuration file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Historical dataset CSV (overrides [training].dataset_path)
    #[arg(long, short = 'd')]
    dataset: Option<PathBuf>,

    /// Artifact output path (overrides [artifact].path)
    #[arg(long, short = 'o')]
    artifact: Option<PathBuf>,

    /// Outcome column (overrides [training].label_column)
    #[arg(long)]
    label: Option<String>,

    /// Fail if the optimizer does not converge
    #[arg(long)]
    strict_convergence: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_from_path(&args.config)?;
    if let Some(dataset) = args.dataset {
        config.training.dataset_path = dataset;
    }
    if let Some(artifact) = args.artifact {
        config.artifact.path = artifact;
    }
    if let Some(label) = args.label {
        config.training.label_column = label;
    }
    if args.strict_convergence {
        config.training.fail_on_non_convergence = true;
    }

    logging::init(&config.logging)?;
    info!(
        dataset = %config.training.dataset_path.display(),
        label = %config.training.label_column,
        "Starting training run"
    );

    let dataset = Dataset::from_csv_path(&config.training.dataset_path).with_context(|| {
        format!(
            "Failed to read dataset {}",
            config.training.dataset_path.display()
        )
    })?;

    let pipeline = TrainingPipeline::new(config.training.clone());
    let outcome = pipeline
        .train_and_persist(&dataset, &config.artifact.path)
        .context("Training failed")?;

    println!("Accuracy: {:.4}", outcome.report.accuracy);
    println!();
    println!("{}", outcome.report);
    println!(
        "Model saved to {} (artifact {})",
        config.artifact.path.display(),
        outcome.artifact.artifact_id
    );

    Ok(())
}
