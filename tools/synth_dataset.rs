//! Synthetic Cohort Writer
//!
//! Writes a deterministic cohort CSV in the historical dataset layout, for
//! exercising the trainer without the real study data.

use anyhow::{Context, Result};
use chd_risk_pipeline::config::{AppConfig, DEFAULT_CONFIG_PATH};
use chd_risk_pipeline::dataset::synthetic::SyntheticCohort;
use chd_risk_pipeline::logging;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// Generate a synthetic CHD cohort
#[derive(Parser, Debug)]
#[command(name = "chd-synth")]
#[command(about = "Write a synthetic cohort CSV for training")]
struct Args {
    /// Configuration file (only `[logging]` is read)
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of patients
    #[arg(long, short = 'n', default_value_t = 4000)]
    rows: usize,

    /// Random seed
    #[arg(long, short = 's', default_value_t = 42)]
    seed: u64,

    /// Output CSV path
    #[arg(long, short = 'o', default_value = "heart-disease-prediction.csv")]
    output: PathBuf,

    /// Leave every cell populated
    #[arg(long)]
    no_missing: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_from_path(&args.config)?;
    logging::init(&config.logging)?;

    let mut cohort = SyntheticCohort::new(args.seed);
    if args.no_missing {
        cohort = cohort.without_missing();
    }
    let dataset = cohort.generate(args.rows)?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    dataset
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        rows = dataset.len(),
        seed = args.seed,
        output = %args.output.display(),
        "Synthetic cohort written"
    );
    Ok(())
}
