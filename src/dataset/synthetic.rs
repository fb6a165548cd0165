//! Seeded synthetic cohort generator.
//!
//! Produces datasets in the historical layout (contract features,
//! `education`, label) with a latent logistic CHD risk, so training and the
//! service can be exercised without real patient data.

use super::{Column, Dataset, DEFAULT_LABEL_COLUMN, EDUCATION_COLUMN};
use crate::error::TrainingDataError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-column missing rates, roughly matching the Framingham extract
const MISSING_RATES: [(&str, f64); 7] = [
    (EDUCATION_COLUMN, 0.025),
    ("cigsPerDay", 0.007),
    ("BPMeds", 0.012),
    ("totChol", 0.012),
    ("BMI", 0.005),
    ("heartRate", 0.002),
    ("glucose", 0.09),
];

const CIGARETTE_COUNTS: [f64; 10] = [1.0, 3.0, 5.0, 10.0, 15.0, 20.0, 20.0, 20.0, 30.0, 40.0];

/// One generated patient before missing values are punched in
struct Patient {
    male: f64,
    age: f64,
    education: f64,
    current_smoker: f64,
    cigs_per_day: f64,
    bp_meds: f64,
    prevalent_stroke: f64,
    prevalent_hyp: f64,
    diabetes: f64,
    tot_chol: f64,
    sys_bp: f64,
    dia_bp: f64,
    bmi: f64,
    heart_rate: f64,
    glucose: f64,
    ten_year_chd: f64,
}

/// Deterministic generator of synthetic patient cohorts
pub struct SyntheticCohort {
    rng: StdRng,
    with_missing: bool,
}

impl SyntheticCohort {
    /// Create a generator; the same seed always yields the same cohort
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            with_missing: true,
        }
    }

    /// Disable missing-value injection
    pub fn without_missing(mut self) -> Self {
        self.with_missing = false;
        self
    }

    /// Generate `rows` patients
    pub fn generate(&mut self, rows: usize) -> Result<Dataset, TrainingDataError> {
        let patients: Vec<Patient> = (0..rows).map(|_| self.generate_patient()).collect();

        let mut columns = vec![
            column(&patients, "male", |p| p.male),
            column(&patients, "age", |p| p.age),
            column(&patients, EDUCATION_COLUMN, |p| p.education),
            column(&patients, "currentSmoker", |p| p.current_smoker),
            column(&patients, "cigsPerDay", |p| p.cigs_per_day),
            column(&patients, "BPMeds", |p| p.bp_meds),
            column(&patients, "prevalentStroke", |p| p.prevalent_stroke),
            column(&patients, "prevalentHyp", |p| p.prevalent_hyp),
            column(&patients, "diabetes", |p| p.diabetes),
            column(&patients, "totChol", |p| p.tot_chol),
            column(&patients, "sysBP", |p| p.sys_bp),
            column(&patients, "diaBP", |p| p.dia_bp),
            column(&patients, "BMI", |p| p.bmi),
            column(&patients, "heartRate", |p| p.heart_rate),
            column(&patients, "glucose", |p| p.glucose),
            column(&patients, DEFAULT_LABEL_COLUMN, |p| p.ten_year_chd),
        ];

        if self.with_missing {
            for target in &mut columns {
                let rate = MISSING_RATES
                    .iter()
                    .find(|(name, _)| *name == target.name)
                    .map(|(_, rate)| *rate);
                if let Some(rate) = rate {
                    for value in &mut target.values {
                        if self.rng.gen_bool(rate) {
                            *value = None;
                        }
                    }
                }
            }
        }

        Dataset::from_columns(columns)
    }

    fn generate_patient(&mut self) -> Patient {
        let rng = &mut self.rng;

        let male = flag(rng.gen_bool(0.44));
        let age = rng.gen_range(32..=70) as f64;
        let education = rng.gen_range(1..=4) as f64;
        let current_smoker = flag(rng.gen_bool(0.49));
        let cigs_per_day = if current_smoker == 1.0 {
            CIGARETTE_COUNTS[rng.gen_range(0..CIGARETTE_COUNTS.len())]
        } else {
            0.0
        };
        let prevalent_hyp = flag(rng.gen_bool(0.31));
        let bp_meds = flag(prevalent_hyp == 1.0 && rng.gen_bool(0.1));
        let prevalent_stroke = flag(rng.gen_bool(0.006));
        let diabetes = flag(rng.gen_bool(0.026));
        let tot_chol = rng.gen_range(150..=330) as f64;
        let sys_bp = round_to(
            100.0 + 0.6 * (age - 30.0) + rng.gen_range(0.0..45.0) + 22.0 * prevalent_hyp,
            0.5,
        );
        let dia_bp = round_to(0.45 * sys_bp + rng.gen_range(12.0..32.0), 0.5);
        let bmi = round_to(rng.gen_range(18.0..38.0), 0.01);
        let heart_rate = rng.gen_range(55..=100) as f64;
        let glucose = rng.gen_range(60..=115) as f64 + 85.0 * diabetes;

        let logit = -6.1
            + 0.065 * age
            + 0.45 * male
            + 0.02 * cigs_per_day
            + 0.018 * (sys_bp - 130.0)
            + 0.3 * prevalent_hyp
            + 0.8 * prevalent_stroke
            + 0.6 * diabetes
            + 0.004 * (tot_chol - 236.0)
            + 0.008 * (glucose - 82.0);
        let risk = 1.0 / (1.0 + (-logit).exp());
        let ten_year_chd = flag(rng.gen_bool(risk.clamp(0.0, 1.0)));

        Patient {
            male,
            age,
            education,
            current_smoker,
            cigs_per_day,
            bp_meds,
            prevalent_stroke,
            prevalent_hyp,
            diabetes,
            tot_chol,
            sys_bp,
            dia_bp,
            bmi,
            heart_rate,
            glucose,
            ten_year_chd,
        }
    }
}

fn column(patients: &[Patient], name: &str, get: fn(&Patient) -> f64) -> Column {
    Column::new(name, patients.iter().map(|p| Some(get(p))).collect())
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_contract::FeatureContract;

    #[test]
    fn test_same_seed_same_cohort() {
        let a = SyntheticCohort::new(7).generate(200).unwrap();
        let b = SyntheticCohort::new(7).generate(200).unwrap();
        let c = SyntheticCohort::new(8).generate(200).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cohort_layout() {
        let dataset = SyntheticCohort::new(1).generate(500).unwrap();

        assert_eq!(dataset.len(), 500);
        for name in FeatureContract::feature_names() {
            assert!(dataset.column(name).is_some(), "missing {name}");
        }
        assert!(dataset.column(EDUCATION_COLUMN).is_some());

        let labels = dataset.column(DEFAULT_LABEL_COLUMN).unwrap();
        let positives = labels.iter().filter(|v| **v == Some(1.0)).count();
        assert!(positives > 0 && positives < 500);
        assert!(labels.iter().all(|v| v.is_some()));
    }

    #[test]
    fn test_without_missing() {
        let dataset = SyntheticCohort::new(3).without_missing().generate(300).unwrap();
        let glucose = dataset.column("glucose").unwrap();
        assert!(glucose.iter().all(|v| v.is_some()));

        let with_missing = SyntheticCohort::new(3).generate(300).unwrap();
        let glucose = with_missing.column("glucose").unwrap();
        assert!(glucose.iter().any(|v| v.is_none()));
    }
}
