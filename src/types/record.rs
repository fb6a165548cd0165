//! Patient input records

use crate::feature_contract::{FeatureContract, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// One patient's clinical and demographic features, as sent by clients.
///
/// Field names serialize to the contract names (`currentSmoker`, `sysBP`,
/// ...). Binary flags are plain integers here; the feature contract decides
/// whether they are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Sex (1 = male, 0 = female)
    pub male: i64,
    /// Age in years
    pub age: f64,
    pub current_smoker: i64,
    pub cigs_per_day: f64,
    /// On blood pressure medication
    #[serde(rename = "BPMeds")]
    pub bp_meds: i64,
    pub prevalent_stroke: i64,
    /// Prevalent hypertension
    pub prevalent_hyp: i64,
    pub diabetes: i64,
    /// Total cholesterol (mg/dL)
    pub tot_chol: f64,
    /// Systolic blood pressure (mmHg)
    #[serde(rename = "sysBP")]
    pub sys_bp: f64,
    /// Diastolic blood pressure (mmHg)
    #[serde(rename = "diaBP")]
    pub dia_bp: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    /// Resting heart rate (bpm)
    pub heart_rate: f64,
    /// Fasting glucose (mg/dL)
    pub glucose: f64,
}

impl PatientRecord {
    /// Raw field values in contract order, before validation
    pub fn raw_values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.male as f64,
            self.age,
            self.current_smoker as f64,
            self.cigs_per_day,
            self.bp_meds as f64,
            self.prevalent_stroke as f64,
            self.prevalent_hyp as f64,
            self.diabetes as f64,
            self.tot_chol,
            self.sys_bp,
            self.dia_bp,
            self.bmi,
            self.heart_rate,
            self.glucose,
        ]
    }
}

/// A record that passed the feature contract.
///
/// Only the contract can construct one; values are held in contract order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    values: [f64; FEATURE_COUNT],
}

impl ValidatedRecord {
    pub(crate) fn from_contract_order(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub(crate) fn contract_values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Look up a feature value by contract name
    pub fn get(&self, name: &str) -> Option<f64> {
        FeatureContract::position(name).map(|i| self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_record_uses_contract_names() {
        let json = serde_json::json!({
            "male": 1, "age": 55.0, "currentSmoker": 1, "cigsPerDay": 20.0,
            "BPMeds": 0, "prevalentStroke": 0, "prevalentHyp": 1, "diabetes": 0,
            "totChol": 240.0, "sysBP": 145.0, "diaBP": 90.0, "BMI": 29.0,
            "heartRate": 80.0, "glucose": 100.0
        });

        let record: PatientRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(record.sys_bp, 145.0);
        assert_eq!(record.bp_meds, 0);
        assert_eq!(serde_json::to_value(&record).unwrap(), json);
    }
}
