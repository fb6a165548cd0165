//! Feature contract for CHD risk model inputs.
//!
//! The single source of truth for feature identity, order and basic
//! validity. Training builds its feature matrix from [`FEATURES`] and
//! inference projects validated records through [`FeatureContract::order`],
//! so the column order the classifier was fitted on cannot drift from the
//! order it is scored with.

use crate::error::{ColumnOrderMismatch, FieldViolation, ValidationError, Violation};
use crate::types::record::{PatientRecord, ValidatedRecord};
use serde_json::{Map, Value};

/// Number of model features
pub const FEATURE_COUNT: usize = 14;

/// Semantic type of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Flag restricted to {0, 1}
    Binary,
    /// Any finite real number
    Continuous,
}

/// Name and type of one contract column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

const fn binary(name: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        kind: FeatureKind::Binary,
    }
}

const fn continuous(name: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        kind: FeatureKind::Continuous,
    }
}

/// Contract columns in the order the classifier consumes them.
pub const FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    binary("male"),
    continuous("age"),
    binary("currentSmoker"),
    continuous("cigsPerDay"),
    binary("BPMeds"),
    binary("prevalentStroke"),
    binary("prevalentHyp"),
    binary("diabetes"),
    continuous("totChol"),
    continuous("sysBP"),
    continuous("diaBP"),
    continuous("BMI"),
    continuous("heartRate"),
    continuous("glucose"),
];

impl FeatureSpec {
    fn check(&self, value: &Value) -> Result<f64, Violation> {
        let number = match value {
            Value::Number(n) => n.as_f64().ok_or(Violation::NonFinite)?,
            Value::Null => return Err(Violation::Null),
            Value::Bool(_) => return Err(Violation::WrongType { found: "boolean" }),
            Value::String(_) => return Err(Violation::WrongType { found: "string" }),
            Value::Array(_) => return Err(Violation::WrongType { found: "array" }),
            Value::Object(_) => return Err(Violation::WrongType { found: "object" }),
        };
        self.accept(number)
    }

    /// Check a numeric value against this feature's kind.
    ///
    /// Shared by request validation and training so both sides agree on
    /// what a valid cell is.
    pub fn accept(&self, number: f64) -> Result<f64, Violation> {
        if !number.is_finite() {
            return Err(Violation::NonFinite);
        }
        match self.kind {
            FeatureKind::Binary if number == 0.0 || number == 1.0 => Ok(number),
            FeatureKind::Binary => Err(Violation::NotBinary {
                value: number.to_string(),
            }),
            FeatureKind::Continuous => Ok(number),
        }
    }
}

/// Validation and projection against [`FEATURES`]
pub struct FeatureContract;

impl FeatureContract {
    /// Get the number of features
    pub fn feature_count() -> usize {
        FEATURE_COUNT
    }

    /// Feature names in contract order
    pub fn feature_names() -> Vec<&'static str> {
        FEATURES.iter().map(|f| f.name).collect()
    }

    /// Contract position of a feature
    pub fn position(name: &str) -> Option<usize> {
        FEATURES.iter().position(|f| f.name == name)
    }

    /// Whether `columns` is exactly the contract order
    pub fn matches<S: AsRef<str>>(columns: &[S]) -> bool {
        columns.len() == FEATURE_COUNT
            && columns
                .iter()
                .zip(FEATURES.iter())
                .all(|(column, spec)| column.as_ref() == spec.name)
    }

    /// Validate a JSON object against the contract.
    ///
    /// Every violation is collected, including keys the contract does not
    /// know about.
    pub fn validate(input: &Map<String, Value>) -> Result<ValidatedRecord, ValidationError> {
        let outcomes = FEATURES.map(|spec| match input.get(spec.name) {
            Some(value) => spec.check(value),
            None => Err(Violation::Missing),
        });

        let unknown = input
            .keys()
            .filter(|key| Self::position(key).is_none())
            .map(|key| FieldViolation {
                field: key.clone(),
                reason: Violation::UnknownField,
            })
            .collect();

        assemble(outcomes, unknown)
    }

    /// Validate a typed record
    pub fn validate_record(record: &PatientRecord) -> Result<ValidatedRecord, ValidationError> {
        let values = record.raw_values();
        let outcomes = std::array::from_fn(|i| FEATURES[i].accept(values[i]));
        assemble(outcomes, Vec::new())
    }

    /// Project a validated record into contract order
    pub fn order(record: &ValidatedRecord) -> [f64; FEATURE_COUNT] {
        *record.contract_values()
    }

    /// Project a validated record into a stored column order.
    ///
    /// The stored order must be the contract order; anything else is a
    /// mismatch rather than a silent reordering.
    pub fn project<S: AsRef<str>>(
        record: &ValidatedRecord,
        columns: &[S],
    ) -> Result<Vec<f64>, ColumnOrderMismatch> {
        if !Self::matches(columns) {
            return Err(ColumnOrderMismatch {
                expected: FEATURE_COUNT,
                found: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            });
        }
        Ok(Self::order(record).to_vec())
    }
}

fn assemble(
    outcomes: [Result<f64, Violation>; FEATURE_COUNT],
    mut extra: Vec<FieldViolation>,
) -> Result<ValidatedRecord, ValidationError> {
    let mut values = [0.0; FEATURE_COUNT];
    let mut violations = Vec::new();

    for ((slot, spec), outcome) in values.iter_mut().zip(FEATURES.iter()).zip(outcomes) {
        match outcome {
            Ok(number) => *slot = number,
            Err(reason) => violations.push(FieldViolation {
                field: spec.name.to_string(),
                reason,
            }),
        }
    }
    violations.append(&mut extra);

    if violations.is_empty() {
        Ok(ValidatedRecord::from_contract_order(values))
    } else {
        Err(ValidationError { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Map<String, Value> {
        match json!({
            "male": 1, "age": 55, "currentSmoker": 1, "cigsPerDay": 20,
            "BPMeds": 0, "prevalentStroke": 0, "prevalentHyp": 1, "diabetes": 0,
            "totChol": 240, "sysBP": 145, "diaBP": 90, "BMI": 29,
            "heartRate": 80, "glucose": 100
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_feature_count() {
        assert_eq!(FeatureContract::feature_count(), 14);
        assert_eq!(FeatureContract::feature_names().len(), 14);
        assert_eq!(FeatureContract::feature_names()[0], "male");
        assert_eq!(FeatureContract::feature_names()[13], "glucose");
    }

    #[test]
    fn test_validate_and_order() {
        let record = FeatureContract::validate(&sample()).unwrap();
        let ordered = FeatureContract::order(&record);

        assert_eq!(ordered[0], 1.0); // male
        assert_eq!(ordered[1], 55.0); // age
        assert_eq!(ordered[8], 240.0); // totChol
        assert_eq!(ordered[13], 100.0); // glucose
        assert_eq!(record.get("sysBP"), Some(145.0));
        assert_eq!(record.get("education"), None);
    }

    #[test]
    fn test_missing_glucose_is_named() {
        let mut input = sample();
        input.remove("glucose");

        let err = FeatureContract::validate(&input).unwrap_err();
        assert_eq!(err.fields(), vec!["glucose"]);
        assert_eq!(err.violations[0].reason, Violation::Missing);
    }

    #[test]
    fn test_binary_flag_out_of_range() {
        let mut input = sample();
        input.insert("diabetes".to_string(), json!(2));

        let err = FeatureContract::validate(&input).unwrap_err();
        assert!(err.mentions("diabetes"));
        assert!(matches!(err.violations[0].reason, Violation::NotBinary { .. }));
    }

    #[test]
    fn test_binary_flag_accepts_integral_float() {
        let mut input = sample();
        input.insert("male".to_string(), json!(1.0));
        assert!(FeatureContract::validate(&input).is_ok());

        input.insert("male".to_string(), json!(0.5));
        assert!(FeatureContract::validate(&input).is_err());
    }

    #[test]
    fn test_collects_all_violations() {
        let mut input = sample();
        input.insert("age".to_string(), json!("fifty"));
        input.insert("BMI".to_string(), Value::Null);
        input.insert("education".to_string(), json!(2));
        input.remove("sysBP");

        let err = FeatureContract::validate(&input).unwrap_err();
        assert_eq!(err.violations.len(), 4);
        assert!(err.mentions("age"));
        assert!(err.mentions("BMI"));
        assert!(err.mentions("sysBP"));
        assert!(err.mentions("education"));
    }

    #[test]
    fn test_validate_typed_record_rejects_nan() {
        let mut record: PatientRecord = serde_json::from_value(Value::Object(sample())).unwrap();
        assert!(FeatureContract::validate_record(&record).is_ok());

        record.glucose = f64::NAN;
        let err = FeatureContract::validate_record(&record).unwrap_err();
        assert_eq!(err.violations[0].field, "glucose");
        assert_eq!(err.violations[0].reason, Violation::NonFinite);
    }

    #[test]
    fn test_validate_typed_record_reports_each_field() {
        let mut record: PatientRecord = serde_json::from_value(Value::Object(sample())).unwrap();
        record.male = 2;
        record.sys_bp = f64::INFINITY;

        let err = FeatureContract::validate_record(&record).unwrap_err();
        assert_eq!(err.fields(), vec!["male", "sysBP"]);
        assert_eq!(
            err.violations[0].reason,
            Violation::NotBinary {
                value: "2".to_string()
            }
        );
        assert_eq!(err.violations[1].reason, Violation::NonFinite);

        let validated = FeatureContract::validate_record(&PatientRecord {
            male: 1,
            sys_bp: 145.0,
            ..record
        })
        .unwrap();
        assert_eq!(FeatureContract::order(&validated), record_order(&sample()));
    }

    #[test]
    fn test_accept_by_kind() {
        let male = &FEATURES[0];
        let age = &FEATURES[1];
        assert_eq!(male.accept(1.0), Ok(1.0));
        assert!(matches!(male.accept(0.5), Err(Violation::NotBinary { .. })));
        assert_eq!(male.accept(f64::NAN), Err(Violation::NonFinite));
        assert_eq!(age.accept(-3.5), Ok(-3.5));
        assert_eq!(age.accept(f64::NEG_INFINITY), Err(Violation::NonFinite));
    }

    fn record_order(input: &Map<String, Value>) -> [f64; FEATURE_COUNT] {
        FeatureContract::order(&FeatureContract::validate(input).unwrap())
    }

    #[test]
    fn test_project_rejects_reordered_columns() {
        let record = FeatureContract::validate(&sample()).unwrap();
        let mut columns = FeatureContract::feature_names();

        assert_eq!(
            FeatureContract::project(&record, &columns).unwrap(),
            FeatureContract::order(&record).to_vec()
        );

        columns.swap(9, 10);
        assert!(FeatureContract::project(&record, &columns).is_err());
        assert!(!FeatureContract::matches(&columns[..13]));
    }
}
