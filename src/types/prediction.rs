//! Prediction output returned to callers

use serde::{Deserialize, Serialize};

pub const HIGH_RISK_MESSAGE: &str = "High risk of coronary heart disease in the next 10 years";
pub const LOW_RISK_MESSAGE: &str = "Not high risk of coronary heart disease in the next 10 years";

/// Binarized ten-year CHD decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLabel {
    NotHighRisk,
    HighRisk,
}

impl RiskLabel {
    pub fn as_int(self) -> u8 {
        match self {
            RiskLabel::NotHighRisk => 0,
            RiskLabel::HighRisk => 1,
        }
    }

    /// Advisory message, a pure function of the label
    pub fn message(self) -> &'static str {
        match self {
            RiskLabel::HighRisk => HIGH_RISK_MESSAGE,
            RiskLabel::NotHighRisk => LOW_RISK_MESSAGE,
        }
    }
}

/// Result of scoring one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutput {
    /// 1 = high risk, 0 = not high risk
    pub prediction: u8,
    /// Positive-class probability rounded to 4 decimals
    pub probability: f64,
    pub message: String,
}

impl PredictionOutput {
    pub fn new(label: RiskLabel, probability: f64) -> Self {
        Self {
            prediction: label.as_int(),
            probability,
            message: label.message().to_string(),
        }
    }

    pub fn label(&self) -> RiskLabel {
        if self.prediction == 1 {
            RiskLabel::HighRisk
        } else {
            RiskLabel::NotHighRisk
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_follows_label() {
        let high = PredictionOutput::new(RiskLabel::HighRisk, 0.73);
        assert_eq!(high.prediction, 1);
        assert_eq!(high.message, HIGH_RISK_MESSAGE);

        let low = PredictionOutput::new(RiskLabel::NotHighRisk, 0.12);
        assert_eq!(low.prediction, 0);
        assert_eq!(low.message, LOW_RISK_MESSAGE);
        assert_eq!(low.label(), RiskLabel::NotHighRisk);
    }

    #[test]
    fn test_output_serialization() {
        let output = PredictionOutput::new(RiskLabel::HighRisk, 0.5123);
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["prediction"], 1);
        assert_eq!(json["probability"], 0.5123);
        assert_eq!(json["message"], HIGH_RISK_MESSAGE);
    }
}
