//! Held-out evaluation: accuracy and per-class precision/recall/F1

use std::fmt;

/// Precision, recall, F1 and support for one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Diagnostic report for a binary classifier on a test set
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Class 0 then class 1
    pub classes: [ClassMetrics; 2],
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub support: usize,
}

impl ClassificationReport {
    /// Build the report from true and predicted 0/1 labels.
    ///
    /// Undefined ratios (no predicted or no actual members) count as 0.
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let total = y_true.len().min(y_pred.len());
        let pairs = || y_true.iter().zip(y_pred);

        let correct = pairs().filter(|(t, p)| t == p).count();
        let accuracy = ratio(correct, total);

        let classes = [0u8, 1u8].map(|label| {
            let true_positive = pairs().filter(|(t, p)| **t == label && **p == label).count();
            let predicted = pairs().filter(|(_, p)| **p == label).count();
            let support = pairs().filter(|(t, _)| **t == label).count();

            let precision = ratio(true_positive, predicted);
            let recall = ratio(true_positive, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            ClassMetrics {
                label,
                precision,
                recall,
                f1,
                support,
            }
        });

        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / 2.0,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / 2.0,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / 2.0,
        };

        let weighted_avg = AveragedMetrics {
            precision: support_weighted(&classes, total, |c| c.precision),
            recall: support_weighted(&classes, total, |c| c.recall),
            f1: support_weighted(&classes, total, |c| c.f1),
        };

        Self {
            accuracy,
            classes,
            macro_avg,
            weighted_avg,
            support: total,
        }
    }
}

fn support_weighted(classes: &[ClassMetrics], total: usize, metric: fn(&ClassMetrics) -> f64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    classes
        .iter()
        .map(|c| metric(c) * c.support as f64)
        .sum::<f64>()
        / total as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
