//! Binary logistic regression.
//!
//! L2-regularised (inverse strength `C`, intercept not penalised) and fitted
//! with damped Newton iterations on the mean log-loss:
//!
//! `L(w, b) = mean(softplus(z) - y * z) + ||w||^2 / (2 * C * n)`, `z = x.w + b`.
//!
//! Everything is deterministic; identical inputs give bit-identical
//! parameters.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted classifier parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// One weight per feature, in feature order
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticParams {
    pub fn zeros(features: usize) -> Self {
        Self {
            coefficients: vec![0.0; features],
            intercept: 0.0,
        }
    }

    /// Log-odds of the positive class
    pub fn decision_function(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision_function(features))
    }
}

/// Logistic function; exactly 0.5 at zero
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Outcome of a fit
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Newton steps taken
    pub iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
    /// Largest absolute gradient component at the returned parameters
    pub gradient_norm: f64,
}

/// Logistic regression trainer
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    inverse_regularization: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            inverse_regularization: 1.0,
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

impl LogisticRegression {
    /// Create a trainer with inverse regularisation strength `c`
    pub fn new(c: f64) -> Self {
        Self {
            inverse_regularization: c,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Finite objective with every gradient component inside the tolerance
    fn settled(&self, loss: f64, gradient: &[f64]) -> bool {
        loss.is_finite() && max_abs(gradient) <= self.tolerance
    }

    /// Fit on rows `x` with 0/1 labels `y`.
    ///
    /// Stops when the largest gradient component drops below the tolerance
    /// or the iteration budget is spent; the best parameters reached are
    /// returned either way.
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> (LogisticParams, FitReport) {
        let features = x.first().map(Vec::len).unwrap_or(0);
        let mut params = LogisticParams::zeros(features);
        let problem = Problem {
            x,
            y,
            lambda: if x.is_empty() {
                0.0
            } else {
                1.0 / (self.inverse_regularization * x.len() as f64)
            },
        };

        let mut loss = problem.loss(&params);
        let mut iterations = 0;
        let mut gradient = problem.gradient(&params);
        let mut converged = self.settled(loss, &gradient);

        while !converged && loss.is_finite() && iterations < self.max_iterations {
            let hessian = problem.hessian(&params);
            let Some(direction) = solve(hessian, gradient.clone()) else {
                debug!(iteration = iterations, "Singular Hessian, stopping");
                break;
            };

            let slope: f64 = gradient.iter().zip(&direction).map(|(g, d)| g * d).sum();
            let mut step = 1.0;
            let mut accepted = None;
            while step > 1e-12 {
                let candidate = problem.step(&params, &direction, step);
                let candidate_loss = problem.loss(&candidate);
                if candidate_loss <= loss - 1e-4 * step * slope {
                    accepted = Some((candidate, candidate_loss));
                    break;
                }
                step *= 0.5;
            }

            let Some((next, next_loss)) = accepted else {
                debug!(iteration = iterations, "Line search made no progress, stopping");
                break;
            };

            params = next;
            loss = next_loss;
            iterations += 1;
            gradient = problem.gradient(&params);
            converged = self.settled(loss, &gradient);

            debug!(
                iteration = iterations,
                loss = loss,
                step = step,
                gradient = max_abs(&gradient),
                "Newton step"
            );
        }

        if !loss.is_finite() {
            debug!(iterations = iterations, "Objective is not finite, stopping");
        }

        let report = FitReport {
            iterations,
            converged,
            final_loss: loss,
            gradient_norm: max_abs(&gradient),
        };
        (params, report)
    }
}

/// Objective over a fixed training set
struct Problem<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    lambda: f64,
}

impl Problem<'_> {
    fn n(&self) -> f64 {
        self.x.len().max(1) as f64
    }

    fn loss(&self, params: &LogisticParams) -> f64 {
        let data: f64 = self
            .x
            .iter()
            .zip(self.y)
            .map(|(row, &label)| {
                let z = params.decision_function(row);
                softplus(z) - label * z
            })
            .sum();
        let penalty: f64 = params.coefficients.iter().map(|w| w * w).sum();
        data / self.n() + 0.5 * self.lambda * penalty
    }

    /// Gradient with the intercept component last
    fn gradient(&self, params: &LogisticParams) -> Vec<f64> {
        let d = params.coefficients.len();
        let mut gradient = vec![0.0; d + 1];

        for (row, &label) in self.x.iter().zip(self.y) {
            let residual = params.predict_proba(row) - label;
            for (g, x) in gradient.iter_mut().zip(row) {
                *g += residual * x;
            }
            gradient[d] += residual;
        }

        let n = self.n();
        for g in &mut gradient {
            *g /= n;
        }
        for (g, w) in gradient.iter_mut().zip(&params.coefficients) {
            *g += self.lambda * w;
        }
        gradient
    }

    fn hessian(&self, params: &LogisticParams) -> Vec<Vec<f64>> {
        let d = params.coefficients.len();
        let mut hessian = vec![vec![0.0; d + 1]; d + 1];
        let mut augmented = vec![1.0; d + 1];

        for row in self.x {
            augmented[..d].copy_from_slice(row);
            let p = params.predict_proba(row);
            let weight = p * (1.0 - p);
            for i in 0..=d {
                let wi = weight * augmented[i];
                for j in i..=d {
                    hessian[i][j] += wi * augmented[j];
                }
            }
        }

        let n = self.n();
        for i in 0..=d {
            for j in i..=d {
                hessian[i][j] /= n;
                hessian[j][i] = hessian[i][j];
            }
            if i < d {
                hessian[i][i] += self.lambda;
            }
        }
        hessian
    }

    fn step(&self, params: &LogisticParams, direction: &[f64], step: f64) -> LogisticParams {
        let d = params.coefficients.len();
        LogisticParams {
            coefficients: params
                .coefficients
                .iter()
                .zip(direction)
                .map(|(w, dw)| w - step * dw)
                .collect(),
            intercept: params.intercept - step * direction[d],
        }
    }
}

/// Largest absolute component; NaN if any component is NaN
fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| {
        if v.is_nan() || acc.is_nan() {
            f64::NAN
        } else {
            acc.max(v.abs())
        }
    })
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_softplus_is_stable() {
        assert!((softplus(0.0) - 2f64.ln()).abs() < 1e-15);
        assert!((softplus(800.0) - 800.0).abs() < 1e-9);
        assert!(softplus(-800.0) >= 0.0);
    }

    #[test]
    fn test_solve() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);

        assert!(solve(vec![vec![0.0, 0.0], vec![0.0, 0.0]], vec![1.0, 1.0]).is_none());
    }

    #[test]
    fn test_balanced_data_converges_immediately() {
        let x = vec![vec![-1.0], vec![-1.0], vec![1.0], vec![1.0]];
        let y = vec![0.0, 1.0, 0.0, 1.0];

        let (params, report) = LogisticRegression::default().fit(&x, &y);
        assert!(report.converged);
        assert_eq!(report.iterations, 0);
        assert_eq!(params, LogisticParams::zeros(1));
    }

    #[test]
    fn test_intercept_matches_base_rate() {
        let x = vec![vec![0.0]; 4];
        let y = vec![1.0, 0.0, 0.0, 0.0];

        let (params, report) = LogisticRegression::default()
            .with_tolerance(1e-12)
            .fit(&x, &y);
        assert!(report.converged);
        assert!((params.intercept - (1.0f64 / 3.0).ln()).abs() < 1e-9);
        assert_eq!(params.coefficients, vec![0.0]);
    }

    #[test]
    fn test_learns_positive_association() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..40)
            .map(|i| if i >= 20 || i % 7 == 0 { 1.0 } else { 0.0 })
            .collect();

        let (params, report) = LogisticRegression::default().fit(&x, &y);
        assert!(report.converged);
        assert!(params.coefficients[0] > 0.0);
        assert!(params.predict_proba(&[35.0]) > params.predict_proba(&[5.0]));
    }

    #[test]
    fn test_iteration_budget_is_respected() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 5) as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i % 3 == 0 || i > 30 { 1.0 } else { 0.0 }).collect();

        let (_, report) = LogisticRegression::default()
            .with_max_iterations(1)
            .fit(&x, &y);
        assert_eq!(report.iterations, 1);
        assert!(!report.converged);
    }

    #[test]
    fn test_max_abs_propagates_nan() {
        assert_eq!(max_abs(&[0.5, -2.0, 1.0]), 2.0);
        assert!(max_abs(&[0.0, f64::NAN, 1.0]).is_nan());
        assert!(max_abs(&[f64::NAN]).is_nan());
        assert_eq!(max_abs(&[]), 0.0);
    }

    #[test]
    fn test_non_finite_input_never_converges() {
        let mut x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        x[0][0] = f64::INFINITY;
        let y: Vec<f64> = (0..20).map(|i| if i >= 10 { 1.0 } else { 0.0 }).collect();

        let (_, report) = LogisticRegression::default().fit(&x, &y);
        assert!(!report.converged);
        assert_eq!(report.iterations, 0);
        assert!(!report.final_loss.is_finite());
        assert!(report.gradient_norm.is_nan());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64 * 0.5, (i % 4) as f64]).collect();
        let y: Vec<f64> = (0..60).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();

        let model = LogisticRegression::default();
        assert_eq!(model.fit(&x, &y).0, model.fit(&x, &y).0);
    }
}
