//! Linear classification models

use crate::error::{ExplorerError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weights and intercept of one binary decision function
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearMachine {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearMachine {
    fn decision(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }
}

/// L2-regularised logistic regression.
///
/// Minimises `mean(log_loss) + ||w||² / (2·C·n)` by gradient descent with a
/// fixed step of `1/L`, `L` being the smoothness bound of the objective. The
/// intercept is not penalised. More than two classes train one-vs-rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    classes: Vec<f64>,
    machines: Vec<LinearMachine>,
    /// Iterations used by the slowest machine
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            fit_intercept: true,
            classes: Vec::new(),
            machines: Vec::new(),
            n_iter: 0,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(ExplorerError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(ExplorerError::Training(format!("C must be positive, got {}", self.c)));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        if classes.len() < 2 {
            return Err(ExplorerError::Training(
                "logistic regression requires at least 2 distinct classes".to_string(),
            ));
        }

        let positives: Vec<f64> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        let fitted: Vec<(LinearMachine, usize)> = positives
            .iter()
            .map(|&positive| {
                let target = y.mapv(|v| if v == positive { 1.0 } else { 0.0 });
                self.gradient_descent(x, &target)
            })
            .collect();

        self.n_iter = fitted.iter().map(|(_, n)| *n).max().unwrap_or(0);
        self.machines = fitted.into_iter().map(|(m, _)| m).collect();
        self.classes = classes;

        Ok(self)
    }

    fn gradient_descent(&self, x: &Array2<f64>, y: &Array1<f64>) -> (LinearMachine, usize) {
        let n = x.nrows() as f64;
        let penalty = 1.0 / (self.c * n);

        let max_row_norm_sq = x
            .rows()
            .into_iter()
            .map(|row| row.dot(&row))
            .fold(0.0, f64::max);
        let intercept_term = if self.fit_intercept { 1.0 } else { 0.0 };
        let lipschitz = 0.25 * (max_row_norm_sq + intercept_term) + penalty;
        let lr = 1.0 / lipschitz;

        let mut weights: Array1<f64> = Array1::zeros(x.ncols());
        let mut bias = 0.0;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = x.t().dot(&errors) / n + penalty * &weights;
            let db = if self.fit_intercept {
                errors.mean().unwrap_or(0.0)
            } else {
                0.0
            };

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        let machine = LinearMachine {
            coefficients: weights,
            intercept: bias,
        };
        (machine, iterations)
    }

    /// Probability of the positive (second) class; binary models only
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self.machines.as_slice() {
            [] => Err(ExplorerError::ModelNotFitted),
            [machine] => Ok(Self::sigmoid(&machine.decision(x))),
            _ => Err(ExplorerError::Training(
                "predict_proba is only defined for two classes".to_string(),
            )),
        }
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.machines.is_empty() {
            return Err(ExplorerError::ModelNotFitted);
        }
        let n_features = self.machines[0].coefficients.len();
        if x.ncols() != n_features {
            return Err(ExplorerError::Shape {
                expected: format!("{} features", n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        if let [machine] = self.machines.as_slice() {
            let scores = machine.decision(x);
            return Ok(scores.mapv(|s| if s > 0.0 { self.classes[1] } else { self.classes[0] }));
        }

        let scores: Vec<Array1<f64>> = self.machines.iter().map(|m| m.decision(x)).collect();
        Ok((0..x.nrows())
            .map(|i| {
                let mut best = 0;
                for k in 1..scores.len() {
                    if scores[k][i] > scores[best][i] {
                        best = k;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    /// Coefficients of the binary decision function, if fitted on two classes
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        match self.machines.as_slice() {
            [machine] => Some(&machine.coefficients),
            _ => None,
        }
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Full parameter listing
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("C".into(), super::config::format_float(self.c));
        params.insert("fit_intercept".into(), self.fit_intercept.to_string());
        params.insert("max_iter".into(), self.max_iter.to_string());
        params.insert("multi_class".into(), "ovr".into());
        params.insert("penalty".into(), "l2".into());
        params.insert("solver".into(), "gradient descent".into());
        params.insert("tol".into(), format!("{}", self.tol));
        params
    }
}
