//! Naive Bayes classifiers
//!
//! Implements Gaussian Naive Bayes for continuous features.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::error::{ExplorerError, Result};

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Mean of each feature, one row per class
    means: Vec<Vec<f64>>,
    /// Smoothed variance of each feature, one row per class
    variances: Vec<Vec<f64>>,
    /// Prior probability of each class
    priors: Vec<f64>,
    /// Distinct training labels, ascending
    classes: Vec<f64>,
    /// Portion of the largest feature variance added to every variance
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: Vec::new(),
            variances: Vec::new(),
            priors: Vec::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    /// Set variance smoothing parameter
    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    /// Fit the classifier
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ExplorerError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ExplorerError::Training("no training samples".to_string()));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();

        let epsilon = match x.var_axis(Axis(0), 0.0).iter().cloned().fold(0.0, f64::max) {
            max_var if max_var > 0.0 => self.var_smoothing * max_var,
            _ => self.var_smoothing,
        };

        self.means.clear();
        self.variances.clear();
        self.priors.clear();

        for &class in &classes {
            // Single-pass Welford's algorithm for mean and variance
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for (row, _) in x.rows().into_iter().zip(y.iter()).filter(|(_, yi)| **yi == class) {
                count += 1;
                for (j, &val) in row.iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / count as f64;
                    let delta2 = val - feature_means[j];
                    feature_m2[j] += delta * delta2;
                }
            }

            let feature_vars: Vec<f64> = feature_m2
                .iter()
                .map(|&m2| m2 / count as f64 + epsilon)
                .collect();

            self.priors.push(count as f64 / n_samples as f64);
            self.means.push(feature_means);
            self.variances.push(feature_vars);
        }

        self.classes = classes;
        Ok(())
    }

    /// Predict class labels; ties go to the smallest class
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;

        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (j, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = j;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    /// Predict normalised log probabilities, one column per class
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(ExplorerError::ModelNotFitted);
        }
        let n_features = self.means[0].len();
        if x.ncols() != n_features {
            return Err(ExplorerError::Shape {
                expected: format!("{} features", n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_samples = x.nrows();
        let n_classes = self.classes.len();
        let mut log_probs = Array2::zeros((n_samples, n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            for j in 0..n_classes {
                log_probs[[i, j]] = self.priors[j].ln() + self.log_likelihood(row, j);
            }
        }

        // Normalize (log-sum-exp trick)
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }

        Ok(log_probs)
    }

    fn log_likelihood(&self, x: ArrayView1<f64>, class_idx: usize) -> f64 {
        let means = &self.means[class_idx];
        let vars = &self.variances[class_idx];

        x.iter()
            .zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| {
                // Log of Gaussian PDF
                -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
            })
            .sum()
    }

    /// Class priors in class order
    pub fn class_priors(&self) -> &[f64] {
        &self.priors
    }

    /// Full parameter listing
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("priors".into(), "None".into());
        params.insert("var_smoothing".into(), format!("{:e}", self.var_smoothing));
        params
    }
}
