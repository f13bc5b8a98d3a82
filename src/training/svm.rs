//! Support Vector Machine classifier
//!
//! Trains with a simplified SMO (Sequential Minimal Optimization) solver on a
//! precomputed kernel matrix; more than two classes use one-vs-rest.

use super::config::KernelChoice;
use crate::error::{ExplorerError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training fails instead of risking OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Resolved kernel function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Polynomial kernel: K(x, y) = (γ * x · y + r)^d
    Polynomial { degree: i32, gamma: f64, coef0: f64 },
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    RBF { gamma: f64 },
    /// Sigmoid kernel: K(x, y) = tanh(γ * x · y + r)
    Sigmoid { gamma: f64, coef0: f64 },
}

impl KernelType {
    fn apply(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            KernelType::Linear => a.dot(&b),
            KernelType::Polynomial { degree, gamma, coef0 } => {
                (gamma * a.dot(&b) + coef0).powi(*degree)
            }
            KernelType::RBF { gamma } => {
                let norm_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * norm_sq).exp()
            }
            KernelType::Sigmoid { gamma, coef0 } => (gamma * a.dot(&b) + coef0).tanh(),
        }
    }
}

/// Kernel coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// 1 / (n_features * Var(X)), resolved at fit time
    Scale,
    Value(f64),
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel family
    pub kernel: KernelChoice,
    pub gamma: Gamma,
    /// Polynomial degree
    pub degree: i32,
    /// Independent term of the poly and sigmoid kernels
    pub coef0: f64,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of sweeps over the training set
    pub max_iter: usize,
    /// Seed of the SMO partner selection
    pub random_state: u64,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelChoice::Rbf,
            gamma: Gamma::Scale,
            degree: 3,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: 1000,
            random_state: 42,
        }
    }
}

/// A single binary SVM; positive scores favour its class
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

impl BinarySVM {
    fn score(&self, kernel: &KernelType, sample: ArrayView1<f64>) -> f64 {
        let mut sum = self.bias;
        for (j, sv) in self.support_vectors.rows().into_iter().enumerate() {
            sum += self.alphas[j] * self.support_labels[j] * kernel.apply(sample, sv);
        }
        sum
    }
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    /// Kernel with gamma resolved against the training data
    kernel: Option<KernelType>,
    /// Distinct training labels, ascending
    classes: Vec<f64>,
    /// One machine for two classes (positive = second class), else one per class
    machines: Vec<BinarySVM>,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            kernel: None,
            classes: Vec::new(),
            machines: Vec::new(),
        }
    }

    /// Fit the classifier (binary directly, multi-class via one-vs-rest)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ExplorerError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(ExplorerError::Training(format!(
                "{} samples exceed the maximum of {} for the SVM kernel matrix",
                x.nrows(),
                MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        if classes.len() < 2 {
            return Err(ExplorerError::Training(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }

        let kernel = self.resolve_kernel(x);
        let kernel_matrix = compute_kernel_matrix(&kernel, x);

        let positives: Vec<f64> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        self.machines = positives
            .iter()
            .map(|&positive| {
                let y_binary = y.mapv(|v| if v == positive { 1.0 } else { -1.0 });
                self.smo_train(x, &y_binary, &kernel_matrix)
            })
            .collect();

        self.kernel = Some(kernel);
        self.classes = classes;
        Ok(())
    }

    fn resolve_kernel(&self, x: &Array2<f64>) -> KernelType {
        let gamma = match self.config.gamma {
            Gamma::Value(g) => g,
            Gamma::Scale => {
                let n = x.len();
                let var = if n == 0 {
                    0.0
                } else {
                    let mean = x.sum() / n as f64;
                    x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64
                };
                if var > 0.0 && x.ncols() > 0 {
                    1.0 / (x.ncols() as f64 * var)
                } else {
                    1.0
                }
            }
        };

        match self.config.kernel {
            KernelChoice::Linear => KernelType::Linear,
            KernelChoice::Poly => KernelType::Polynomial {
                degree: self.config.degree,
                gamma,
                coef0: self.config.coef0,
            },
            KernelChoice::Rbf => KernelType::RBF { gamma },
            KernelChoice::Sigmoid => KernelType::Sigmoid {
                gamma,
                coef0: self.config.coef0,
            },
        }
    }

    /// SMO training for labels in {-1, +1}
    fn smo_train(&self, x: &Array2<f64>, y: &Array1<f64>, k: &Array2<f64>) -> BinarySVM {
        let n = x.nrows();
        let c = self.config.c;
        let tol = self.config.tol;

        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);

        let decision = |alphas: &Array1<f64>, bias: f64, idx: usize| -> f64 {
            let mut sum = bias;
            for i in 0..n {
                if alphas[i] != 0.0 {
                    sum += alphas[i] * y[i] * k[[i, idx]];
                }
            }
            sum
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while n > 1 && passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = decision(&alphas, bias, i) - y[i];

                // Check KKT conditions
                if !((y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0)) {
                    continue;
                }

                let j = loop {
                    let j = rng.gen_range(0..n);
                    if j != i {
                        break j;
                    }
                };
                let e_j = decision(&alphas, bias, j) - y[j];

                let alpha_i_old = alphas[i];
                let alpha_j_old = alphas[j];

                let (l, h) = if y[i] != y[j] {
                    ((alpha_j_old - alpha_i_old).max(0.0), (c + alpha_j_old - alpha_i_old).min(c))
                } else {
                    ((alpha_i_old + alpha_j_old - c).max(0.0), (alpha_i_old + alpha_j_old).min(c))
                };
                if (l - h).abs() < 1e-12 {
                    continue;
                }

                let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                alphas[j] = (alpha_j_old - y[j] * (e_i - e_j) / eta).clamp(l, h);
                if (alphas[j] - alpha_j_old).abs() < 1e-5 * c.min(1.0) {
                    alphas[j] = alpha_j_old;
                    continue;
                }
                alphas[i] = alpha_i_old + y[i] * y[j] * (alpha_j_old - alphas[j]);

                let b1 = bias
                    - e_i
                    - y[i] * (alphas[i] - alpha_i_old) * k[[i, i]]
                    - y[j] * (alphas[j] - alpha_j_old) * k[[i, j]];
                let b2 = bias
                    - e_j
                    - y[i] * (alphas[i] - alpha_i_old) * k[[i, j]]
                    - y[j] * (alphas[j] - alpha_j_old) * k[[j, j]];

                bias = if alphas[i] > 0.0 && alphas[i] < c {
                    b1
                } else if alphas[j] > 0.0 && alphas[j] < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                num_changed += 1;
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-12)
            .map(|(i, _)| i)
            .collect();

        BinarySVM {
            support_vectors: x.select(Axis(0), &support_indices),
            alphas: alphas.select(Axis(0), &support_indices),
            support_labels: y.select(Axis(0), &support_indices),
            bias,
        }
    }

    /// Predict class labels (binary and multi-class)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let kernel = self.kernel.as_ref().ok_or(ExplorerError::ModelNotFitted)?;

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|sample| {
                if let [machine] = self.machines.as_slice() {
                    return if machine.score(kernel, sample) >= 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    };
                }

                let mut best_score = f64::NEG_INFINITY;
                let mut best_class = self.classes[0];
                for (idx, machine) in self.machines.iter().enumerate() {
                    let score = machine.score(kernel, sample);
                    if score > best_score {
                        best_score = score;
                        best_class = self.classes[idx];
                    }
                }
                best_class
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Number of support vectors per machine
    pub fn n_support(&self) -> Vec<usize> {
        self.machines.iter().map(|m| m.support_vectors.nrows()).collect()
    }

    /// Full parameter listing
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("C".into(), super::config::format_float(self.config.c));
        params.insert("coef0".into(), format!("{}", self.config.coef0));
        params.insert("degree".into(), self.config.degree.to_string());
        params.insert(
            "gamma".into(),
            match self.config.gamma {
                Gamma::Scale => "scale".to_string(),
                Gamma::Value(g) => format!("{}", g),
            },
        );
        params.insert("kernel".into(), self.config.kernel.as_str().into());
        params.insert("max_iter".into(), self.config.max_iter.to_string());
        params.insert("random_state".into(), self.config.random_state.to_string());
        params.insert("tol".into(), format!("{}", self.config.tol));
        params
    }
}

/// Gram matrix; upper-triangle rows are computed in parallel
fn compute_kernel_matrix(kernel: &KernelType, x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| (i..n).map(|j| kernel.apply(x.row(i), x.row(j))).collect())
        .collect();

    let mut k = Array2::zeros((n, n));
    for (i, row_vals) in rows.into_iter().enumerate() {
        for (offset, val) in row_vals.into_iter().enumerate() {
            let j = i + offset;
            k[[i, j]] = val;
            k[[j, i]] = val;
        }
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [3.0, 3.0],
            [3.0, 4.0],
            [4.0, 3.0]
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_linear_separable() {
        let (x, y) = blobs();
        let mut svm = SVMClassifier::new(SVMConfig {
            c: 10.0,
            kernel: KernelChoice::Linear,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        let preds = svm.predict(&array![[-1.0, -1.0], [5.0, 5.0]]).unwrap();
        assert_eq!(preds, array![0.0, 1.0]);
    }

    #[test]
    fn test_rbf_separable() {
        let (x, y) = blobs();
        let mut svm = SVMClassifier::new(SVMConfig {
            c: 10.0,
            kernel: KernelChoice::Rbf,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        let preds = svm.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_multiclass_one_vs_rest() {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [5.0, 0.0],
            [5.2, 0.1],
            [0.0, 5.0],
            [0.1, 5.2]
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut svm = SVMClassifier::new(SVMConfig {
            c: 10.0,
            kernel: KernelChoice::Rbf,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.n_support().len(), 3);
        assert_eq!(svm.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![1.0, 1.0];
        let mut svm = SVMClassifier::new(SVMConfig::default());
        assert!(matches!(svm.fit(&x, &y), Err(ExplorerError::Training(_))));
    }

    #[test]
    fn test_deterministic() {
        let (x, y) = blobs();
        let fit = || {
            let mut svm = SVMClassifier::new(SVMConfig {
                kernel: KernelChoice::Sigmoid,
                ..Default::default()
            });
            svm.fit(&x, &y).unwrap();
            svm.predict(&x).unwrap()
        };
        assert_eq!(fit(), fit());
    }
}
