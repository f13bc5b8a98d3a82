//! K-Nearest Neighbors classifier
//!
//! Brute-force Euclidean search with a uniform majority vote.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use crate::error::{ExplorerError, Result};

/// KNN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// K-Nearest Neighbors Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
    classes: Vec<f64>,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
            classes: Vec::new(),
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig { n_neighbors: k })
    }

    pub fn n_neighbors(&self) -> usize {
        self.config.n_neighbors
    }

    /// Fit the classifier (stores training data)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ExplorerError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.config.n_neighbors == 0 {
            return Err(ExplorerError::Training("n_neighbors must be positive".to_string()));
        }
        if self.config.n_neighbors > x.nrows() {
            return Err(ExplorerError::Training(format!(
                "n_neighbors = {} exceeds the {} training samples",
                self.config.n_neighbors,
                x.nrows()
            )));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        self.classes = classes;

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    /// Predict class labels (parallelized over test samples)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(ExplorerError::ModelNotFitted),
        };
        if x.ncols() != x_train.ncols() {
            return Err(ExplorerError::Shape {
                expected: format!("{} features", x_train.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let k = self.config.n_neighbors;
        let classes = &self.classes;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k);
                vote_classify(&neighbors, classes)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Full parameter listing
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("algorithm".into(), "brute".into());
        params.insert("metric".into(), "euclidean".into());
        params.insert("n_neighbors".into(), self.config.n_neighbors.to_string());
        params.insert("weights".into(), "uniform".into());
        params
    }
}

/// Max-heap entry keyed on (distance, training index)
#[derive(PartialEq)]
struct Neighbor {
    dist: f64,
    index: usize,
    label: f64,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Find the k nearest training rows; equal distances prefer earlier rows
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<Neighbor> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (index, row) in x_train.rows().into_iter().enumerate() {
        let dist = point
            .iter()
            .zip(row.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        let candidate = Neighbor {
            dist,
            index,
            label: y_train[index],
        };

        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|top| candidate < *top) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_vec()
}

/// Uniform majority vote; ties go to the smallest class
fn vote_classify(neighbors: &[Neighbor], classes: &[f64]) -> f64 {
    let mut votes = vec![0usize; classes.len()];
    for n in neighbors {
        if let Some(idx) = classes.iter().position(|&c| c == n.label) {
            votes[idx] += 1;
        }
    }

    let mut best = 0;
    for (i, &v) in votes.iter().enumerate() {
        if v > votes[best] {
            best = i;
        }
    }
    classes.get(best).copied().unwrap_or(0.0)
}
