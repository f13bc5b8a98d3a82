//! Seeded train/test partitioning

use crate::error::{ExplorerError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 1;

// Absorbs float noise in `n * p` so that e.g. 10 * 0.3 yields 3 test rows.
const CEIL_EPSILON: f64 = 1e-9;

/// Train/test partition of a feature matrix and its labels
#[derive(Debug, Clone)]
pub struct Split {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl Split {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Number of test rows for `n` rows at proportion `p`
pub fn test_size(n: usize, test_proportion: f64) -> usize {
    ((n as f64 * test_proportion) - CEIL_EPSILON).ceil().max(0.0) as usize
}

/// Shuffle row indices with a seeded ChaCha8 generator and cut off
/// `ceil(n * test_proportion)` rows for the test partition.
///
/// Identical inputs always produce the identical partition.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_proportion: f64,
    seed: u64,
) -> Result<Split> {
    let n_samples = x.nrows();

    if n_samples != y.len() {
        return Err(ExplorerError::Split(format!(
            "features have {} rows but labels have {}",
            n_samples,
            y.len()
        )));
    }
    if n_samples < 2 {
        return Err(ExplorerError::Split(format!(
            "need at least 2 rows to split, got {}",
            n_samples
        )));
    }
    if !test_proportion.is_finite() || test_proportion <= 0.0 || test_proportion >= 1.0 {
        return Err(ExplorerError::Split(format!(
            "test proportion must lie in (0, 1), got {}",
            test_proportion
        )));
    }

    let n_test = test_size(n_samples, test_proportion);
    if n_test == 0 || n_test >= n_samples {
        return Err(ExplorerError::Split(format!(
            "test proportion {} leaves an empty partition for {} rows",
            test_proportion, n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();
    debug!(n_train = train_indices.len(), n_test, seed, "split rows");

    Ok(Split {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| (i % 2) as f64);
        (x, y)
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let (x, y) = data(20);
        let split = train_test_split(&x, &y, 0.25, DEFAULT_SEED).unwrap();

        assert_eq!(split.n_test(), 5);
        assert_eq!(split.n_train(), 15);

        let train: HashSet<_> = split.train_indices.iter().collect();
        let test: HashSet<_> = split.test_indices.iter().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 20);
    }

    #[test]
    fn test_rows_follow_indices() {
        let (x, y) = data(10);
        let split = train_test_split(&x, &y, 0.3, 7).unwrap();

        for (row, &idx) in split.test_indices.iter().enumerate() {
            assert_eq!(split.x_test.row(row), x.row(idx));
            assert_eq!(split.y_test[row], y[idx]);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = data(50);
        let a = train_test_split(&x, &y, 0.2, 1).unwrap();
        let b = train_test_split(&x, &y, 0.2, 1).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.test_indices, b.test_indices);
    }

    #[test]
    fn test_size_rounds_up() {
        assert_eq!(test_size(10, 0.3), 3);
        assert_eq!(test_size(10, 0.25), 3);
        assert_eq!(test_size(4, 0.2), 1);
        assert_eq!(test_size(100, 0.95), 95);
    }

    #[test]
    fn test_invalid_inputs() {
        let (x, y) = data(10);
        assert!(matches!(train_test_split(&x, &y, 0.0, 1), Err(ExplorerError::Split(_))));
        assert!(matches!(train_test_split(&x, &y, 1.0, 1), Err(ExplorerError::Split(_))));
        assert!(matches!(train_test_split(&x, &y, f64::NAN, 1), Err(ExplorerError::Split(_))));

        let (x1, y1) = data(1);
        assert!(matches!(train_test_split(&x1, &y1, 0.5, 1), Err(ExplorerError::Split(_))));

        let short = Array1::zeros(9);
        assert!(matches!(train_test_split(&x, &short, 0.2, 1), Err(ExplorerError::Split(_))));
    }

    #[test]
    fn test_empty_train_partition() {
        let (x, y) = data(2);
        assert!(matches!(train_test_split(&x, &y, 0.95, 1), Err(ExplorerError::Split(_))));
    }
}
