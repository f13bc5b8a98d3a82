//! Model training module
//!
//! Provides the five classifier families offered by the dashboard:
//! - Decision trees (CART)
//! - Gaussian Naive Bayes
//! - K-Nearest Neighbours
//! - Logistic regression
//! - Support Vector Machines
//!
//! together with the model registry, the seeded train/test split and the
//! classification report.

mod config;
mod engine;
pub mod decision_tree;
pub mod knn;
pub mod linear_models;
pub mod metrics;
pub mod naive_bayes;
pub mod split;
pub mod svm;

pub use config::{
    format_float, logspace, Criterion, KernelChoice, ModelKind, ModelParams, ParamControl,
    ParamMap, ParamSpec, ParamValue,
};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{train_and_evaluate, Estimator, Evaluation};
pub use knn::{KNNClassifier, KNNConfig};
pub use linear_models::LogisticRegression;
pub use metrics::{accuracy_score, ClassMetrics, ClassificationReport};
pub use naive_bayes::GaussianNaiveBayes;
pub use split::{test_size, train_test_split, Split, DEFAULT_SEED};
pub use svm::{Gamma, KernelType, SVMClassifier, SVMConfig};
