//! Training engine: builds an estimator from validated parameters, fits it on
//! one split and evaluates it on the held-out rows.

use super::config::{ModelKind, ModelParams, ParamMap};
use super::decision_tree::DecisionTree;
use super::knn::KNNClassifier;
use super::linear_models::LogisticRegression;
use super::metrics::{accuracy_score, ClassificationReport};
use super::naive_bayes::GaussianNaiveBayes;
use super::split::Split;
use super::svm::{SVMClassifier, SVMConfig};
use crate::error::{ExplorerError, Result};
use crate::preprocessing::Labels;
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// A model of one of the five families, bound to its parameters
#[derive(Debug, Clone)]
pub enum Estimator {
    DecisionTree(DecisionTree),
    GaussianNaiveBayes(GaussianNaiveBayes),
    KNearestNeighbours(KNNClassifier),
    LogisticRegression(LogisticRegression),
    SupportVectorMachine(SVMClassifier),
}

impl Estimator {
    /// Construct an unfitted estimator
    pub fn from_params(params: &ModelParams) -> Self {
        match params {
            ModelParams::DecisionTree { max_depth, criterion } => Estimator::DecisionTree(
                DecisionTree::new()
                    .with_max_depth(*max_depth)
                    .with_criterion(*criterion),
            ),
            ModelParams::GaussianNaiveBayes => {
                Estimator::GaussianNaiveBayes(GaussianNaiveBayes::new())
            }
            ModelParams::KNearestNeighbours { n_neighbors } => {
                Estimator::KNearestNeighbours(KNNClassifier::with_k(*n_neighbors))
            }
            ModelParams::LogisticRegression { c } => {
                Estimator::LogisticRegression(LogisticRegression::new().with_c(*c))
            }
            ModelParams::SupportVectorMachine { c, kernel } => {
                Estimator::SupportVectorMachine(SVMClassifier::new(SVMConfig {
                    c: *c,
                    kernel: *kernel,
                    ..SVMConfig::default()
                }))
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::DecisionTree(_) => ModelKind::DecisionTree,
            Estimator::GaussianNaiveBayes(_) => ModelKind::GaussianNaiveBayes,
            Estimator::KNearestNeighbours(_) => ModelKind::KNearestNeighbours,
            Estimator::LogisticRegression(_) => ModelKind::LogisticRegression,
            Estimator::SupportVectorMachine(_) => ModelKind::SupportVectorMachine,
        }
    }

    /// Class name used in the parameter dump
    pub fn estimator_name(&self) -> &'static str {
        match self {
            Estimator::DecisionTree(_) => "DecisionTreeClassifier",
            Estimator::GaussianNaiveBayes(_) => "GaussianNB",
            Estimator::KNearestNeighbours(_) => "KNeighborsClassifier",
            Estimator::LogisticRegression(_) => "LogisticRegression",
            Estimator::SupportVectorMachine(_) => "SVC",
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::DecisionTree(m) => m.fit(x, y).map(|_| ()),
            Estimator::GaussianNaiveBayes(m) => m.fit(x, y),
            Estimator::KNearestNeighbours(m) => m.fit(x, y),
            Estimator::LogisticRegression(m) => m.fit(x, y).map(|_| ()),
            Estimator::SupportVectorMachine(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::DecisionTree(m) => m.predict(x),
            Estimator::GaussianNaiveBayes(m) => m.predict(x),
            Estimator::KNearestNeighbours(m) => m.predict(x),
            Estimator::LogisticRegression(m) => m.predict(x),
            Estimator::SupportVectorMachine(m) => m.predict(x),
        }
    }

    /// Accuracy on the given rows
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        accuracy_score(y, &self.predict(x)?)
    }

    /// Every parameter of the underlying model, including fixed ones
    pub fn params(&self) -> BTreeMap<String, String> {
        match self {
            Estimator::DecisionTree(m) => m.params(),
            Estimator::GaussianNaiveBayes(m) => m.params(),
            Estimator::KNearestNeighbours(m) => m.params(),
            Estimator::LogisticRegression(m) => m.params(),
            Estimator::SupportVectorMachine(m) => m.params(),
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}({})", self.estimator_name(), args.join(", "))
    }
}

/// Outcome of one fit/predict cycle
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Registry display name
    pub model: String,
    /// The chosen hyperparameters
    pub params: ParamMap,
    /// Rendering of the fitted estimator with all its parameters
    pub estimator: String,
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

/// Fit the model described by `params` on the training rows of `split` and
/// evaluate it on the test rows. The report lists every class of `labels`.
pub fn train_and_evaluate(
    params: &ModelParams,
    split: &Split,
    labels: &Labels,
) -> Result<Evaluation> {
    let kind = params.kind();

    let mut train_classes: Vec<f64> = split.y_train.to_vec();
    train_classes.sort_by(|a, b| a.total_cmp(b));
    train_classes.dedup();
    if train_classes.len() < 2 {
        let present = train_classes
            .first()
            .and_then(|&c| labels.class_name(c))
            .unwrap_or("none");
        return Err(ExplorerError::Training(format!(
            "{} needs at least 2 classes in the training labels, found only '{}'",
            kind, present
        )));
    }

    let mut estimator = Estimator::from_params(params);
    let start = Instant::now();
    estimator.fit(&split.x_train, &split.y_train).map_err(|e| match e {
        ExplorerError::Training(_) => e,
        other => ExplorerError::Training(other.to_string()),
    })?;
    let training_time_secs = start.elapsed().as_secs_f64();
    debug!(model = %kind, secs = training_time_secs, "Model fitted");

    let predictions = estimator.predict(&split.x_test)?;
    let accuracy = accuracy_score(&split.y_test, &predictions)?;
    let report = ClassificationReport::compute(&split.y_test, &predictions, labels.classes())?;

    info!(model = %kind, accuracy, n_test = split.n_test(), "Evaluation complete");

    Ok(Evaluation {
        model: kind.name().to_string(),
        params: params.to_map(),
        estimator: estimator.to_string(),
        accuracy,
        report,
        n_train: split.n_train(),
        n_test: split.n_test(),
        training_time_secs,
    })
}
