//! Exploration pipeline
//!
//! One run is a chain of pure stages, each consuming the previous stage's
//! output: target selection, one-hot encoding, min-max scaling, conversion
//! to a feature matrix, train/test split and finally training and
//! evaluation of the chosen model.

use crate::config::RunConfig;
use crate::error::{ExplorerError, Result};
use crate::preprocessing::{
    categorical_columns, FeatureMatrix, Labels, MinMaxScaler, OneHotEncoder, ScalingScope,
};
use crate::training::{train_and_evaluate, train_test_split, Evaluation, ModelParams, Split};
use crate::utils::Dataset;
use polars::prelude::*;
use tracing::{debug, info};

/// Split a frame into the feature frame and the target column
pub fn select_target(frame: &DataFrame, target: &str) -> Result<(DataFrame, Column)> {
    let y = frame
        .column(target)
        .map_err(|_| ExplorerError::FeatureNotFound(target.to_string()))?
        .clone();
    let x = frame.drop(target)?;
    Ok((x, y))
}

/// One-hot encode every categorical column of the feature frame
pub fn encode_features(x: &DataFrame) -> Result<(DataFrame, OneHotEncoder)> {
    let categorical = categorical_columns(x);
    let mut encoder = OneHotEncoder::new();
    let encoded = encoder.fit_transform(x, &categorical)?;
    debug!(
        categorical = categorical.len(),
        features = encoded.width(),
        "Encoded feature frame"
    );
    Ok((encoded, encoder))
}

/// Min-max scale a frame with a scaler fitted on that same frame
pub fn scale_frame(frame: &DataFrame) -> Result<DataFrame> {
    MinMaxScaler::new().fit_transform(frame)
}

/// Everything a run computes before a model is chosen
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Target column name
    pub target: String,
    /// Encoded frame the feature matrix was built from
    pub encoded: DataFrame,
    /// Scaled frame shown to the user; `None` when scaling is disabled
    pub scaled: Option<DataFrame>,
    pub features: FeatureMatrix,
    pub labels: Labels,
    pub split: Split,
}

impl PreparedData {
    /// Fit and evaluate one model on the prepared split
    pub fn evaluate(&self, params: &ModelParams) -> Result<Evaluation> {
        train_and_evaluate(params, &self.split, &self.labels)
    }
}

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub prepared: PreparedData,
    pub evaluation: Evaluation,
}

impl RunOutcome {
    pub fn split(&self) -> &Split {
        &self.prepared.split
    }

    pub fn scaled_preview(&self, rows: usize) -> Option<DataFrame> {
        self.prepared.scaled.as_ref().map(|frame| frame.head(Some(rows)))
    }
}

/// Stateless driver of the pipeline stages
pub struct Pipeline;

impl Pipeline {
    /// Run every stage up to and including the split
    pub fn prepare(dataset: &Dataset, config: &RunConfig) -> Result<PreparedData> {
        info!(
            target_column = %config.target,
            test_size = config.test_proportion,
            scaling = %config.scaling,
            "Preparing run"
        );

        let (x, y) = select_target(dataset.frame(), &config.target)?;
        let (encoded, _) = encode_features(&x)?;

        let (training_frame, scaled) = match config.scaling {
            ScalingScope::Features => {
                let scaled = scale_frame(&encoded)?;
                (scaled.clone(), Some(scaled))
            }
            ScalingScope::FullFrame => (encoded.clone(), Some(scale_frame(dataset.frame())?)),
            ScalingScope::Disabled => (encoded.clone(), None),
        };

        let features = FeatureMatrix::from_frame(&training_frame)?;
        let labels = Labels::from_column(&y)?;
        let split = train_test_split(
            features.values(),
            labels.codes(),
            config.test_proportion,
            config.seed,
        )?;

        info!(
            n_train = split.n_train(),
            n_test = split.n_test(),
            features = features.n_features(),
            classes = labels.n_classes(),
            "Split data"
        );

        Ok(PreparedData {
            target: config.target.clone(),
            encoded,
            scaled,
            features,
            labels,
            split,
        })
    }

    /// Run the whole pipeline
    pub fn run(dataset: &Dataset, config: &RunConfig) -> Result<RunOutcome> {
        let prepared = Self::prepare(dataset, config)?;
        let evaluation = prepared.evaluate(&config.params)?;
        Ok(RunOutcome {
            prepared,
            evaluation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::Criterion;

    fn listings() -> Dataset {
        let frame = df![
            "Price" => [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0],
            "Room_Type" => ["entire", "private", "entire", "private", "entire",
                            "private", "entire", "private", "entire", "private"],
            "Target" => [0i64, 0, 0, 0, 0, 1, 1, 1, 1, 1]
        ]
        .unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    #[test]
    fn test_select_target_removes_column() {
        let dataset = listings();
        let (x, y) = select_target(dataset.frame(), "target").unwrap();
        assert_eq!(x.width(), 2);
        assert!(x.column("target").is_err());
        assert_eq!(y.len(), 10);
    }

    #[test]
    fn test_unknown_target() {
        let dataset = listings();
        assert!(matches!(
            select_target(dataset.frame(), "missing"),
            Err(ExplorerError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_prepare_encodes_and_scales_features() {
        let dataset = listings();
        let config = RunConfig::new("target", ModelParams::GaussianNaiveBayes);
        let prepared = Pipeline::prepare(&dataset, &config).unwrap();

        assert_eq!(prepared.features.names(), &["price", "room_type_private"]);
        assert!(prepared.features.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(prepared.split.n_test(), 2);
        assert_eq!(prepared.split.n_train(), 8);
    }

    #[test]
    fn test_full_frame_scaling_leaves_features_unscaled() {
        let dataset = listings();
        let config = RunConfig::new("target", ModelParams::GaussianNaiveBayes)
            .with_scaling(ScalingScope::FullFrame);
        let prepared = Pipeline::prepare(&dataset, &config).unwrap();

        let max_price = prepared.features.values().column(0).fold(0.0f64, |a, &b| a.max(b));
        assert_eq!(max_price, 100.0);

        let scaled = prepared.scaled.unwrap();
        assert_eq!(scaled.width(), 3);
        assert!(scaled.column("target").is_ok());
    }

    #[test]
    fn test_disabled_scaling_has_no_preview() {
        let dataset = listings();
        let config = RunConfig::new("target", ModelParams::GaussianNaiveBayes)
            .with_scaling(ScalingScope::Disabled);
        assert!(Pipeline::prepare(&dataset, &config).unwrap().scaled.is_none());
    }

    #[test]
    fn test_run_decision_tree() {
        let dataset = listings();
        let params = ModelParams::DecisionTree {
            max_depth: 3,
            criterion: Criterion::Gini,
        };
        let outcome = Pipeline::run(&dataset, &RunConfig::new("target", params)).unwrap();

        assert!((0.0..=1.0).contains(&outcome.evaluation.accuracy));
        assert!((1..=2).contains(&outcome.evaluation.report.classes.len()));
        assert_eq!(outcome.evaluation.report.support(), 2);
        assert!(outcome.scaled_preview(3).is_some_and(|p| p.height() == 3));
    }
}
