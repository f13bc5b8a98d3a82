//! Model Explorer - interactive exploration of classical classifiers
//!
//! Loads a tabular dataset, lets the user pick a target column, encodes and
//! scales the features, splits the rows and trains one of five classifier
//! families with bounded hyperparameters, then reports accuracy and a
//! per-class classification report.
//!
//! # Modules
//!
//! - [`utils`] - Dataset loading
//! - [`preprocessing`] - One-hot encoding, min-max scaling, feature matrix and labels
//! - [`training`] - Model registry, split, classifiers, engine and metrics
//! - [`pipeline`] - The staged run from dataset to evaluation
//! - [`dashboard`] - Controls, surfaces and the interactive run loop
//! - [`config`] - File and per-run configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod pipeline;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// Front ends
pub mod dashboard;
pub mod cli;

pub use error::{ExplorerError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ExplorerError, Result};

    // Configuration
    pub use crate::config::{ExplorerConfig, RunConfig};

    // Data
    pub use crate::utils::{DataLoader, Dataset};

    // Preprocessing
    pub use crate::preprocessing::{
        FeatureMatrix, Labels, MinMaxScaler, OneHotEncoder, ScalingScope,
    };

    // Training
    pub use crate::training::{
        train_and_evaluate, train_test_split, ClassificationReport, Estimator, Evaluation,
        ModelKind, ModelParams, Split,
    };

    // Pipeline
    pub use crate::pipeline::{Pipeline, PreparedData, RunOutcome};

    // Dashboard
    pub use crate::dashboard::{
        BufferSurface, Controls, Dashboard, PresetControls, Selections, Surface,
    };
}
