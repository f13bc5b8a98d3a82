//! Dashboard configuration
//!
//! `ExplorerConfig` holds the file/CLI level settings, some of which preset
//! the dashboard controls. `RunConfig` is the fully resolved input of one
//! pipeline run.

use crate::dashboard::PresetControls;
use crate::error::{ExplorerError, Result};
use crate::preprocessing::ScalingScope;
use crate::training::{ModelParams, DEFAULT_SEED};
use crate::utils::DEFAULT_PREVIEW_ROWS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default location of the explored dataset
pub const DEFAULT_DATA_PATH: &str = "visdata.csv";

/// Default proportion of rows held back for testing
pub const DEFAULT_TEST_PROPORTION: f64 = 0.2;

/// Settings of the explorer, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Dataset to explore
    pub data_path: PathBuf,
    /// Field delimiter; inferred from the file extension when unset
    pub delimiter: Option<char>,
    /// Rows shown in the data previews
    pub preview_rows: usize,
    /// Seed of the train/test shuffle
    pub seed: u64,
    /// Which frame the min-max scaler is applied to
    pub scaling: ScalingScope,
    /// Preset target column
    pub target: Option<String>,
    /// Preset test proportion
    pub test_size: Option<f64>,
    /// Preset model, by display name
    pub model: Option<String>,
    /// Preset hyperparameters
    pub params: BTreeMap<String, serde_json::Value>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            delimiter: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            seed: DEFAULT_SEED,
            scaling: ScalingScope::default(),
            target: None,
            test_size: None,
            model: None,
            params: BTreeMap::new(),
        }
    }
}

impl ExplorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ExplorerError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err(ExplorerError::Config(format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    delimiter
                )));
            }
        }
        if self.preview_rows == 0 {
            return Err(ExplorerError::Config("preview_rows must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingScope) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = Some(test_size);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Controls answering with the preset values, and with each control's
    /// default where nothing is preset
    pub fn preset_controls(&self) -> PresetControls {
        let mut controls = PresetControls::new();
        if let Some(target) = &self.target {
            controls.set("target", target);
        }
        if let Some(test_size) = self.test_size {
            controls.set("test_size", test_size);
        }
        if let Some(model) = &self.model {
            controls.set("model", model);
        }
        for (name, value) in &self.params {
            match value {
                serde_json::Value::String(s) => controls.set(name.clone(), s),
                other => controls.set(name.clone(), other),
            }
        }
        controls
    }
}

/// Resolved configuration of a single pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target: String,
    pub test_proportion: f64,
    pub seed: u64,
    pub scaling: ScalingScope,
    pub params: ModelParams,
}

impl RunConfig {
    pub fn new(target: impl Into<String>, params: ModelParams) -> Self {
        Self {
            target: target.into(),
            test_proportion: DEFAULT_TEST_PROPORTION,
            seed: DEFAULT_SEED,
            scaling: ScalingScope::default(),
            params,
        }
    }

    pub fn with_test_proportion(mut self, test_proportion: f64) -> Self {
        self.test_proportion = test_proportion;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingScope) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }
}
