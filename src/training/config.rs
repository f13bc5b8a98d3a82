//! Model registry: the model families and their hyperparameter controls

use crate::dashboard::Controls;
use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name-to-value mapping of a model's hyperparameters
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Type of model to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// CART decision tree
    DecisionTree,
    /// Gaussian naive Bayes
    GaussianNaiveBayes,
    /// Brute-force k nearest neighbours
    KNearestNeighbours,
    /// L2-regularised logistic regression
    LogisticRegression,
    /// Kernel support vector classifier
    SupportVectorMachine,
}

impl ModelKind {
    /// Every family, ordered by display name
    pub const ALL: [ModelKind; 5] = [
        ModelKind::DecisionTree,
        ModelKind::GaussianNaiveBayes,
        ModelKind::KNearestNeighbours,
        ModelKind::LogisticRegression,
        ModelKind::SupportVectorMachine,
    ];

    /// Display name, as offered in the model selector
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "decision trees",
            ModelKind::GaussianNaiveBayes => "gaussian naive bayes",
            ModelKind::KNearestNeighbours => "k nearest neighbours",
            ModelKind::LogisticRegression => "logistic regression",
            ModelKind::SupportVectorMachine => "support vector machine",
        }
    }

    /// Display names in selector order
    pub fn option_names() -> Vec<String> {
        let mut names: Vec<String> = Self::ALL.iter().map(|k| k.name().to_string()).collect();
        names.sort();
        names
    }

    /// Look a family up by display name
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| {
                ExplorerError::invalid_parameter(
                    "model",
                    name,
                    format!("expected one of [{}]", Self::option_names().join(", ")),
                )
            })
    }

    /// Hyperparameter controls of this family
    pub fn param_specs(&self) -> Vec<ParamSpec> {
        match self {
            ModelKind::DecisionTree => vec![
                ParamSpec {
                    name: "max_depth",
                    label: "max depth",
                    control: ParamControl::IntSlider { min: 1, max: 20, step: 1, default: 1 },
                },
                ParamSpec {
                    name: "criterion",
                    label: "criterion",
                    control: ParamControl::text_options(&["entropy", "gini"], 0),
                },
            ],
            ModelKind::KNearestNeighbours => vec![ParamSpec {
                name: "n_neighbors",
                label: "number of neighbours",
                control: ParamControl::IntSlider { min: 1, max: 20, step: 1, default: 1 },
            }],
            ModelKind::LogisticRegression => vec![ParamSpec {
                name: "C",
                label: "inverse regularisation strength",
                control: ParamControl::float_options(logspace(-5.0, 1.0, 7), 0),
            }],
            ModelKind::GaussianNaiveBayes => Vec::new(),
            ModelKind::SupportVectorMachine => vec![
                ParamSpec {
                    name: "C",
                    label: "regularisation parameter",
                    control: ParamControl::float_options(logspace(-5.0, 2.0, 8), 0),
                },
                ParamSpec {
                    name: "kernel",
                    label: "kernel",
                    control: ParamControl::text_options(&["linear", "poly", "rbf", "sigmoid"], 0),
                },
            ],
        }
    }

    /// Parameters with every control at its default
    pub fn default_params(&self) -> ModelParams {
        match self {
            ModelKind::DecisionTree => ModelParams::DecisionTree {
                max_depth: 1,
                criterion: Criterion::Entropy,
            },
            ModelKind::GaussianNaiveBayes => ModelParams::GaussianNaiveBayes,
            ModelKind::KNearestNeighbours => ModelParams::KNearestNeighbours { n_neighbors: 1 },
            ModelKind::LogisticRegression => ModelParams::LogisticRegression { c: 1e-5 },
            ModelKind::SupportVectorMachine => ModelParams::SupportVectorMachine {
                c: 1e-5,
                kernel: KernelChoice::Linear,
            },
        }
    }

    /// Read this family's hyperparameters from the controls
    pub fn collect_params(&self, controls: &mut dyn Controls) -> Result<ModelParams> {
        let mut values = ParamMap::new();
        for spec in self.param_specs() {
            let value = spec.read(controls)?;
            values.insert(spec.name.to_string(), value);
        }
        ModelParams::from_map(*self, &values)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// `num` values evenly spaced on a log10 scale from `10^start` to `10^stop`
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    let exp = start + step * i as f64;
                    if exp.fract() == 0.0 {
                        10f64.powi(exp as i32)
                    } else {
                        10f64.powf(exp)
                    }
                })
                .collect()
        }
    }
}

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    fn matches(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (ParamValue::Text(a), ParamValue::Text(b)) => a.eq_ignore_ascii_case(b),
            (ParamValue::Text(_), _) | (_, ParamValue::Text(_)) => false,
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => (x - y).abs() <= 1e-9 * x.abs().max(y.abs()),
                _ => false,
            },
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => f.write_str(&format_float(*v)),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Compact float rendering: plain notation in [1e-3, 1e4), scientific otherwise
pub fn format_float(v: f64) -> String {
    let abs = v.abs();
    if v == 0.0 || (1e-3..1e4).contains(&abs) {
        format!("{}", v)
    } else {
        format!("{:e}", v)
    }
}

/// How a hyperparameter is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum ParamControl {
    /// Integer slider over `min..=max` on `step`
    IntSlider { min: i64, max: i64, step: i64, default: i64 },
    /// Slider over an ordered list of options
    SelectSlider { options: Vec<ParamValue>, default: usize },
}

impl ParamControl {
    fn text_options(options: &[&str], default: usize) -> Self {
        ParamControl::SelectSlider {
            options: options.iter().map(|s| ParamValue::Text(s.to_string())).collect(),
            default,
        }
    }

    fn float_options(options: Vec<f64>, default: usize) -> Self {
        ParamControl::SelectSlider {
            options: options.into_iter().map(ParamValue::Float).collect(),
            default,
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamControl::IntSlider { default, .. } => ParamValue::Int(*default),
            ParamControl::SelectSlider { options, default } => options[*default].clone(),
        }
    }

    /// Option labels as shown to the user
    pub fn option_labels(&self) -> Vec<String> {
        match self {
            ParamControl::IntSlider { min, max, step, .. } => {
                crate::dashboard::int_steps(*min, *max, *step)
                    .into_iter()
                    .map(|v| v.to_string())
                    .collect()
            }
            ParamControl::SelectSlider { options, .. } => {
                options.iter().map(|v| v.to_string()).collect()
            }
        }
    }
}

impl fmt::Display for ParamControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamControl::IntSlider { min, max, step, default } => {
                write!(f, "slider {}..={} step {} (default {})", min, max, step, default)
            }
            ParamControl::SelectSlider { options, default } => {
                let labels: Vec<String> = options.iter().map(|v| v.to_string()).collect();
                write!(f, "one of [{}] (default {})", labels.join(", "), labels[*default])
            }
        }
    }
}

/// A bounded hyperparameter control
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub control: ParamControl,
}

impl ParamSpec {
    /// Check a value against the control and return it in canonical form
    pub fn validate(&self, value: &ParamValue) -> Result<ParamValue> {
        match &self.control {
            ParamControl::IntSlider { min, max, step, .. } => {
                let step = (*step).max(1);
                let v = value.as_int().ok_or_else(|| {
                    ExplorerError::invalid_parameter(self.name, value, "expected an integer")
                })?;
                if v < *min || v > *max {
                    return Err(ExplorerError::invalid_parameter(
                        self.name,
                        v,
                        format!("must lie in {}..={}", min, max),
                    ));
                }
                if (v - min) % step != 0 {
                    return Err(ExplorerError::invalid_parameter(
                        self.name,
                        v,
                        format!("must be {} plus a multiple of {}", min, step),
                    ));
                }
                Ok(ParamValue::Int(v))
            }
            ParamControl::SelectSlider { options, .. } => options
                .iter()
                .find(|opt| opt.matches(value))
                .cloned()
                .ok_or_else(|| {
                    ExplorerError::invalid_parameter(
                        self.name,
                        value,
                        format!("expected one of [{}]", self.control.option_labels().join(", ")),
                    )
                }),
        }
    }

    fn read(&self, controls: &mut dyn Controls) -> Result<ParamValue> {
        match &self.control {
            ParamControl::IntSlider { min, max, step, default } => controls
                .slider_int(self.name, self.label, *min, *max, *step, *default)
                .map(ParamValue::Int),
            ParamControl::SelectSlider { options, default } => {
                let labels = self.control.option_labels();
                let idx = controls.select_slider(self.name, self.label, &labels, *default)?;
                options.get(idx).cloned().ok_or_else(|| {
                    ExplorerError::Interaction(format!(
                        "option {} out of range for {}",
                        idx, self.name
                    ))
                })
            }
        }
    }
}

/// Split impurity measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Entropy,
    Gini,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Entropy => "entropy",
            Criterion::Gini => "gini",
        }
    }
}

/// SVM kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelChoice {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

impl KernelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelChoice::Linear => "linear",
            KernelChoice::Poly => "poly",
            KernelChoice::Rbf => "rbf",
            KernelChoice::Sigmoid => "sigmoid",
        }
    }
}

/// Validated hyperparameters, one variant per model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelParams {
    DecisionTree { max_depth: usize, criterion: Criterion },
    GaussianNaiveBayes,
    KNearestNeighbours { n_neighbors: usize },
    LogisticRegression {
        #[serde(rename = "C")]
        c: f64,
    },
    SupportVectorMachine {
        #[serde(rename = "C")]
        c: f64,
        kernel: KernelChoice,
    },
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::DecisionTree { .. } => ModelKind::DecisionTree,
            ModelParams::GaussianNaiveBayes => ModelKind::GaussianNaiveBayes,
            ModelParams::KNearestNeighbours { .. } => ModelKind::KNearestNeighbours,
            ModelParams::LogisticRegression { .. } => ModelKind::LogisticRegression,
            ModelParams::SupportVectorMachine { .. } => ModelKind::SupportVectorMachine,
        }
    }

    /// Name-to-value mapping; keys are exactly the family's hyperparameter names
    pub fn to_map(&self) -> ParamMap {
        let mut map = ParamMap::new();
        match self {
            ModelParams::DecisionTree { max_depth, criterion } => {
                map.insert("max_depth".into(), ParamValue::Int(*max_depth as i64));
                map.insert("criterion".into(), ParamValue::Text(criterion.as_str().into()));
            }
            ModelParams::GaussianNaiveBayes => {}
            ModelParams::KNearestNeighbours { n_neighbors } => {
                map.insert("n_neighbors".into(), ParamValue::Int(*n_neighbors as i64));
            }
            ModelParams::LogisticRegression { c } => {
                map.insert("C".into(), ParamValue::Float(*c));
            }
            ModelParams::SupportVectorMachine { c, kernel } => {
                map.insert("C".into(), ParamValue::Float(*c));
                map.insert("kernel".into(), ParamValue::Text(kernel.as_str().into()));
            }
        }
        map
    }

    /// Validate a mapping against `kind`'s controls. Missing keys take the
    /// control's default; unknown keys and out-of-bounds values are rejected.
    pub fn from_map(kind: ModelKind, map: &ParamMap) -> Result<Self> {
        let specs = kind.param_specs();
        if let Some(unknown) = map.keys().find(|k| !specs.iter().any(|s| s.name == k.as_str())) {
            return Err(ExplorerError::invalid_parameter(
                unknown.clone(),
                &map[unknown],
                format!("not a parameter of {}", kind),
            ));
        }

        let mut values = BTreeMap::new();
        for spec in &specs {
            let value = match map.get(spec.name) {
                Some(v) => spec.validate(v)?,
                None => spec.control.default_value(),
            };
            values.insert(spec.name, value);
        }

        let int = |name: &str| values.get(name).and_then(ParamValue::as_int).unwrap_or(1);
        let float = |name: &str| values.get(name).and_then(ParamValue::as_float).unwrap_or(1.0);
        let text = |name: &str| match values.get(name) {
            Some(ParamValue::Text(s)) => s.to_lowercase(),
            _ => String::new(),
        };

        let params = match kind {
            ModelKind::DecisionTree => ModelParams::DecisionTree {
                max_depth: int("max_depth") as usize,
                criterion: match text("criterion").as_str() {
                    "gini" => Criterion::Gini,
                    _ => Criterion::Entropy,
                },
            },
            ModelKind::GaussianNaiveBayes => ModelParams::GaussianNaiveBayes,
            ModelKind::KNearestNeighbours => ModelParams::KNearestNeighbours {
                n_neighbors: int("n_neighbors") as usize,
            },
            ModelKind::LogisticRegression => ModelParams::LogisticRegression { c: float("C") },
            ModelKind::SupportVectorMachine => ModelParams::SupportVectorMachine {
                c: float("C"),
                kernel: match text("kernel").as_str() {
                    "poly" => KernelChoice::Poly,
                    "rbf" => KernelChoice::Rbf,
                    "sigmoid" => KernelChoice::Sigmoid,
                    _ => KernelChoice::Linear,
                },
            },
        };
        Ok(params)
    }
}
