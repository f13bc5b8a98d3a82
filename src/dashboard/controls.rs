//! Bounded input controls

use crate::error::{ExplorerError, Result};
use crate::training::ModelKind;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

pub(crate) const TARGET_KEY: &str = "target";
pub(crate) const TEST_SIZE_KEY: &str = "test_size";
pub(crate) const MODEL_KEY: &str = "model";
pub(crate) const MENU_KEY: &str = "action";

/// Whether `key` names a dashboard control or a hyperparameter of any model
pub fn is_control_key(key: &str) -> bool {
    [TARGET_KEY, TEST_SIZE_KEY, MODEL_KEY, MENU_KEY].contains(&key)
        || ModelKind::ALL
            .iter()
            .any(|kind| kind.param_specs().iter().any(|spec| spec.name == key))
}

/// Source of user choices. Every control is bounded: implementations may
/// only answer with one of the offered options or an in-range, on-step value.
pub trait Controls {
    /// Pick one of `options`; returns its index
    fn select(&mut self, key: &str, label: &str, options: &[String], default: usize)
        -> Result<usize>;

    /// Pick an integer in `min..=max` on `step`
    fn slider_int(
        &mut self,
        key: &str,
        label: &str,
        min: i64,
        max: i64,
        step: i64,
        default: i64,
    ) -> Result<i64>;

    /// Pick a float in `min..=max` on `step`
    fn slider_float(
        &mut self,
        key: &str,
        label: &str,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    ) -> Result<f64>;

    /// Pick one of an ordered list of options; returns its index
    fn select_slider(
        &mut self,
        key: &str,
        label: &str,
        options: &[String],
        default: usize,
    ) -> Result<usize>;

    /// Called once the session has read all of its controls
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Integer steps of `min..=max`
pub fn int_steps(min: i64, max: i64, step: i64) -> Vec<i64> {
    let step = step.max(1);
    (0..)
        .map(|k| min + k * step)
        .take_while(|v| *v <= max)
        .collect()
}

/// Float steps of `min..=max`, each rounded to 10 decimals
pub fn float_steps(min: f64, max: f64, step: f64) -> Vec<f64> {
    if step.is_nan() || step <= 0.0 || max < min {
        return vec![min];
    }
    let n = ((max - min) / step + 1e-9).floor() as usize;
    (0..=n).map(|k| round_to(min + k as f64 * step, 10)).collect()
}

pub(crate) fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

/// Answers controls from a fixed `key -> value` map, falling back to each
/// control's default. Values outside a control's bounds are rejected.
///
/// The menu key answers only once; later menus fall back to their default.
#[derive(Debug, Clone, Default)]
pub struct PresetControls {
    values: BTreeMap<String, String>,
    used: BTreeSet<String>,
}

impl PresetControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to preset one control
    pub fn with_value(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Take over every value of `other`, replacing presets with the same key
    pub fn merge(&mut self, other: PresetControls) {
        self.values.extend(other.values);
    }

    /// Parse `key=value` assignments
    pub fn from_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self> {
        let mut controls = Self::new();
        for raw in assignments {
            let raw = raw.as_ref();
            let (key, value) = raw.split_once('=').ok_or_else(|| {
                ExplorerError::Config(format!("expected key=value, got '{}'", raw))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ExplorerError::Config(format!("missing key in '{}'", raw)));
            }
            controls.set(key, value.trim());
        }
        Ok(controls)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Keys that no control has asked for
    pub fn unused_keys(&self) -> Vec<String> {
        self.values
            .keys()
            .filter(|k| !self.used.contains(*k))
            .cloned()
            .collect()
    }

    fn take(&mut self, key: &str) -> Option<String> {
        let value = if key == MENU_KEY {
            self.values.remove(key)
        } else {
            self.values.get(key).cloned()
        };
        if value.is_some() {
            self.used.insert(key.to_string());
        }
        value
    }

    fn pick(&mut self, key: &str, options: &[String], default: usize) -> Result<usize> {
        let Some(raw) = self.take(key) else {
            return Ok(default.min(options.len().saturating_sub(1)));
        };
        options
            .iter()
            .position(|opt| option_matches(opt, &raw))
            .ok_or_else(|| {
                ExplorerError::invalid_parameter(
                    key,
                    &raw,
                    format!("expected one of [{}]", options.join(", ")),
                )
            })
    }
}

fn option_matches(option: &str, raw: &str) -> bool {
    let raw = raw.trim();
    if option.eq_ignore_ascii_case(raw) {
        return true;
    }
    match (option.parse::<f64>(), raw.parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(f64::MIN_POSITIVE),
        _ => false,
    }
}

impl Controls for PresetControls {
    fn select(&mut self, key: &str, _label: &str, options: &[String], default: usize) -> Result<usize> {
        self.pick(key, options, default)
    }

    fn slider_int(
        &mut self,
        key: &str,
        _label: &str,
        min: i64,
        max: i64,
        step: i64,
        default: i64,
    ) -> Result<i64> {
        let Some(raw) = self.take(key) else {
            return Ok(default);
        };
        let value: i64 = raw.trim().parse().map_err(|_| {
            ExplorerError::invalid_parameter(key, &raw, "expected an integer")
        })?;
        if value < min || value > max {
            return Err(ExplorerError::invalid_parameter(
                key,
                value,
                format!("must lie in {}..={}", min, max),
            ));
        }
        if step > 1 && (value - min) % step != 0 {
            return Err(ExplorerError::invalid_parameter(
                key,
                value,
                format!("must be {} plus a multiple of {}", min, step),
            ));
        }
        Ok(value)
    }

    fn slider_float(
        &mut self,
        key: &str,
        _label: &str,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    ) -> Result<f64> {
        let Some(raw) = self.take(key) else {
            return Ok(default);
        };
        let value: f64 = raw.trim().parse().map_err(|_| {
            ExplorerError::invalid_parameter(key, &raw, "expected a number")
        })?;
        if !value.is_finite() || value < min - 1e-9 || value > max + 1e-9 {
            return Err(ExplorerError::invalid_parameter(
                key,
                value,
                format!("must lie in {}..={}", min, max),
            ));
        }
        let k = (value - min) / step;
        if (k - k.round()).abs() > 1e-6 {
            return Err(ExplorerError::invalid_parameter(
                key,
                value,
                format!("must be on a step of {}", step),
            ));
        }
        Ok(round_to(min + k.round() * step, 10))
    }

    fn select_slider(
        &mut self,
        key: &str,
        _label: &str,
        options: &[String],
        default: usize,
    ) -> Result<usize> {
        self.pick(key, options, default)
    }

    /// Presets for controls this session never showed, such as another
    /// model's hyperparameters, are skipped. Keys no control knows are errors.
    fn finish(&mut self) -> Result<()> {
        for key in self.unused_keys() {
            let value = self.values.get(&key).cloned().unwrap_or_default();
            if !is_control_key(&key) {
                return Err(ExplorerError::invalid_parameter(
                    key,
                    value,
                    "no control takes this parameter",
                ));
            }
            warn!(key = %key, value = %value, "Preset not used by the selected model, ignored");
        }
        Ok(())
    }
}
