//! Feature scaling

use super::{numeric_columns, ColumnType};
use crate::error::{ExplorerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which frame the pipeline runs the min-max scaler over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingScope {
    /// Scale the encoded features the model trains on
    #[default]
    Features,
    /// Scale the loaded frame for display only; the model sees unscaled features
    FullFrame,
    /// No scaling
    Disabled,
}

impl ScalingScope {
    pub const ALL: [ScalingScope; 3] = [
        ScalingScope::Features,
        ScalingScope::FullFrame,
        ScalingScope::Disabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingScope::Features => "features",
            ScalingScope::FullFrame => "full-frame",
            ScalingScope::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ScalingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingScope {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                ExplorerError::Config(format!(
                    "unknown scaling scope '{}', expected features, full-frame or disabled",
                    s
                ))
            })
    }
}

/// Observed range of one column
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MinMaxParams {
    min: f64,
    max: f64,
}

impl MinMaxParams {
    fn scale(&self, v: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            0.0
        } else {
            (v - self.min) / range
        }
    }
}

/// Min-max scaler mapping every numeric column into [0, 1]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinMaxScaler {
    params: HashMap<String, MinMaxParams>,
    is_fitted: bool,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record min and max of every numeric column, ignoring nulls
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.params.clear();

        for col_name in numeric_columns(df) {
            let series = df
                .column(&col_name)
                .map_err(|_| ExplorerError::FeatureNotFound(col_name.clone()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let ca = series.f64()?;

            let params = MinMaxParams {
                min: ca.min().unwrap_or(0.0),
                max: ca.max().unwrap_or(0.0),
            };
            debug!(column = %col_name, min = params.min, max = params.max, "fitted min-max range");
            self.params.insert(col_name, params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns of `df` into a new frame; other columns pass
    /// through unchanged and nulls stay null.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ExplorerError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .filter_map(|(col_name, params)| {
                df.column(col_name)
                    .ok()
                    .filter(|column| ColumnType::of(column.dtype()) == ColumnType::Numeric)
                    .map(|column| scale_series(column.as_materialized_series(), params))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Fitted `(min, max)` for a column
    pub fn range_of(&self, column: &str) -> Option<(f64, f64)> {
        self.params.get(column).map(|p| (p.min, p.max))
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

fn scale_series(series: &Series, params: &MinMaxParams) -> Result<Series> {
    let series = series.cast(&DataType::Float64)?;
    let ca = series.f64()?;

    let scaled: Float64Chunked = ca
        .into_iter()
        .map(|opt| opt.map(|v| params.scale(v)))
        .collect();

    Ok(scaled.with_name(series.name().clone()).into_series())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_minmax_scaler() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut scaler = MinMaxScaler::new();
        let result = scaler.fit_transform(&df).unwrap();

        let col = values(&result, "a");
        assert_eq!(col[0], Some(0.0));
        assert_eq!(col[2], Some(0.5));
        assert_eq!(col[4], Some(1.0));
        assert_eq!(scaler.range_of("a"), Some((1.0, 5.0)));
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let df = df!("c" => &[7i64, 7, 7]).unwrap();
        let result = MinMaxScaler::new().fit_transform(&df).unwrap();
        assert_eq!(values(&result, "c"), vec![Some(0.0); 3]);
    }

    #[test]
    fn test_non_numeric_and_nulls_pass_through() {
        let df = df!(
            "n" => &[Some(0.0), None, Some(10.0)],
            "s" => &["x", "y", "z"]
        )
        .unwrap();
        let result = MinMaxScaler::new().fit_transform(&df).unwrap();

        assert_eq!(values(&result, "n"), vec![Some(0.0), None, Some(1.0)]);
        assert_eq!(result.column("s").unwrap().dtype(), &DataType::String);
        assert_eq!(result.get_column_names(), df.get_column_names());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let df = df!("a" => &[2.0, 4.0]).unwrap();
        let _ = MinMaxScaler::new().fit_transform(&df).unwrap();
        assert_eq!(values(&df, "a"), vec![Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_scaling_scope_parse() {
        assert_eq!("full-frame".parse::<ScalingScope>().unwrap(), ScalingScope::FullFrame);
        assert_eq!("Features".parse::<ScalingScope>().unwrap(), ScalingScope::Features);
        assert!(matches!(
            "everything".parse::<ScalingScope>(),
            Err(ExplorerError::Config(_))
        ));
        assert_eq!(ScalingScope::default(), ScalingScope::Features);
    }
}
