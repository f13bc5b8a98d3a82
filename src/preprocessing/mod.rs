//! Data preprocessing module
//!
//! Turns a loaded frame into model inputs:
//! - Categorical encoding (one-hot with the first level dropped)
//! - Feature scaling (min-max into [0, 1])
//! - Conversion of the encoded frame into a dense feature matrix
//! - Label extraction from the target column

mod encoder;
mod scaler;

pub use encoder::OneHotEncoder;
pub use scaler::{MinMaxScaler, ScalingScope};

use crate::error::{ExplorerError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Column data type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    Unknown,
}

impl ColumnType {
    /// Classify a polars dtype
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => ColumnType::Numeric,
            DataType::String | DataType::Boolean => ColumnType::Categorical,
            _ => ColumnType::Unknown,
        }
    }
}

/// Names of the columns that get one-hot expanded: every string or boolean column.
pub fn categorical_columns(frame: &DataFrame) -> Vec<String> {
    columns_of_type(frame, ColumnType::Categorical)
}

/// Names of the numeric columns
pub fn numeric_columns(frame: &DataFrame) -> Vec<String> {
    columns_of_type(frame, ColumnType::Numeric)
}

fn columns_of_type(frame: &DataFrame, wanted: ColumnType) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .filter(|col| ColumnType::of(col.dtype()) == wanted)
        .map(|col| col.name().to_string())
        .collect()
}

/// Dense numeric view of an encoded feature frame
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Build the matrix from a frame whose columns are all numeric.
    ///
    /// Missing values are read as 0.0.
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let n_rows = frame.height();
        let n_cols = frame.width();
        let mut values = Array2::zeros((n_rows, n_cols));
        let mut names = Vec::with_capacity(n_cols);

        for (j, column) in frame.get_columns().iter().enumerate() {
            if ColumnType::of(column.dtype()) != ColumnType::Numeric {
                return Err(ExplorerError::Encoding(format!(
                    "feature column '{}' has non-numeric type {}",
                    column.name(),
                    column.dtype()
                )));
            }

            let series = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| ExplorerError::Encoding(e.to_string()))?;
            let ca = series
                .f64()
                .map_err(|e| ExplorerError::Encoding(e.to_string()))?;

            let nulls = ca.null_count();
            if nulls > 0 {
                warn!(column = %column.name(), nulls, "missing feature values read as 0.0");
            }

            for (i, v) in ca.into_iter().enumerate() {
                values[[i, j]] = v.unwrap_or(0.0);
            }
            names.push(column.name().to_string());
        }

        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

/// Class labels drawn from the target column
#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    classes: Vec<String>,
    #[serde(skip)]
    codes: Array1<f64>,
}

impl Labels {
    /// Read the target column as labels.
    ///
    /// Values are rendered as strings. Classes are ordered numerically when
    /// every class parses as a number, lexicographically otherwise.
    pub fn from_column(column: &Column) -> Result<Self> {
        let name = column.name().to_string();
        if column.null_count() > 0 {
            return Err(ExplorerError::Training(format!(
                "target column '{}' has {} missing values",
                name,
                column.null_count()
            )));
        }

        let series = column
            .as_materialized_series()
            .cast(&DataType::String)
            .map_err(|e| ExplorerError::Training(e.to_string()))?;
        let ca = series
            .str()
            .map_err(|e| ExplorerError::Training(e.to_string()))?;
        let raw: Vec<String> = ca
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();

        Ok(Self::from_values(raw))
    }

    /// Build labels from already-rendered values
    pub fn from_values<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> Self {
        let raw: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        let distinct: BTreeSet<&str> = raw.iter().map(String::as_str).collect();
        let mut classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();

        let numeric: Option<Vec<f64>> = classes.iter().map(|c| c.parse::<f64>().ok()).collect();
        if let Some(parsed) = numeric {
            let mut keyed: Vec<(f64, String)> = parsed.into_iter().zip(classes).collect();
            keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(&b.1)));
            classes = keyed.into_iter().map(|(_, c)| c).collect();
        }

        let index: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let codes = raw.iter().map(|v| index[v.as_str()] as f64).collect();

        Self { classes, codes }
    }

    /// Distinct classes in report order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Per-row class index
    pub fn codes(&self) -> &Array1<f64> {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_name(&self, code: f64) -> Option<&str> {
        if code < 0.0 {
            return None;
        }
        self.classes.get(code as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_of() {
        assert_eq!(ColumnType::of(&DataType::Int64), ColumnType::Numeric);
        assert_eq!(ColumnType::of(&DataType::Float32), ColumnType::Numeric);
        assert_eq!(ColumnType::of(&DataType::String), ColumnType::Categorical);
        assert_eq!(ColumnType::of(&DataType::Boolean), ColumnType::Categorical);
        assert_eq!(ColumnType::of(&DataType::Date), ColumnType::Unknown);
    }

    #[test]
    fn test_categorical_columns() {
        let df = df!(
            "price" => &[1.0, 2.0],
            "room" => &["a", "b"],
            "flag" => &[true, false]
        )
        .unwrap();
        assert_eq!(categorical_columns(&df), vec!["room", "flag"]);
        assert_eq!(numeric_columns(&df), vec!["price"]);
    }

    #[test]
    fn test_feature_matrix_nulls_read_as_zero() {
        let df = df!("a" => &[Some(1i64), None, Some(3)], "b" => &[0.5, 1.5, 2.5]).unwrap();
        let fm = FeatureMatrix::from_frame(&df).unwrap();
        assert_eq!(fm.values().dim(), (3, 2));
        assert_eq!(fm.values()[[1, 0]], 0.0);
        assert_eq!(fm.values()[[2, 1]], 2.5);
        assert_eq!(fm.names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_feature_matrix_rejects_strings() {
        let df = df!("a" => &["x", "y"]).unwrap();
        assert!(matches!(
            FeatureMatrix::from_frame(&df),
            Err(ExplorerError::Encoding(_))
        ));
    }

    #[test]
    fn test_labels_numeric_order() {
        let labels = Labels::from_values(["10", "2", "1", "2"]);
        assert_eq!(labels.classes(), &["1", "2", "10"]);
        assert_eq!(labels.codes().to_vec(), vec![2.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_labels_lexicographic_order() {
        let labels = Labels::from_values(["yes", "no", "maybe"]);
        assert_eq!(labels.classes(), &["maybe", "no", "yes"]);
        assert_eq!(labels.class_name(1.0), Some("no"));
    }

    #[test]
    fn test_labels_from_column_with_null_fails() {
        let df = df!("target" => &[Some(1i64), None]).unwrap();
        let col = df.column("target").unwrap();
        assert!(matches!(
            Labels::from_column(col),
            Err(ExplorerError::Training(_))
        ));
    }
}
