//! Categorical encoding

use crate::error::{ExplorerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// One-hot encoder with the first sorted level of every column dropped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // column name -> sorted distinct levels, in fit order
    levels: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the sorted distinct levels of each listed column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.levels.clear();

        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                ExplorerError::Encoding(format!("column '{}' not found", col_name))
            })?;
            if column.is_empty() {
                return Err(ExplorerError::Encoding(format!(
                    "column '{}' has no rows",
                    col_name
                )));
            }

            let levels: Vec<String> = string_values(column)?
                .into_iter()
                .flatten()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            debug!(column = %col_name, levels = levels.len(), "fitted one-hot levels");
            self.levels.push((col_name.clone(), levels));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column, in place, with indicator columns for all
    /// but its first level. Values not seen during fit and nulls encode as
    /// all zeros.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ExplorerError::ModelNotFitted);
        }

        for (col_name, _) in &self.levels {
            if df.column(col_name).is_err() {
                return Err(ExplorerError::Encoding(format!(
                    "column '{}' not found",
                    col_name
                )));
            }
        }

        let encoded: HashSet<&str> = self.levels.iter().map(|(c, _)| c.as_str()).collect();
        let mut taken: HashSet<String> = df
            .get_column_names()
            .iter()
            .filter(|name| !encoded.contains(name.as_str()))
            .map(|name| name.to_string())
            .collect();

        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let Some((col_name, levels)) = self
                .levels
                .iter()
                .find(|(c, _)| c.as_str() == column.name().as_str())
            else {
                columns.push(column.clone());
                continue;
            };

            let values = string_values(column)?;
            for level in levels.iter().skip(1) {
                let new_name = format!("{}_{}", col_name, level);
                if !taken.insert(new_name.clone()) {
                    return Err(ExplorerError::Encoding(format!(
                        "indicator column '{}' collides with an existing column",
                        new_name
                    )));
                }

                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| if v.as_deref() == Some(level.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                columns.push(Series::new(new_name.into(), indicator).into());
            }
        }

        DataFrame::new(columns).map_err(|e| ExplorerError::Encoding(e.to_string()))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted levels per column, the dropped reference level first
    pub fn levels(&self) -> &[(String, Vec<String>)] {
        &self.levels
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let series = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| ExplorerError::Encoding(e.to_string()))?;
    let ca = series
        .str()
        .map_err(|e| ExplorerError::Encoding(e.to_string()))?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_onehot_drops_first_level() {
        let df = df!(
            "price" => &[1.0, 2.0, 3.0],
            "room" => &["private", "entire", "shared"]
        )
        .unwrap();

        let mut encoder = OneHotEncoder::new();
        let result = encoder.fit_transform(&df, &cols(&["room"])).unwrap();

        let names: Vec<String> = result.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["price", "room_private", "room_shared"]);

        let private: Vec<f64> = result.column("room_private").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(private, vec![1.0, 0.0, 0.0]);
        assert_eq!(encoder.levels()[0].1, vec!["entire", "private", "shared"]);
    }

    #[test]
    fn test_onehot_nulls_encode_as_zero() {
        let df = df!("c" => &[Some("a"), None, Some("b")]).unwrap();
        let mut encoder = OneHotEncoder::new();
        let result = encoder.fit_transform(&df, &cols(&["c"])).unwrap();

        let b: Vec<f64> = result.column("c_b").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(b, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_onehot_single_level_yields_no_columns() {
        let df = df!("c" => &["same", "same"], "x" => &[1i64, 2]).unwrap();
        let mut encoder = OneHotEncoder::new();
        let result = encoder.fit_transform(&df, &cols(&["c"])).unwrap();
        assert_eq!(result.width(), 1);
        assert!(result.column("x").is_ok());
    }

    #[test]
    fn test_onehot_collision_is_error() {
        let df = df!("c" => &["a", "b"], "c_b" => &[1.0, 2.0]).unwrap();
        let mut encoder = OneHotEncoder::new();
        let err = encoder.fit_transform(&df, &cols(&["c"])).unwrap_err();
        assert!(matches!(err, ExplorerError::Encoding(_)));
    }

    #[test]
    fn test_onehot_missing_column_is_error() {
        let df = df!("c" => &["a", "b"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        let err = encoder.fit_transform(&df, &cols(&["nope"])).unwrap_err();
        assert!(matches!(err, ExplorerError::Encoding(_)));
    }

    #[test]
    fn test_onehot_empty_column_is_error() {
        let df = DataFrame::new(vec![Series::new("c".into(), Vec::<String>::new()).into()]).unwrap();
        let mut encoder = OneHotEncoder::new();
        let err = encoder.fit_transform(&df, &cols(&["c"])).unwrap_err();
        assert!(matches!(err, ExplorerError::Encoding(_)));
    }

    #[test]
    fn test_transform_unseen_level() {
        let train = df!("c" => &["a", "b"]).unwrap();
        let other = df!("c" => &["b", "z"]).unwrap();

        let mut encoder = OneHotEncoder::new();
        encoder.fit(&train, &cols(&["c"])).unwrap();
        let result = encoder.transform(&other).unwrap();

        let b: Vec<f64> = result.column("c_b").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(b, vec![1.0, 0.0]);
    }

    #[test]
    fn test_transform_before_fit() {
        let df = df!("c" => &["a"]).unwrap();
        assert!(matches!(
            OneHotEncoder::new().transform(&df),
            Err(ExplorerError::ModelNotFitted)
        ));
    }
}
