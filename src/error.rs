//! Error types for the model explorer

use thiserror::Error;

/// Result type alias for explorer operations
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Main error type for the model explorer.
///
/// The first four variants are the pipeline stages' failure modes; every one
/// of them aborts the current run. The rest are ambient failures of the
/// surrounding configuration, interaction and I/O layers.
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Split error: {0}")]
    Split(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interaction error: {0}")]
    Interaction(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ExplorerError {
    /// Whether this error belongs in the report area rather than aborting
    /// before any output is shown.
    pub fn is_training(&self) -> bool {
        matches!(self, ExplorerError::Training(_))
    }

    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ExplorerError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for ExplorerError {
    fn from(err: polars::error::PolarsError) -> Self {
        ExplorerError::DataLoad(err.to_string())
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ExplorerError {
    fn from(err: ndarray::ShapeError) -> Self {
        ExplorerError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<dialoguer::Error> for ExplorerError {
    fn from(err: dialoguer::Error) -> Self {
        ExplorerError::Interaction(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExplorerError::Split("test_proportion must lie in (0, 1)".to_string());
        assert_eq!(err.to_string(), "Split error: test_proportion must lie in (0, 1)");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExplorerError = io_err.into();
        assert!(matches!(err, ExplorerError::Io(_)));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = ExplorerError::invalid_parameter("max_depth", 42, "must lie in 1..=20");
        assert_eq!(err.to_string(), "Invalid parameter: max_depth = 42, must lie in 1..=20");
        assert!(!err.is_training());
    }
}
