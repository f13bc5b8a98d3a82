//! Utility functions and types

pub mod data_loader;

pub use data_loader::{ColumnSummary, DataLoader, Dataset, DEFAULT_PREVIEW_ROWS};
