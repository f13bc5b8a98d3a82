//! Data loading utilities

use crate::error::{ExplorerError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Number of rows shown in tabular previews
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// A loaded table with case-normalized, unique column names
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    source: Option<PathBuf>,
}

impl Dataset {
    /// Wrap an in-memory frame, lower-casing its column names.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        Ok(Self {
            frame: lowercase_columns(frame)?,
            source: None,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Path the dataset was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Column names sorted alphabetically, the order target options are offered in
    pub fn sorted_column_names(&self) -> Vec<String> {
        let mut names = self.column_names();
        names.sort();
        names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> DataFrame {
        self.frame.head(Some(n))
    }

    /// Per-column listing: name, dtype, nulls and distinct count
    pub fn column_summaries(&self) -> Vec<ColumnSummary> {
        self.frame
            .get_columns()
            .iter()
            .map(|col| ColumnSummary {
                name: col.name().to_string(),
                dtype: format!("{}", col.dtype()),
                null_count: col.null_count(),
                n_unique: col.n_unique().unwrap_or(0),
            })
            .collect()
    }
}

/// One row of the column listing
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub n_unique: usize,
}

/// Reads delimited text files into a [`Dataset`]
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Field separator; `None` picks one from the file extension
    delimiter: Option<u8>,
    /// Rows used for schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            delimiter: None,
            infer_schema_length: 100,
        }
    }

    /// Force a field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a delimited text file with a header row.
    ///
    /// Column names are lower-cased. Fails with [`ExplorerError::DataLoad`]
    /// when the file is missing or unreadable, when its content does not
    /// parse as a table, or when two names collide after lower-casing.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ExplorerError::DataLoad(format!("cannot open {}: {}", path.display(), e))
        })?;

        let delimiter = self.delimiter.unwrap_or_else(|| delimiter_for(path));
        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| {
                ExplorerError::DataLoad(format!("cannot parse {}: {}", path.display(), e))
            })?;

        if frame.width() == 0 {
            return Err(ExplorerError::DataLoad(format!(
                "{} contains no columns",
                path.display()
            )));
        }

        let frame = lowercase_columns(frame)?;
        info!(
            path = %path.display(),
            rows = frame.height(),
            cols = frame.width(),
            "loaded dataset"
        );

        Ok(Dataset {
            frame,
            source: Some(path.to_path_buf()),
        })
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

fn lowercase_columns(frame: DataFrame) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(frame.width());

    for column in frame.get_columns() {
        let lowered = column.name().to_lowercase();
        if !seen.insert(lowered.clone()) {
            return Err(ExplorerError::DataLoad(format!(
                "column name '{}' is not unique after lower-casing",
                lowered
            )));
        }
        if lowered != column.name().as_str() {
            debug!(from = %column.name(), to = %lowered, "normalized column name");
        }
        columns.push(column.clone().with_name(lowered.into()));
    }

    Ok(DataFrame::new(columns)?)
}
