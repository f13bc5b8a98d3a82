//! Output surfaces

use crate::error::ExplorerError;
use polars::prelude::*;

/// Where a run renders its previews, parameters and report
pub trait Surface {
    fn heading(&mut self, text: &str);

    fn text(&mut self, text: &str);

    /// Tabular preview of a frame
    fn table(&mut self, frame: &DataFrame);

    /// Fixed-width text, rendered verbatim
    fn preformatted(&mut self, text: &str);

    fn error(&mut self, error: &ExplorerError);
}

/// One recorded rendering call
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceItem {
    Heading(String),
    Text(String),
    Table { columns: Vec<String>, rows: usize },
    Preformatted(String),
    Error(String),
}

/// Surface that records everything rendered on it
#[derive(Debug, Clone, Default)]
pub struct BufferSurface {
    items: Vec<SurfaceItem>,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SurfaceItem] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn errors(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SurfaceItem::Error(e) => Some(e.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<(&[String], usize)> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SurfaceItem::Table { columns, rows } => Some((columns.as_slice(), *rows)),
                _ => None,
            })
            .collect()
    }

    /// Whether any text, heading or preformatted block contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|item| match item {
            SurfaceItem::Heading(s) | SurfaceItem::Text(s) | SurfaceItem::Preformatted(s) => {
                s.contains(needle)
            }
            _ => false,
        })
    }
}

impl Surface for BufferSurface {
    fn heading(&mut self, text: &str) {
        self.items.push(SurfaceItem::Heading(text.to_string()));
    }

    fn text(&mut self, text: &str) {
        self.items.push(SurfaceItem::Text(text.to_string()));
    }

    fn table(&mut self, frame: &DataFrame) {
        self.items.push(SurfaceItem::Table {
            columns: frame
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            rows: frame.height(),
        });
    }

    fn preformatted(&mut self, text: &str) {
        self.items.push(SurfaceItem::Preformatted(text.to_string()));
    }

    fn error(&mut self, error: &ExplorerError) {
        self.items.push(SurfaceItem::Error(error.to_string()));
    }
}
