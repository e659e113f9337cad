//! Error types for Plotlines operations.
//!
//! This module provides the main error type [`PlotlinesError`] which wraps
//! the error conditions that can occur while generating, loading, laying out
//! and exporting story graphs.

use std::io;

use thiserror::Error;

/// The main error type for Plotlines operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the TOML source text next to the parser error,
/// whose span points into it. This is enough for rich error reporting.
#[derive(Debug, Error)]
pub enum PlotlinesError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: toml::de::Error, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph error: {0}")]
    Graph(#[from] plotlines_core::Error),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for PlotlinesError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl PlotlinesError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: toml::de::Error, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
