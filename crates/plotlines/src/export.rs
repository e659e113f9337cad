//! Export functionality for Plotlines boards.
//!
//! This module provides the [`Exporter`] trait that defines the interface for
//! writing a laid-out [`Board`] to an output format. It is the final stage in
//! the Plotlines processing pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Configuration
//!     ↓ generate
//! Graph
//!     ↓ layout
//! Board (positioned and styled)
//!     ↓ export (this module)
//! Output files
//! ```
//!
//! # Available Backends
//!
//! - [`svg`]: SVG drawing via [`svg::SvgBuilder`] and [`svg::Svg`]
//! - [`document`]: the TOML board document, reloadable with [`Board::from_toml`]
//! - [`tree`]: a directory of TOML page files, one per node and edge
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`PlotlinesError::Export`] at the crate
//! boundary.
//!
//! [`PlotlinesError::Export`]: crate::PlotlinesError::Export

/// TOML board document backend.
pub mod document;
/// SVG export backend.
pub mod svg;
/// Page tree backend.
pub mod tree;

use std::{fs, path::Path};

use log::{error, info};

use crate::board::Board;

/// Abstraction for board export backends.
pub trait Exporter {
    /// Exports a board to the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the board cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_board(&mut self, board: &Board) -> Result<(), Error>;
}

/// Errors that can occur during board export.
///
/// This type is converted into [`PlotlinesError::Export`] at the crate
/// boundary via the [`From`] implementation in [`crate::error`].
///
/// [`PlotlinesError::Export`]: crate::PlotlinesError::Export
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

/// Writes `text` to `path`, logging the outcome.
fn write_text(path: &Path, text: &str) -> Result<(), Error> {
    if let Err(err) = fs::write(path, text) {
        error!(path:? = path, err:err; "Failed to write output file");
        return Err(Error::Io(err));
    }
    info!(path:? = path, bytes = text.len(); "Wrote output file");
    Ok(())
}
