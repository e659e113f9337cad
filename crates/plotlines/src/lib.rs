//! Plotlines - procedural generation of branching story graphs.
//!
//! A story graph is grown from a handful of seeded endings by repeatedly
//! applying small structural motifs (forks, joins, detours and loops) under
//! a node and edge budget. The result is laid out in zone columns, styled
//! into a [`board::Board`], and exported as SVG, as a reloadable TOML board
//! document, or as a tree of TOML pages.
//!
//! # Pipeline
//!
//! ```text
//! AppConfig
//!     ↓ generate   (builder, motif)
//! Board
//!     ↓ layout     (layout, board styling)
//! Board with positions and glyphs
//!     ↓ export     (export::svg, export::document, export::tree)
//! Output
//! ```

pub mod board;
pub mod builder;
pub mod config;
pub mod export;
pub mod layout;
pub mod motif;

mod error;

pub use plotlines_core::{color, geometry, graph, identifier, style};

pub use error::PlotlinesError;

use std::path::Path;

use log::{debug, info};

use plotlines_core::geometry::Size;

use board::Board;
use builder::GraphBuilder;
use config::AppConfig;
use export::{Exporter, svg::Svg};
use layout::{Engine, Layout};

/// Builder for generating, laying out and exporting story boards.
///
/// # Examples
///
/// ```
/// use plotlines::{PlotBuilder, config::{AppConfig, GraphConfig, LayoutConfig, StyleConfig}};
///
/// let config = AppConfig::new(
///     GraphConfig::new(40, 3, 3, 6).with_seed(11),
///     LayoutConfig::default(),
///     StyleConfig::default(),
/// );
/// let builder = PlotBuilder::new(config);
///
/// let mut board = builder.generate();
/// builder.layout(&mut board).unwrap();
///
/// let svg = builder.render_svg(&board).unwrap();
/// assert!(svg.contains("<svg"));
///
/// // Boards survive a round trip through their TOML document.
/// let text = builder.board_toml(&board).unwrap();
/// let loaded = builder.load_board(&text).unwrap();
/// assert_eq!(loaded.graph().len(), board.graph().len());
/// ```
#[derive(Debug, Default)]
pub struct PlotBuilder {
    config: AppConfig,
}

impl PlotBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Target drawing size from the layout configuration.
    pub fn size(&self) -> Size {
        Size::new(self.config.layout().width(), self.config.layout().height())
    }

    /// Grow a new story graph and wrap it in an unplaced board.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotlines::{PlotBuilder, config::{AppConfig, GraphConfig}};
    ///
    /// let mut config = AppConfig::default();
    /// *config.graph_mut() = GraphConfig::new(7, 3, 3, 1).with_seed(1);
    ///
    /// let board = PlotBuilder::new(config).generate();
    /// assert_eq!(board.graph().node_count(), 4);
    /// assert_eq!(board.terminal().len(), 3);
    /// ```
    pub fn generate(&self) -> Board {
        let mut builder = GraphBuilder::new(self.config.graph());
        let items = builder.by_ref().count();
        debug!(items, steps = builder.step(); "Builder exhausted");
        Board::new(builder.into_graph(), self.config.style().title())
    }

    /// Place every node of the board and assign node glyphs.
    ///
    /// # Errors
    ///
    /// Returns [`PlotlinesError::Layout`] if the configured size has no area.
    pub fn layout(&self, board: &mut Board) -> Result<Layout, PlotlinesError> {
        let size = self.size();
        if !(size.width() > 0.0 && size.height() > 0.0) {
            return Err(PlotlinesError::Layout(format!(
                "layout size must be positive, got {}x{}",
                size.width(),
                size.height()
            )));
        }

        let mut engine = Engine::new();
        engine
            .set_threshold(self.config.layout().threshold())
            .set_step_limit(self.config.layout().steps_for(board.graph().len()));
        let layout = engine.run(board.graph_mut(), size);
        let view = board.style_items(size);
        info!(steps = layout.steps(), shapes = board.shapes().len(), scale:% = view.scale; "Board laid out");
        Ok(layout)
    }

    /// Render the board to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`PlotlinesError::Config`] if a configured color is invalid.
    pub fn render_svg(&self, board: &Board) -> Result<String, PlotlinesError> {
        let svg = self.svg_exporter(Path::new(""))?;
        Ok(svg.render_board(board).to_string())
    }

    /// Write the board as an SVG file.
    pub fn write_svg(&self, board: &Board, path: &Path) -> Result<(), PlotlinesError> {
        self.svg_exporter(path)?.export_board(board)?;
        Ok(())
    }

    /// Serialize the board as a TOML board document.
    pub fn board_toml(&self, board: &Board) -> Result<String, PlotlinesError> {
        board.to_toml()
    }

    /// Write the board document to `path`.
    pub fn write_board(&self, board: &Board, path: &Path) -> Result<(), PlotlinesError> {
        export::document::DocumentWriter::new(path).export_board(board)?;
        Ok(())
    }

    /// Restore a board from TOML board document text.
    ///
    /// # Errors
    ///
    /// Returns [`PlotlinesError::Parse`] for malformed TOML and
    /// [`PlotlinesError::Graph`] for records that cannot be rebuilt.
    pub fn load_board(&self, source: &str) -> Result<Board, PlotlinesError> {
        Board::from_toml(source)
    }

    /// Write the board as a tree of TOML pages under `parent`.
    pub fn write_tree(&self, board: &Board, parent: &Path) -> Result<(), PlotlinesError> {
        export::tree::Tree::new(parent).export_board(board)?;
        Ok(())
    }

    fn svg_exporter(&self, path: &Path) -> Result<Svg, PlotlinesError> {
        let style = self.config.style();
        style.entity_style().map_err(PlotlinesError::Config)?;
        style.background_color().map_err(PlotlinesError::Config)?;
        Ok(export::svg::SvgBuilder::new(path)
            .with_style(style)
            .with_size(self.size())
            .build()?)
    }
}
