//! CLI logic for the Plotlines story graph tool.
//!
//! This module contains the core CLI logic: load the configuration, apply
//! command-line overrides, generate or load a board, lay it out and write it
//! in the requested format.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Format};

use std::{fs, path::Path};

use log::info;

use plotlines::{PlotBuilder, PlotlinesError, board::Board};

/// Run the Plotlines CLI application
///
/// # Errors
///
/// Returns `PlotlinesError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Board document parsing errors
/// - Layout errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), PlotlinesError> {
    info!(
        output_path = args.output,
        format:? = args.format;
        "Processing story graph"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let app_config = config::apply_overrides(app_config, args);
    let builder = PlotBuilder::new(app_config);

    let mut board = match &args.load {
        Some(path) => load_board(&builder, path)?,
        None => builder.generate(),
    };
    if board.graph().nodes().any(|node| node.pos.is_none() || node.shape.is_empty()) {
        builder.layout(&mut board)?;
    }

    let output = Path::new(&args.output);
    match args.format {
        Format::Svg => builder.write_svg(&board, output)?,
        Format::Toml => builder.write_board(&board, output)?,
        Format::Tree => builder.write_tree(&board, output)?,
    }

    info!(
        output_path = args.output,
        nodes = board.graph().node_count(),
        edges = board.graph().edge_count();
        "Story graph exported successfully"
    );

    Ok(())
}

fn load_board(builder: &PlotBuilder, path: &str) -> Result<Board, PlotlinesError> {
    info!(input_path = path; "Loading board document");
    let source = fs::read_to_string(path)?;
    builder.load_board(&source)
}
