//! Command-line argument definitions for the Plotlines CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the output format and path, the
//! configuration file, overrides of the graph section of that file, and
//! logging verbosity.

use clap::{Parser, ValueEnum};

use plotlines::config::Mode;

/// Output formats the CLI can write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// SVG drawing
    #[default]
    Svg,
    /// Reloadable TOML board document
    Toml,
    /// Directory of TOML pages
    Tree,
}

/// Command-line arguments for the Plotlines story graph tool
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Output file, or output directory for the page tree
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Svg)]
    pub format: Format,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Load a saved board document instead of generating a new graph
    #[arg(long)]
    pub load: Option<String>,

    /// Node and edge budget
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of seeded ending nodes
    #[arg(long)]
    pub ending: Option<usize>,

    /// Per-node exit budget
    #[arg(long)]
    pub exits: Option<usize>,

    /// Builder step ceiling
    #[arg(long)]
    pub steps: Option<usize>,

    /// Random seed for reproducible graphs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Growth direction (rtl, ltr)
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
