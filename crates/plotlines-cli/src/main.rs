//! Plotlines CLI entry point.

use std::{process::ExitCode, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use miette::GraphicalReportHandler;

use plotlines_cli::{
    Args,
    error_adapter::{Reportable, to_reportables},
};

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    match plotlines_cli::run(&args) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(to_reportables(&err));
            ExitCode::FAILURE
        }
    }
}

/// Installs `env_logger`, falling back to `warn` for an unknown level name.
fn init_logging(level: &str) {
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Plotlines");
}

fn report(reportables: Vec<Reportable<'_>>) {
    let handler = GraphicalReportHandler::new();
    for reportable in &reportables {
        error!("{}", render(&handler, reportable));
    }
}

/// Graphical rendering of a diagnostic, or its plain message if the handler
/// gives up.
fn render(handler: &GraphicalReportHandler, reportable: &Reportable<'_>) -> String {
    let mut out = String::new();
    match handler.render_report(&mut out, reportable) {
        Ok(()) => out,
        Err(_) => reportable.to_string(),
    }
}
