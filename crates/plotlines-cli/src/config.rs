//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use plotlines::{PlotlinesError, config::AppConfig};

use crate::Args;

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for PlotlinesError {
    fn from(err: ConfigError) -> Self {
        PlotlinesError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            err.to_string(),
        ))
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (plotlines/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, PlotlinesError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("plotlines/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("org", "plotlines", "plotlines") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// Parse failures keep the file text so the span can be reported.
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, PlotlinesError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|err| PlotlinesError::new_parse_error(err, content))
}

/// Apply command-line overrides to the graph section.
pub fn apply_overrides(mut config: AppConfig, args: &Args) -> AppConfig {
    let mut graph = config.graph().clone();
    if let Some(limit) = args.limit {
        graph = graph.with_limit(limit);
    }
    if let Some(ending) = args.ending {
        graph = graph.with_ending(ending);
    }
    if let Some(exits) = args.exits {
        graph = graph.with_exits(exits);
    }
    if let Some(steps) = args.steps {
        graph = graph.with_steps(steps);
    }
    if let Some(seed) = args.seed {
        graph = graph.with_seed(seed);
    }
    if let Some(mode) = args.mode {
        graph = graph.with_mode(mode);
    }
    debug!(graph:?; "Graph configuration");
    *config.graph_mut() = graph;
    config
}
