//! Configuration types for Plotlines generation and rendering.
//!
//! This module provides configuration structures that control how story
//! graphs are grown, laid out and styled. All types implement
//! [`serde::Deserialize`] and default every missing field, so a partial TOML
//! file is always valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the three sections.
//! - [`GraphConfig`] - Budget, exits, step ceiling, direction and seed of the builder.
//! - [`LayoutConfig`] - Target size and relaxation settings of the layout engine.
//! - [`StyleConfig`] - Default entity style, background and title.
//!
//! # Example
//!
//! ```
//! # use plotlines::config::AppConfig;
//! let config: AppConfig = toml::from_str("[graph]\nlimit = 24").unwrap();
//! assert_eq!(config.graph().limit(), 24);
//! assert_eq!(config.graph().ending(), 4);
//! assert!(config.style().background_color().is_ok());
//! ```

use serde::Deserialize;

use plotlines_core::{color::Rgb, identifier::IdScheme, style::Style};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Graph generation section.
    #[serde(default)]
    graph: GraphConfig,

    /// Layout section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(graph: GraphConfig, layout: LayoutConfig, style: StyleConfig) -> Self {
        Self {
            graph,
            layout,
            style,
        }
    }

    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphConfig {
        &mut self.graph
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Direction in which the builder grows the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Seed the endings and grow backwards towards the beginnings.
    #[default]
    Rtl,
    /// Seed the beginnings and grow forwards.
    Ltr,
}

impl Mode {
    /// Returns true when edges point away from the frontier.
    pub fn is_forward(self) -> bool {
        self == Self::Ltr
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rtl" => Ok(Self::Rtl),
            "ltr" => Ok(Self::Ltr),
            other => Err(format!("unknown mode `{other}`, expected `rtl` or `ltr`")),
        }
    }
}

/// Settings of the graph builder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Node plus edge budget.
    limit: usize,
    /// Number of seeded ending nodes.
    ending: usize,
    /// Per-node exit budget.
    exits: usize,
    /// Builder step ceiling.
    steps: usize,
    mode: Mode,
    seed: Option<u64>,
    ids: IdScheme,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            ending: 4,
            exits: 4,
            steps: 10,
            mode: Mode::default(),
            seed: None,
            ids: IdScheme::default(),
        }
    }
}

impl GraphConfig {
    /// Creates a config with the given budget, ending count, exits and step
    /// ceiling. Other fields keep their defaults.
    pub fn new(limit: usize, ending: usize, exits: usize, steps: usize) -> Self {
        Self {
            limit,
            ending,
            exits,
            steps,
            ..Self::default()
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn ending(&self) -> usize {
        self.ending
    }

    pub fn exits(&self) -> usize {
        self.exits
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn ids(&self) -> IdScheme {
        self.ids
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_ending(mut self, ending: usize) -> Self {
        self.ending = ending;
        self
    }

    pub fn with_exits(mut self, exits: usize) -> Self {
        self.exits = exits;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_ids(mut self, ids: IdScheme) -> Self {
        self.ids = ids;
        self
    }
}

/// Settings of the layout engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    width: f64,
    height: f64,
    /// Median crowding score at which relaxation stops.
    threshold: f64,
    /// Relaxation step ceiling. Zero means twice the item count.
    steps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            threshold: 0.1,
            steps: 0,
        }
    }
}

impl LayoutConfig {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Step ceiling for a board of `items` entities.
    pub fn steps_for(&self, items: usize) -> usize {
        if self.steps == 0 {
            2 * items
        } else {
            self.steps
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }
}

/// Visual styling configuration.
///
/// Colors are stored as strings and parsed on access so that a bad value is
/// reported with the configuration error rather than at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    stroke: String,
    fill: String,
    weight: u32,
    /// Optional background color, as a color string.
    background_color: Option<String>,
    title: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            stroke: "black".to_string(),
            fill: "white".to_string(),
            weight: 1,
            background_color: None,
            title: "Plotlines".to_string(),
        }
    }
}

impl StyleConfig {
    /// Returns the default entity [`Style`].
    ///
    /// # Errors
    ///
    /// Returns an error if either color string cannot be parsed.
    pub fn entity_style(&self) -> Result<Style, String> {
        let stroke =
            Rgb::parse(&self.stroke).map_err(|err| format!("Invalid stroke in config: {err}"))?;
        let fill = Rgb::parse(&self.fill).map_err(|err| format!("Invalid fill in config: {err}"))?;
        Ok(Style {
            stroke,
            fill,
            weight: self.weight,
        })
    }

    /// Returns the parsed background color, or `None` if none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Rgb>, String> {
        self.background_color
            .as_deref()
            .map(Rgb::parse)
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}
