//! Display style shared by every graph entity.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Stroke color, fill color and outline weight of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub stroke: Rgb,
    pub fill: Rgb,
    pub weight: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Rgb::BLACK,
            fill: Rgb::WHITE,
            weight: 1,
        }
    }
}

impl Style {
    /// Returns a copy with the given stroke color.
    pub fn with_stroke(self, stroke: Rgb) -> Self {
        Self { stroke, ..self }
    }

    /// Returns a copy with the given outline weight.
    pub fn with_weight(self, weight: u32) -> Self {
        Self { weight, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = Style::default();
        assert_eq!(style.stroke, Rgb::BLACK);
        assert_eq!(style.fill, Rgb::WHITE);
        assert_eq!(style.weight, 1);
    }

    #[test]
    fn test_partial_style_uses_defaults() {
        let style: Style = toml::from_str("weight = 3").unwrap();
        assert_eq!(style, Style::default().with_weight(3));
    }

    #[test]
    fn test_style_toml() {
        let style = Style::default().with_stroke(Rgb::new(10, 20, 30));
        let text = toml::to_string(&style).unwrap();
        assert!(text.contains("stroke = [10, 20, 30]"), "{text}");
        let back: Style = toml::from_str(&text).unwrap();
        assert_eq!(back, style);
    }
}
