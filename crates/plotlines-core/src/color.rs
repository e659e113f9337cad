//! Color handling for Plotlines entities
//!
//! Entity styles store plain 8-bit [`Rgb`] triples so that they serialize as
//! `[r, g, b]` arrays. [`Rgb::parse`] accepts any CSS color string through
//! the `color` crate, which is how configuration files name colors.

use std::{fmt, str::FromStr};

use color::{DynamicColor, Srgb};
use serde::{Deserialize, Serialize};

/// An opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a CSS color string such as `"#ff0000"`, `"rgb(255, 0, 0)"` or
    /// `"red"`. Alpha is discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotlines_core::color::Rgb;
    ///
    /// assert_eq!(Rgb::parse("red").unwrap(), Rgb::new(255, 0, 0));
    /// assert!(Rgb::parse("not-a-color").is_err());
    /// ```
    pub fn parse(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => {
                let rgba = color.to_alpha_color::<Srgb>().to_rgba8();
                Ok(Self::new(rgba.r, rgba.g, rgba.b))
            }
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Returns a sanitized, ID-safe string representation of this color.
    pub fn to_id_safe_string(self) -> String {
        format!("hex{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(rgb: Rgb) -> Self {
        [rgb.r, rgb.g, rgb.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named() {
        assert_eq!(Rgb::parse("black").unwrap(), Rgb::BLACK);
        assert_eq!(Rgb::parse("white").unwrap(), Rgb::WHITE);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::parse("#0080ff").unwrap(), Rgb::new(0, 128, 255));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Rgb::parse("not-a-color").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "rgb(1, 2, 3)");
    }

    #[test]
    fn test_to_id_safe_string() {
        let id = Rgb::new(255, 128, 0).to_id_safe_string();
        assert_eq!(id, "hexff8000");
        assert!(id.chars().all(|c| c.is_alphanumeric()));
    }
}
