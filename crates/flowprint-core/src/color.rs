//! Color handling for Flowprint scenes.
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Scene styles are authored as CSS color strings, and
//! exporters need them in a form every SVG consumer understands, so colors are
//! always written out as `#rrggbb` plus a separate opacity.

use std::{
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{DynamicColor, Srgb};
use serde::{Deserialize, Deserializer};

/// Wrapper around the `DynamicColor` type from the color crate.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_hex().hash(state);
        self.alpha().to_bits().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a string.
    /// This will parse CSS color strings such as "#ff0000", "rgb(255, 0, 0)", "red", etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprint_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str.trim()) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Opaque white, the export background.
    pub fn white() -> Self {
        Self::new("#ffffff").expect("'#ffffff' is a valid CSS color")
    }

    /// Returns the color as an sRGB `#rrggbb` string, ignoring alpha.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprint_core::color::Color;
    ///
    /// assert_eq!(Color::new("white").unwrap().to_hex(), "#ffffff");
    /// assert_eq!(Color::new("rgb(229, 231, 235)").unwrap().to_hex(), "#e5e7eb");
    /// ```
    pub fn to_hex(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Returns the 8-bit sRGB components, alpha last.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        [rgba.r, rgba.g, rgba.b, rgba.a]
    }

    /// Creates a new color with the specified alpha (transparency) value.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprint_core::color::Color;
    ///
    /// let red = Color::new("red").unwrap();
    /// let semi_transparent_red = red.with_alpha(0.5);
    /// assert_eq!(semi_transparent_red.alpha(), 0.5);
    /// ```
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha component, 0.0 (transparent) to 1.0 (opaque).
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }

    /// Returns true when the color cannot be seen at all.
    pub fn is_transparent(&self) -> bool {
        self.alpha() <= 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        Self::from(color.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_new() {
        let red = Color::new("#ff0000");
        assert!(red.is_ok());

        let invalid = Color::new("not-a-color");
        assert!(invalid.is_err());
        assert!(invalid.unwrap_err().contains("invalid color"));
    }

    #[test]
    fn test_color_to_hex() {
        assert_eq!(Color::new("#ff0000").unwrap().to_hex(), "#ff0000");
        assert_eq!(Color::new("white").unwrap().to_hex(), "#ffffff");
        assert_eq!(Color::new("#111827").unwrap().to_hex(), "#111827");
        assert_eq!(Color::new("rgb(177, 177, 183)").unwrap().to_hex(), "#b1b1b7");
    }

    #[test]
    fn test_color_to_hex_ignores_alpha() {
        let color = Color::new("rgba(255, 0, 0, 0.5)").unwrap();
        assert_eq!(color.to_hex(), "#ff0000");
        assert_eq!(color.alpha(), 0.5);
    }

    #[test]
    fn test_color_default_is_black() {
        let color = Color::default();
        assert_eq!(color.to_hex(), "#000000");
        assert_eq!(color.alpha(), 1.0);
    }

    #[test]
    fn test_color_white() {
        assert_eq!(Color::white().to_rgba8(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_color_transparent() {
        assert!(Color::new("rgba(0, 0, 0, 0)").unwrap().is_transparent());
        assert!(!Color::new("red").unwrap().is_transparent());
    }

    #[test]
    fn test_color_trims_whitespace() {
        assert_eq!(Color::new("  #e5e7eb ").unwrap().to_hex(), "#e5e7eb");
    }

    #[test]
    fn test_color_deserialize() {
        let color: Color = serde_json::from_str("\"#3b82f6\"").unwrap();
        assert_eq!(color.to_hex(), "#3b82f6");

        let invalid: Result<Color, _> = serde_json::from_str("\"nope\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn test_color_svg_value() {
        let color = Color::new("red").unwrap();
        let value = svg::node::Value::from(&color);
        assert_eq!(value.to_string(), "#ff0000");
    }
}
