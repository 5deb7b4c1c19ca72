//! Configuration types for Flowprint exports.
//!
//! This module provides configuration structures that control how diagrams
//! are exported. All types implement [`serde::Deserialize`] for flexible
//! loading from external sources; every field has a default, so a partial
//! configuration file only overrides what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`ExportConfig`] - Settings shared by all formats (padding, file name).
//! - [`RasterConfig`] - PNG/PDF capture settings (pixel ratio, fonts).
//! - [`VectorConfig`] - SVG reconstruction settings (node box and label look).
//! - [`ChromeConfig`] - Which interactive overlays are left out of captures.
//!
//! # Example
//!
//! ```
//! # use flowprint::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.export().padding(), 50.0);
//! assert_eq!(config.raster().pixel_ratio(), 6.0);
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use flowprint_core::{
    color::Color,
    scene::{BACKGROUND_CLASS, CONTROLS_CLASS, MINIMAP_CLASS},
};

use crate::bounds::DEFAULT_PADDING;

/// Lowest accepted raster pixel ratio.
pub const MIN_PIXEL_RATIO: f32 = 1.0;
/// Highest accepted raster pixel ratio.
pub const MAX_PIXEL_RATIO: f32 = 8.0;

fn color(value: &str) -> Color {
    Color::new(value).expect("built-in color literals are valid")
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    export: ExportConfig,

    #[serde(default)]
    raster: RasterConfig,

    #[serde(default)]
    vector: VectorConfig,

    #[serde(default)]
    chrome: ChromeConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        export: ExportConfig,
        raster: RasterConfig,
        vector: VectorConfig,
        chrome: ChromeConfig,
    ) -> Self {
        Self {
            export,
            raster,
            vector,
            chrome,
        }
    }

    pub fn export(&self) -> &ExportConfig {
        &self.export
    }

    pub fn raster(&self) -> &RasterConfig {
        &self.raster
    }

    pub fn vector(&self) -> &VectorConfig {
        &self.vector
    }

    pub fn chrome(&self) -> &ChromeConfig {
        &self.chrome
    }
}

/// Settings shared by every export format.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Space added around the visible nodes, in scene units.
    padding: f32,

    /// File name stem used when the caller does not supply one.
    base_filename: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            base_filename: "graph".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn new(padding: f32, base_filename: impl Into<String>) -> Self {
        Self {
            padding,
            base_filename: base_filename.into(),
        }
    }

    /// Returns the padding; negative values count as zero.
    pub fn padding(&self) -> f32 {
        self.padding.max(0.0)
    }

    pub fn base_filename(&self) -> &str {
        &self.base_filename
    }
}

/// Raster (PNG and PDF) capture settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Oversampling factor between scene units and output pixels.
    pixel_ratio: f32,

    /// Color the bitmap is filled with before the scene is drawn.
    background_color: Color,

    /// Whether installed system fonts are available to text rendering.
    load_system_fonts: bool,

    /// Extra directories to load fonts from.
    font_dirs: Vec<PathBuf>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 6.0,
            background_color: Color::white(),
            load_system_fonts: true,
            font_dirs: Vec::new(),
        }
    }
}

impl RasterConfig {
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    pub fn with_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    /// Returns the pixel ratio, clamped to the supported range.
    ///
    /// A non-finite ratio falls back to the default.
    pub fn pixel_ratio(&self) -> f32 {
        if self.pixel_ratio.is_finite() {
            self.pixel_ratio.clamp(MIN_PIXEL_RATIO, MAX_PIXEL_RATIO)
        } else {
            Self::default().pixel_ratio
        }
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn load_system_fonts(&self) -> bool {
        self.load_system_fonts
    }

    pub fn font_dirs(&self) -> &[PathBuf] {
        &self.font_dirs
    }
}

/// SVG reconstruction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    background_color: Color,
    corner_radius: f32,
    stroke_width: f32,
    label_font_family: String,
    label_font_size: f32,
    label_color: Color,
    /// Node fill when the node has no element in the scene.
    default_fill: Color,
    /// Node border when the node has no element in the scene.
    default_border: Color,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            background_color: Color::white(),
            corner_radius: 8.0,
            stroke_width: 2.0,
            label_font_family: "system-ui, -apple-system, sans-serif".to_string(),
            label_font_size: 14.0,
            label_color: color("#111827"),
            default_fill: Color::white(),
            default_border: color("#e5e7eb"),
        }
    }
}

impl VectorConfig {
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn label_font_family(&self) -> &str {
        &self.label_font_family
    }

    pub fn label_font_size(&self) -> f32 {
        self.label_font_size
    }

    pub fn label_color(&self) -> Color {
        self.label_color
    }

    pub fn default_fill(&self) -> Color {
        self.default_fill
    }

    pub fn default_border(&self) -> Color {
        self.default_border
    }
}

/// Interactive overlays that never appear in an export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    excluded_classes: Vec<String>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            excluded_classes: vec![
                CONTROLS_CLASS.to_string(),
                MINIMAP_CLASS.to_string(),
                BACKGROUND_CLASS.to_string(),
            ],
        }
    }
}

impl ChromeConfig {
    pub fn new(excluded_classes: Vec<String>) -> Self {
        Self { excluded_classes }
    }

    pub fn excluded_classes(&self) -> &[String] {
        &self.excluded_classes
    }

    /// Returns true if an element with `classes` is chrome.
    pub fn is_excluded<S: AsRef<str>>(&self, classes: &[S]) -> bool {
        classes
            .iter()
            .any(|class| self.excluded_classes.iter().any(|ex| ex == class.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.export().padding(), 50.0);
        assert_eq!(config.export().base_filename(), "graph");
        assert_eq!(config.raster().pixel_ratio(), 6.0);
        assert!(config.raster().load_system_fonts());
        assert_eq!(config.vector().corner_radius(), 8.0);
        assert_eq!(config.vector().stroke_width(), 2.0);
        assert_eq!(config.vector().label_font_size(), 14.0);
        assert_eq!(config.vector().label_color().to_hex(), "#111827");
        assert_eq!(config.vector().default_border().to_hex(), "#e5e7eb");
        assert_eq!(config.chrome().excluded_classes().len(), 3);
    }

    #[test]
    fn test_pixel_ratio_is_clamped() {
        assert_eq!(RasterConfig::default().with_pixel_ratio(0.1).pixel_ratio(), 1.0);
        assert_eq!(RasterConfig::default().with_pixel_ratio(20.0).pixel_ratio(), 8.0);
        assert_eq!(RasterConfig::default().with_pixel_ratio(2.0).pixel_ratio(), 2.0);
        assert_eq!(
            RasterConfig::default().with_pixel_ratio(f32::NAN).pixel_ratio(),
            6.0
        );
    }

    #[test]
    fn test_negative_padding_counts_as_zero() {
        assert_eq!(ExportConfig::new(-10.0, "g").padding(), 0.0);
    }

    #[test]
    fn test_chrome_filter() {
        let chrome = ChromeConfig::default();
        assert!(chrome.is_excluded(&["react", "flow__minimap"]));
        assert!(!chrome.is_excluded(&["flow__viewport"]));
        assert!(!chrome.is_excluded(&[] as &[&str]));
    }

    #[test]
    fn test_partial_deserialize() {
        let json = r##"{
            "export": { "base_filename": "pipeline" },
            "raster": { "pixel_ratio": 2 },
            "vector": { "label_color": "#000000" }
        }"##;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.export().base_filename(), "pipeline");
        assert_eq!(config.export().padding(), 50.0);
        assert_eq!(config.raster().pixel_ratio(), 2.0);
        assert_eq!(config.vector().label_color().to_hex(), "#000000");
        assert_eq!(config.vector().corner_radius(), 8.0);
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let json = r#"{ "vector": { "label_color": "not-a-color" } }"#;
        let result: Result<AppConfig, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
