//! Style declarations and cascade resolution.
//!
//! Scene elements carry *declared* styles: whatever the author wrote inline,
//! plus rules from the scene stylesheet that match the element's classes.
//! Exporters never look at declared styles directly. They ask for the
//! [`ResolvedStyle`], the effective value of every visual property after the
//! cascade and inheritance have been applied.
//!
//! # Overview
//!
//! - [`Paint`]: an SVG paint value, either `none` or a [`Color`]
//! - [`StyleDeclaration`]: a partial, authored set of properties
//! - [`Stylesheet`]: class-selector rules applied in source order
//! - [`ResolvedStyle`]: the complete computed style of one element
//! - [`apply_paint!`](crate::apply_paint!): macro writing resolved paint onto SVG elements
//!
//! # Cascade
//!
//! For a given element, resolution starts from the parent's resolved style
//! (inherited properties only, everything else reset to its initial value),
//! then applies matching stylesheet rules in source order, then the inline
//! declaration. Later sources win.
//!
//! | Property | Inherited | Initial value |
//! |----------|-----------|---------------|
//! | `stroke` | yes | `none` |
//! | `stroke-width` | yes | `1` |
//! | `fill` | yes | `black` |
//! | `marker-start`, `marker-end` | yes | none |
//! | `color`, `font-family`, `font-size` | yes | `black`, `sans-serif`, `16` |
//! | `opacity` | no | `1` |
//! | `background-color`, `border-color` | no | none |
//! | `border-width`, `border-radius` | no | `0` |

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::color::Color;

/// An SVG paint value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paint {
    /// Nothing is painted.
    #[default]
    None,
    /// Painted with a solid color.
    Color(Color),
}

impl Paint {
    /// Returns the SVG attribute value: `none` or `#rrggbb`.
    pub fn to_svg_value(&self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::Color(color) => color.to_hex(),
        }
    }

    /// Returns the paint's own alpha when it is not fully opaque.
    pub fn translucent_alpha(&self) -> Option<f32> {
        match self {
            Self::Color(color) if color.alpha() < 1.0 => Some(color.alpha()),
            _ => None,
        }
    }

    /// Returns the color, if anything is painted.
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::None => None,
            Self::Color(color) => Some(*color),
        }
    }
}

impl FromStr for Paint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Self::None),
            other => Color::new(other).map(Self::Color),
        }
    }
}

impl<'de> Deserialize<'de> for Paint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A partial set of authored style properties.
///
/// Every property is optional; unset properties fall through to earlier
/// cascade sources. Marker values use the SVG syntax `url(#id)`, and the
/// literal `none` clears an inherited marker.
///
/// # Examples
///
/// ```
/// use flowprint_core::style::{Paint, StyleDeclaration};
///
/// let edge = StyleDeclaration::new()
///     .with_stroke("#b1b1b7".parse::<Paint>().unwrap())
///     .with_stroke_width(1.5)
///     .with_marker_end("url(#arrow)");
/// assert_eq!(edge.stroke_width(), Some(1.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StyleDeclaration {
    stroke: Option<Paint>,
    stroke_width: Option<f32>,
    fill: Option<Paint>,
    opacity: Option<f32>,
    marker_start: Option<String>,
    marker_end: Option<String>,
    background_color: Option<Color>,
    border_color: Option<Color>,
    border_width: Option<f32>,
    border_radius: Option<f32>,
    color: Option<Color>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

impl StyleDeclaration {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stroke(mut self, stroke: Paint) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_fill(mut self, fill: Paint) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_marker_start(mut self, marker: impl Into<String>) -> Self {
        self.marker_start = Some(marker.into());
        self
    }

    pub fn with_marker_end(mut self, marker: impl Into<String>) -> Self {
        self.marker_end = Some(marker.into());
        self
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_border_color(mut self, color: Color) -> Self {
        self.border_color = Some(color);
        self
    }

    pub fn with_border_width(mut self, width: f32) -> Self {
        self.border_width = Some(width);
        self
    }

    pub fn with_border_radius(mut self, radius: f32) -> Self {
        self.border_radius = Some(radius);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn stroke_width(&self) -> Option<f32> {
        self.stroke_width
    }

    /// Returns true if no property is declared.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrites every property of `target` that this declaration sets.
    fn apply_to(&self, target: &mut ResolvedStyle) {
        if let Some(stroke) = self.stroke {
            target.stroke = stroke;
        }
        if let Some(width) = self.stroke_width {
            target.stroke_width = width;
        }
        if let Some(fill) = self.fill {
            target.fill = fill;
        }
        if let Some(opacity) = self.opacity {
            target.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(marker) = &self.marker_start {
            target.marker_start = marker_reference(marker);
        }
        if let Some(marker) = &self.marker_end {
            target.marker_end = marker_reference(marker);
        }
        if let Some(color) = self.background_color {
            target.background_color = Some(color);
        }
        if let Some(color) = self.border_color {
            target.border_color = Some(color);
        }
        if let Some(width) = self.border_width {
            target.border_width = width;
        }
        if let Some(radius) = self.border_radius {
            target.border_radius = radius;
        }
        if let Some(color) = self.color {
            target.color = color;
        }
        if let Some(family) = &self.font_family {
            target.font_family.clone_from(family);
        }
        if let Some(size) = self.font_size {
            target.font_size = size;
        }
    }
}

fn marker_reference(value: &str) -> Option<String> {
    match value.trim() {
        "" | "none" => None,
        other => Some(other.to_string()),
    }
}

/// A stylesheet rule matching every element that carries `class`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StyleRule {
    class: String,
    #[serde(default)]
    style: StyleDeclaration,
}

impl StyleRule {
    pub fn new(class: impl Into<String>, style: StyleDeclaration) -> Self {
        Self {
            class: class.into(),
            style,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

/// Ordered class-selector rules.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; later rules win over earlier ones.
    pub fn add_rule(&mut self, rule: StyleRule) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, class: impl Into<String>, style: StyleDeclaration) -> Self {
        self.add_rule(StyleRule::new(class, style));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules matching any of `classes`, in source order.
    pub fn matching<'a, S>(&'a self, classes: &'a [S]) -> impl Iterator<Item = &'a StyleRule> + 'a
    where
        S: AsRef<str>,
    {
        self.rules
            .iter()
            .filter(move |rule| classes.iter().any(|class| class.as_ref() == rule.class))
    }
}

/// The computed style of one scene element.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    stroke: Paint,
    stroke_width: f32,
    fill: Paint,
    opacity: f32,
    marker_start: Option<String>,
    marker_end: Option<String>,
    background_color: Option<Color>,
    border_color: Option<Color>,
    border_width: f32,
    border_radius: f32,
    color: Color,
    font_family: String,
    font_size: f32,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            stroke: Paint::None,
            stroke_width: 1.0,
            fill: Paint::Color(Color::default()),
            opacity: 1.0,
            marker_start: None,
            marker_end: None,
            background_color: None,
            border_color: None,
            border_width: 0.0,
            border_radius: 0.0,
            color: Color::default(),
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
        }
    }
}

impl ResolvedStyle {
    /// Resolves the style of an element.
    ///
    /// # Arguments
    ///
    /// * `parent` - Resolved style of the parent element, `None` for the root
    /// * `stylesheet` - Scene stylesheet
    /// * `classes` - Classes carried by the element
    /// * `inline` - The element's own declaration
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprint_core::style::{Paint, ResolvedStyle, StyleDeclaration, Stylesheet};
    ///
    /// let sheet = Stylesheet::new().with_rule(
    ///     "edge",
    ///     StyleDeclaration::new().with_stroke("#b1b1b7".parse::<Paint>().unwrap()),
    /// );
    /// let style = ResolvedStyle::cascade(None, &sheet, &["edge"], &StyleDeclaration::new());
    /// assert_eq!(style.stroke().to_svg_value(), "#b1b1b7");
    /// ```
    pub fn cascade<S: AsRef<str>>(
        parent: Option<&ResolvedStyle>,
        stylesheet: &Stylesheet,
        classes: &[S],
        inline: &StyleDeclaration,
    ) -> Self {
        let mut resolved = parent.map(Self::inherited_from).unwrap_or_default();
        for rule in stylesheet.matching(classes) {
            rule.style.apply_to(&mut resolved);
        }
        inline.apply_to(&mut resolved);
        resolved
    }

    /// Inherited properties of `parent`, everything else at initial values.
    fn inherited_from(parent: &ResolvedStyle) -> Self {
        Self {
            stroke: parent.stroke,
            stroke_width: parent.stroke_width,
            fill: parent.fill,
            marker_start: parent.marker_start.clone(),
            marker_end: parent.marker_end.clone(),
            color: parent.color,
            font_family: parent.font_family.clone(),
            font_size: parent.font_size,
            ..Self::default()
        }
    }

    pub fn stroke(&self) -> Paint {
        self.stroke
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn fill(&self) -> Paint {
        self.fill
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn marker_start(&self) -> Option<&str> {
        self.marker_start.as_deref()
    }

    pub fn marker_end(&self) -> Option<&str> {
        self.marker_end.as_deref()
    }

    /// Background color; `None` means transparent.
    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn border_color(&self) -> Option<Color> {
        self.border_color
    }

    pub fn border_width(&self) -> f32 {
        self.border_width
    }

    pub fn border_radius(&self) -> f32 {
        self.border_radius
    }

    /// Text color.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }
}

/// Write resolved stroke, stroke width, fill and opacity onto an SVG element.
///
/// Paint alpha goes to `stroke-opacity`/`fill-opacity` so that `stroke` and
/// `fill` stay plain `#rrggbb` values.
///
/// # Examples
///
/// ```
/// use flowprint_core::style::ResolvedStyle;
/// use svg::node::element as svg_element;
///
/// let style = ResolvedStyle::default();
/// let path = svg_element::Path::new().set("d", "M 0 0 L 10 10");
/// let path = flowprint_core::apply_paint!(path, &style);
/// ```
#[macro_export]
macro_rules! apply_paint {
    ($element:expr, $style:expr) => {{
        let mut elem = $element
            .set("stroke", $style.stroke().to_svg_value())
            .set("stroke-width", $style.stroke_width())
            .set("fill", $style.fill().to_svg_value())
            .set("opacity", $style.opacity());

        if let Some(alpha) = $style.stroke().translucent_alpha() {
            elem = elem.set("stroke-opacity", alpha);
        }
        if let Some(alpha) = $style.fill().translucent_alpha() {
            elem = elem.set("fill-opacity", alpha);
        }

        elem
    }};
}
