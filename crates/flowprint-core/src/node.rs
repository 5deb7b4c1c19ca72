//! Diagram nodes as reported by the diagram engine.
//!
//! A [`Node`] is a read-only snapshot: the engine owns and mutates the live
//! node, exporters only look at the values captured here.

use serde::Deserialize;

use crate::geometry::{Bounds, Point, Size};

/// Width used by the scene renderer for nodes that have not been measured.
pub const DEFAULT_NODE_WIDTH: f32 = 280.0;

/// Height used by the scene renderer for nodes that have not been measured.
pub const DEFAULT_NODE_HEIGHT: f32 = 100.0;

/// A positioned diagram node.
///
/// # Examples
///
/// ```
/// use flowprint_core::{geometry::Point, node::Node};
///
/// let node = Node::new(Point::new(10.0, 20.0)).with_id("a");
/// assert_eq!(node.size().width(), 280.0);
/// assert!(node.is_visible());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Node {
    #[serde(default)]
    id: Option<String>,
    position: Point,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
    #[serde(default)]
    hidden: bool,
}

impl Node {
    /// Creates a visible node of default size at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.width = Some(size.width());
        self.height = Some(size.height());
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Returns the node identifier, if the engine assigned one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the top-left corner in scene coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Returns the node size with renderer defaults substituted.
    ///
    /// A dimension that is missing, zero or NaN counts as unmeasured, which is
    /// how the renderer itself decides to fall back to its default size.
    pub fn size(&self) -> Size {
        Size::new(
            measured_or(self.width, DEFAULT_NODE_WIDTH),
            measured_or(self.height, DEFAULT_NODE_HEIGHT),
        )
    }

    /// Returns the unpadded area covered by the node.
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position, self.size())
    }
}

fn measured_or(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults() {
        let node = Node::new(Point::new(0.0, 0.0));
        assert_eq!(node.id(), None);
        assert!(node.is_visible());
        assert_eq!(node.size(), Size::new(280.0, 100.0));
    }

    #[test]
    fn test_node_explicit_size() {
        let node = Node::new(Point::new(5.0, 6.0)).with_size(Size::new(120.0, 40.0));
        assert_eq!(node.size(), Size::new(120.0, 40.0));
        assert_eq!(node.bounds(), Bounds::new(5.0, 6.0, 125.0, 46.0));
    }

    #[test]
    fn test_node_unmeasured_dimensions_fall_back() {
        let zero = Node::new(Point::default()).with_size(Size::new(0.0, 0.0));
        assert_eq!(zero.size(), Size::new(DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT));

        let nan = Node::new(Point::default()).with_size(Size::new(f32::NAN, 30.0));
        assert_eq!(nan.size(), Size::new(DEFAULT_NODE_WIDTH, 30.0));
    }

    #[test]
    fn test_node_hidden() {
        let node = Node::new(Point::new(1000.0, 1000.0)).with_hidden(true);
        assert!(!node.is_visible());
    }

    #[test]
    fn test_node_deserialize() {
        let json = r#"[
            {"id": "a", "position": {"x": 0, "y": 0}, "width": 280, "height": 100},
            {"position": {"x": 400.5, "y": -3}},
            {"id": "h", "position": {"x": 1000, "y": 1000}, "hidden": true}
        ]"#;
        let nodes: Vec<Node> = serde_json::from_str(json).unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].id(), Some("a"));
        assert_eq!(nodes[1].id(), None);
        assert_eq!(nodes[1].position(), Point::new(400.5, -3.0));
        assert_eq!(nodes[1].size(), Size::new(280.0, 100.0));
        assert!(!nodes[2].is_visible());
    }
}
