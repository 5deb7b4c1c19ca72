//! The renderable scene model.
//!
//! Exporters never walk a concrete rendering tree. They talk to a [`Scene`]:
//! an abstract capability that can locate the structural roles of a diagram
//! (container, viewport, edge layer, per-node elements), hand out element
//! data, and answer style and text queries. [`SceneTree`] is the bundled
//! in-memory implementation, built with [`SceneBuilder`] or from a
//! [`document::SceneDocument`].
//!
//! # Structure
//!
//! A scene produced by a flow renderer looks like this:
//!
//! ```text
//! Container .flow
//! ├── Group .flow__viewport   (pan/zoom transform)
//! │   ├── Canvas .flow__edges
//! │   │   ├── Definitions
//! │   │   │   └── Marker #arrow
//! │   │   └── Group .flow__edge
//! │   │       └── Shape(Path) .flow__edge-path
//! │   └── Block .flow__node [data-id=a]
//! │       └── Text "Label"
//! ├── Container .flow__controls   (chrome)
//! ├── Container .flow__minimap    (chrome)
//! └── Canvas .flow__background    (chrome)
//! ```

pub mod document;

mod tree;

pub use tree::{SceneBuilder, SceneTree};

use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    geometry::{Bounds, Point, Transform},
    style::{ResolvedStyle, StyleDeclaration},
};

/// Class of the root container of a rendered diagram.
pub const CONTAINER_CLASS: &str = "flow";
/// Class of the pannable/zoomable viewport holding nodes and edges.
pub const VIEWPORT_CLASS: &str = "flow__viewport";
/// Class of the layer holding edge primitives and marker definitions.
pub const EDGES_CLASS: &str = "flow__edges";
/// Class carried by node elements.
pub const NODE_CLASS: &str = "flow__node";
/// Class of the zoom/fit control panel.
pub const CONTROLS_CLASS: &str = "flow__controls";
/// Class of the minimap overlay.
pub const MINIMAP_CLASS: &str = "flow__minimap";
/// Class of the background grid pattern.
pub const BACKGROUND_CLASS: &str = "flow__background";

/// Errors raised while assembling a scene.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("scene has no root element")]
    EmptyScene,

    #[error("scene already has a root element")]
    MultipleRoots,

    #[error("unknown scene element #{0}")]
    UnknownElement(usize),

    #[error("more than one element is bound to node `{0}`")]
    DuplicateNodeElement(String),
}

/// Handle to an element of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index of the element.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A drawing primitive, in the coordinate space of its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Path {
        d: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Polyline {
        points: Vec<Point>,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
}

impl Primitive {
    /// Returns the SVG tag name of the primitive.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Path { .. } => "path",
            Self::Line { .. } => "line",
            Self::Polyline { .. } => "polyline",
            Self::Rect { .. } => "rect",
            Self::Circle { .. } => "circle",
            Self::Ellipse { .. } => "ellipse",
        }
    }

    /// Returns true for the primitives edges are drawn with.
    pub fn is_edge_shape(&self) -> bool {
        matches!(
            self,
            Self::Path { .. } | Self::Line { .. } | Self::Polyline { .. }
        )
    }
}

/// An arrowhead (or any other marker) definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    id: String,
    view_box: Option<String>,
    ref_x: f32,
    ref_y: f32,
    width: f32,
    height: f32,
    orient: String,
}

impl MarkerSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            view_box: None,
            ref_x: 0.0,
            ref_y: 0.0,
            width: 3.0,
            height: 3.0,
            orient: "auto".to_string(),
        }
    }

    pub fn with_view_box(mut self, view_box: impl Into<String>) -> Self {
        self.view_box = Some(view_box.into());
        self
    }

    pub fn with_reference(mut self, ref_x: f32, ref_y: f32) -> Self {
        self.ref_x = ref_x;
        self.ref_y = ref_y;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_orient(mut self, orient: impl Into<String>) -> Self {
        self.orient = orient.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view_box(&self) -> Option<&str> {
        self.view_box.as_deref()
    }

    pub fn reference(&self) -> Point {
        Point::new(self.ref_x, self.ref_y)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn orient(&self) -> &str {
        &self.orient
    }
}

/// What an element is.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A layout container without visuals of its own.
    Container,
    /// A grouping element.
    Group,
    /// A nested vector canvas (an `<svg>` layer).
    Canvas,
    /// Reusable definitions, not drawn directly.
    Definitions,
    Marker(MarkerSpec),
    Shape(Primitive),
    /// A laid-out box with background, border and text children, in scene coordinates.
    Block(Bounds),
    /// A run of text.
    Text(String),
}

/// One element of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    classes: Vec<String>,
    data_id: Option<String>,
    attributes: IndexMap<String, String>,
    style: StyleDeclaration,
    transform: Option<Transform>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            data_id: None,
            attributes: IndexMap::new(),
            style: StyleDeclaration::default(),
            transform: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Binds the element to the diagram node with the given identifier.
    pub fn with_data_id(mut self, id: impl Into<String>) -> Self {
        self.data_id = Some(id.into());
        self
    }

    /// Adds an authored attribute that is not part of the element's style,
    /// such as `id` or `stroke-dasharray`.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, style: StyleDeclaration) -> Self {
        self.style = style;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn data_id(&self) -> Option<&str> {
        self.data_id.as_deref()
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Returns the declared (not resolved) inline style.
    pub fn style(&self) -> &StyleDeclaration {
        &self.style
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// A rendered diagram that exporters can query.
///
/// Implementations must be read-only from the exporter's point of view:
/// every method takes `&self`, and nothing an exporter does may change what a
/// later query returns.
pub trait Scene {
    /// Returns the element behind `id`, if it belongs to this scene.
    fn element(&self, id: ElementId) -> Option<&Element>;

    /// Returns the root container of the rendered diagram.
    fn container(&self) -> Option<ElementId>;

    /// Returns the pannable viewport that holds nodes and edges.
    fn viewport(&self) -> Option<ElementId>;

    /// Returns the layer holding edge primitives and marker definitions.
    fn edge_layer(&self) -> Option<ElementId>;

    /// Returns the element rendering the node with `node_id`.
    fn node_element(&self, node_id: &str) -> Option<ElementId>;

    /// Returns the effective style of an element after cascade and inheritance.
    ///
    /// Unknown elements resolve to initial values.
    fn resolved_style(&self, id: ElementId) -> ResolvedStyle;

    /// Returns the visible text of an element and its descendants.
    ///
    /// Text runs are trimmed and joined with single spaces.
    fn text_content(&self, id: ElementId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|child| match self.element(child).map(Element::kind) {
                Some(ElementKind::Text(text)) => Some(text.trim()),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns `id` and all of its descendants in document order.
    fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(element) = self.element(current) else {
                continue;
            };
            result.push(current);
            stack.extend(element.children().iter().rev().copied());
        }
        result
    }
}
