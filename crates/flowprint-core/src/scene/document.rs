//! Serialized scenes.
//!
//! A [`SceneSnapshot`] is what a host captures from a live diagram: the node
//! list as the engine reports it plus the rendered scene. Snapshots are plain
//! serde data, so any self-describing format works; the CLI reads JSON:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "a", "position": { "x": 0, "y": 0 }, "width": 280, "height": 100 }],
//!   "scene": {
//!     "stylesheet": [{ "class": "flow__edge-path", "style": { "stroke": "#b1b1b7" } }],
//!     "root": {
//!       "type": "container",
//!       "class": ["flow"],
//!       "children": [
//!         {
//!           "type": "group",
//!           "class": ["flow__viewport"],
//!           "transform": { "translate": { "x": 0, "y": 0 } }
//!         }
//!       ]
//!     }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use super::{
    Element, ElementId, ElementKind, MarkerSpec, Primitive, SceneBuilder, SceneError, SceneTree,
};
use crate::{
    geometry::{Bounds, Point, Size, Transform},
    node::Node,
    style::{StyleDeclaration, Stylesheet},
};

/// A node list together with the scene rendering it.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    nodes: Vec<Node>,
    scene: SceneDocument,
}

impl SceneSnapshot {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn scene(&self) -> &SceneDocument {
        &self.scene
    }

    /// Splits the snapshot into its node list and a built scene.
    pub fn into_parts(self) -> Result<(Vec<Node>, SceneTree), SceneError> {
        let scene = self.scene.build()?;
        Ok((self.nodes, scene))
    }
}

/// A serialized scene: a stylesheet and a nested element tree.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    stylesheet: Stylesheet,
    root: ElementSpec,
}

impl SceneDocument {
    /// Builds the in-memory scene.
    pub fn build(&self) -> Result<SceneTree, SceneError> {
        let mut builder = SceneBuilder::new(self.stylesheet.clone());
        let root = builder.root(self.root.to_element())?;
        add_children(&mut builder, root, &self.root)?;
        builder.build()
    }
}

fn add_children(
    builder: &mut SceneBuilder,
    parent: ElementId,
    spec: &ElementSpec,
) -> Result<(), SceneError> {
    for child in &spec.children {
        let id = builder.child(parent, child.to_element())?;
        add_children(builder, id, child)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
struct ElementSpec {
    #[serde(flatten)]
    kind: KindSpec,
    #[serde(default, rename = "class")]
    classes: Vec<String>,
    #[serde(default, rename = "data-id")]
    data_id: Option<String>,
    #[serde(default)]
    attributes: IndexMap<String, String>,
    #[serde(default)]
    style: StyleDeclaration,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    children: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum KindSpec {
    Container,
    Group,
    Canvas,
    Defs,
    Marker {
        id: String,
        #[serde(default, rename = "viewBox")]
        view_box: Option<String>,
        #[serde(default, rename = "refX")]
        ref_x: f32,
        #[serde(default, rename = "refY")]
        ref_y: f32,
        #[serde(default = "default_marker_size", rename = "markerWidth")]
        width: f32,
        #[serde(default = "default_marker_size", rename = "markerHeight")]
        height: f32,
        #[serde(default = "default_orient")]
        orient: String,
    },
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
        #[serde(default)]
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
    Block {
        position: Point,
        size: Size,
    },
    Text {
        content: String,
    },
}

fn default_marker_size() -> f32 {
    3.0
}

fn default_orient() -> String {
    "auto".to_string()
}

impl KindSpec {
    fn to_kind(&self) -> ElementKind {
        match self {
            Self::Container => ElementKind::Container,
            Self::Group => ElementKind::Group,
            Self::Canvas => ElementKind::Canvas,
            Self::Defs => ElementKind::Definitions,
            Self::Marker {
                id,
                view_box,
                ref_x,
                ref_y,
                width,
                height,
                orient,
            } => {
                let mut marker = MarkerSpec::new(id.clone())
                    .with_reference(*ref_x, *ref_y)
                    .with_size(*width, *height)
                    .with_orient(orient.clone());
                if let Some(view_box) = view_box {
                    marker = marker.with_view_box(view_box.clone());
                }
                ElementKind::Marker(marker)
            }
            Self::Path { d } => ElementKind::Shape(Primitive::Path { d: d.clone() }),
            Self::Line { x1, y1, x2, y2 } => ElementKind::Shape(Primitive::Line {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            }),
            Self::Polyline { points } => ElementKind::Shape(Primitive::Polyline {
                points: points.clone(),
            }),
            Self::Rect {
                x,
                y,
                width,
                height,
                rx,
            } => ElementKind::Shape(Primitive::Rect {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                rx: *rx,
            }),
            Self::Circle { cx, cy, r } => ElementKind::Shape(Primitive::Circle {
                cx: *cx,
                cy: *cy,
                r: *r,
            }),
            Self::Ellipse { cx, cy, rx, ry } => ElementKind::Shape(Primitive::Ellipse {
                cx: *cx,
                cy: *cy,
                rx: *rx,
                ry: *ry,
            }),
            Self::Block { position, size } => {
                ElementKind::Block(Bounds::new_from_top_left(*position, *size))
            }
            Self::Text { content } => ElementKind::Text(content.clone()),
        }
    }
}

impl ElementSpec {
    fn to_element(&self) -> Element {
        let mut element = Element::new(self.kind.to_kind()).with_style(self.style.clone());
        for class in &self.classes {
            element = element.with_class(class.clone());
        }
        if let Some(data_id) = &self.data_id {
            element = element.with_data_id(data_id.clone());
        }
        for (name, value) in &self.attributes {
            element = element.with_attribute(name.clone(), value.clone());
        }
        if let Some(transform) = self.transform {
            element = element.with_transform(transform);
        }
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    const SNAPSHOT: &str = r##"{
        "nodes": [
            { "id": "a", "position": { "x": 0, "y": 0 }, "width": 280, "height": 100 },
            { "id": "b", "position": { "x": 400, "y": 0 } }
        ],
        "scene": {
            "stylesheet": [
                { "class": "flow__edge-path", "style": { "stroke": "#b1b1b7", "fill": "none" } }
            ],
            "root": {
                "type": "container",
                "class": ["flow"],
                "children": [
                    {
                        "type": "group",
                        "class": ["flow__viewport"],
                        "transform": { "translate": { "x": 75, "y": 20 }, "scale": 0.5 },
                        "children": [
                            {
                                "type": "canvas",
                                "class": ["flow__edges"],
                                "children": [
                                    {
                                        "type": "defs",
                                        "children": [
                                            {
                                                "type": "marker", "id": "arrow",
                                                "viewBox": "0 0 10 10", "refX": 9, "refY": 5,
                                                "children": [
                                                    { "type": "path", "d": "M 0 0 L 10 5 L 0 10 z" }
                                                ]
                                            }
                                        ]
                                    },
                                    {
                                        "type": "path",
                                        "class": ["flow__edge-path"],
                                        "d": "M 280 50 L 400 50",
                                        "attributes": { "id": "e-a-b" },
                                        "style": { "marker-end": "url(#arrow)" }
                                    }
                                ]
                            },
                            {
                                "type": "block",
                                "class": ["flow__node"],
                                "data-id": "a",
                                "position": { "x": 0, "y": 0 },
                                "size": { "width": 280, "height": 100 },
                                "children": [{ "type": "text", "content": "Start" }]
                            }
                        ]
                    },
                    { "type": "container", "class": ["flow__controls"] }
                ]
            }
        }
    }"##;

    #[test]
    fn test_snapshot_into_parts() {
        let snapshot: SceneSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.nodes().len(), 2);

        let (nodes, scene) = snapshot.into_parts().unwrap();
        assert_eq!(nodes[1].id(), Some("b"));
        assert!(scene.container().is_some());
        assert!(scene.edge_layer().is_some());

        let viewport = scene.element(scene.viewport().unwrap()).unwrap();
        let transform = viewport.transform().unwrap();
        assert_eq!(transform.scale(), 0.5);
        assert_eq!(transform.offset(), Point::new(75.0, 20.0));
    }

    #[test]
    fn test_document_order_is_preserved() {
        let snapshot: SceneSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let (_, scene) = snapshot.into_parts().unwrap();

        let kinds: Vec<&'static str> = scene
            .descendants(scene.root())
            .into_iter()
            .map(|id| match scene.element(id).unwrap().kind() {
                ElementKind::Container => "container",
                ElementKind::Group => "group",
                ElementKind::Canvas => "canvas",
                ElementKind::Definitions => "defs",
                ElementKind::Marker(_) => "marker",
                ElementKind::Shape(primitive) => primitive.tag(),
                ElementKind::Block(_) => "block",
                ElementKind::Text(_) => "text",
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                "container", "group", "canvas", "defs", "marker", "path", "path", "block", "text",
                "container"
            ]
        );
    }

    #[test]
    fn test_document_element_details() {
        let snapshot: SceneSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let (_, scene) = snapshot.into_parts().unwrap();

        let node = scene.node_element("a").unwrap();
        assert_eq!(
            scene.element(node).unwrap().kind(),
            &ElementKind::Block(Bounds::new(0.0, 0.0, 280.0, 100.0))
        );
        assert_eq!(scene.text_content(node), "Start");

        let edge = scene
            .descendants(scene.edge_layer().unwrap())
            .into_iter()
            .find(|id| scene.element(*id).unwrap().has_class("flow__edge-path"))
            .unwrap();
        let element = scene.element(edge).unwrap();
        assert_eq!(element.attributes().get("id").map(String::as_str), Some("e-a-b"));

        let style = scene.resolved_style(edge);
        assert_eq!(style.stroke().to_svg_value(), "#b1b1b7");
        assert_eq!(style.marker_end(), Some("url(#arrow)"));
    }

    #[test]
    fn test_marker_defaults() {
        let json = r#"{ "root": { "type": "marker", "id": "m" } }"#;
        let document: SceneDocument = serde_json::from_str(json).unwrap();
        let scene = document.build().unwrap();
        let ElementKind::Marker(marker) = scene.element(scene.root()).unwrap().kind() else {
            panic!("expected a marker");
        };
        assert_eq!(marker.width(), 3.0);
        assert_eq!(marker.orient(), "auto");
        assert_eq!(marker.view_box(), None);
    }

    #[test]
    fn test_unknown_element_type_is_rejected() {
        let json = r#"{ "root": { "type": "iframe" } }"#;
        let result: Result<SceneDocument, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_node_binding_is_rejected() {
        let json = r#"{ "root": { "type": "container", "children": [
            { "type": "group", "data-id": "a" },
            { "type": "group", "data-id": "a" }
        ] } }"#;
        let document: SceneDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            document.build().unwrap_err(),
            SceneError::DuplicateNodeElement("a".into())
        );
    }
}
