//! Scene capture: serializing a scene subtree into a standalone SVG document.
//!
//! Capture is what the raster pipeline rasterizes. It walks the scene below
//! the viewport, drops chrome, and writes every element with its resolved
//! style spelled out as attributes, so the result renders identically without
//! the scene's stylesheet. The resolved styles come from a [`StyleOverlay`],
//! a snapshot taken before writing; the scene itself is never touched.

use std::collections::HashMap;

use log::{debug, trace};
use svg::{self, node::element as svg_element};

use flowprint_core::{
    apply_paint,
    color::Color,
    geometry::{Bounds, Point},
    scene::{Element, ElementId, ElementKind, MarkerSpec, Primitive, Scene},
    style::ResolvedStyle,
};

use crate::config::ChromeConfig;

pub(crate) const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Resolved styles of every drawing primitive in a subtree.
///
/// The overlay is the explicit-style snapshot that capture writes onto
/// primitives. It lives beside the scene, so exporting leaves no trace
/// behind and two exports of the same scene see the same styles.
#[derive(Debug, Default, Clone)]
pub struct StyleOverlay {
    styles: HashMap<ElementId, ResolvedStyle>,
}

impl StyleOverlay {
    /// Snapshots the resolved style of every primitive below `root`.
    pub fn compute(scene: &dyn Scene, root: ElementId) -> Self {
        let styles: HashMap<_, _> = scene
            .descendants(root)
            .into_iter()
            .filter(|id| {
                matches!(
                    scene.element(*id).map(Element::kind),
                    Some(ElementKind::Shape(_))
                )
            })
            .map(|id| (id, scene.resolved_style(id)))
            .collect();

        debug!(primitives = styles.len(); "Style overlay computed");
        Self { styles }
    }

    pub fn get(&self, id: ElementId) -> Option<&ResolvedStyle> {
        self.styles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Adds every node in `$children` to `$parent`.
macro_rules! add_all {
    ($parent:expr, $children:expr) => {{
        let mut parent = $parent;
        for child in $children {
            parent = parent.add(child);
        }
        parent
    }};
}

/// Copies authored attributes and the element transform onto an SVG node.
macro_rules! apply_authored {
    ($node:expr, $element:expr) => {{
        let mut node = $node;
        for (name, value) in $element.attributes() {
            node = node.set(name.clone(), value.clone());
        }
        if let Some(transform) = $element.transform() {
            if !transform.is_identity() {
                node = node.set("transform", transform.to_svg_value());
            }
        }
        node
    }};
}

/// Writes scene elements as SVG nodes with explicit styles.
pub(crate) struct SubtreeWriter<'a> {
    scene: &'a dyn Scene,
    overlay: &'a StyleOverlay,
    chrome: Option<&'a ChromeConfig>,
}

impl<'a> SubtreeWriter<'a> {
    pub(crate) fn new(
        scene: &'a dyn Scene,
        overlay: &'a StyleOverlay,
        chrome: Option<&'a ChromeConfig>,
    ) -> Self {
        Self {
            scene,
            overlay,
            chrome,
        }
    }

    /// Writes `id` and its subtree, or `None` if it is filtered out.
    pub(crate) fn write(&self, id: ElementId) -> Option<Box<dyn svg::Node>> {
        let element = self.scene.element(id)?;
        if self
            .chrome
            .is_some_and(|chrome| chrome.is_excluded(element.classes()))
        {
            trace!(element = id.index(), classes:? = element.classes(); "Chrome element skipped");
            return None;
        }

        let node: Box<dyn svg::Node> = match element.kind() {
            ElementKind::Container | ElementKind::Group | ElementKind::Canvas => {
                let group = apply_authored!(svg_element::Group::new(), element);
                add_all!(group, self.write_children(element)).into()
            }
            ElementKind::Definitions => {
                let defs = apply_authored!(svg_element::Definitions::new(), element);
                add_all!(defs, self.write_children(element)).into()
            }
            ElementKind::Marker(spec) => {
                let marker = apply_authored!(marker_node(spec), element);
                add_all!(marker, self.write_children(element)).into()
            }
            ElementKind::Shape(primitive) => {
                let style = self
                    .overlay
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| self.scene.resolved_style(id));
                primitive_node(primitive, element, &style)
            }
            ElementKind::Block(bounds) => self.block_node(id, element, *bounds),
            ElementKind::Text(content) => {
                let style = self.scene.resolved_style(id);
                let text = svg_element::Text::new(content.trim())
                    .set("fill", style.color().to_hex())
                    .set("font-family", style.font_family())
                    .set("font-size", style.font_size());
                apply_authored!(text, element).into()
            }
        };
        Some(node)
    }

    fn write_children(&self, element: &Element) -> Vec<Box<dyn svg::Node>> {
        element
            .children()
            .iter()
            .filter_map(|child| self.write(*child))
            .collect()
    }

    /// A node box: background, border and its label centered inside.
    fn block_node(&self, id: ElementId, element: &Element, bounds: Bounds) -> Box<dyn svg::Node> {
        let style = self.scene.resolved_style(id);

        let mut rect = svg_element::Rectangle::new()
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("fill", paint_value(style.background_color()));
        if style.border_radius() > 0.0 {
            rect = rect.set("rx", style.border_radius());
        }
        rect = match style.border_color() {
            Some(border) if style.border_width() > 0.0 => rect
                .set("stroke", border.to_hex())
                .set("stroke-width", style.border_width()),
            _ => rect.set("stroke", "none"),
        };
        if let Some(alpha) = style
            .background_color()
            .map(|c| c.alpha())
            .filter(|a| *a > 0.0 && *a < 1.0)
        {
            rect = rect.set("fill-opacity", alpha);
        }

        let mut group = apply_authored!(svg_element::Group::new(), element).add(rect);
        if style.opacity() < 1.0 {
            group = group.set("opacity", style.opacity());
        }

        let label = self.scene.text_content(id);
        if !label.is_empty() {
            group = group.add(centered_label(
                &label,
                bounds.center(),
                style.font_family(),
                style.font_size(),
                style.color(),
            ));
        }

        // Nested shapes (handles, icons) still render; text runs are the label.
        for child in element.children() {
            let is_text = matches!(
                self.scene.element(*child).map(Element::kind),
                Some(ElementKind::Text(_))
            );
            if !is_text {
                if let Some(node) = self.write(*child) {
                    group = group.add(node);
                }
            }
        }

        group.into()
    }
}

/// Writes a primitive with its geometry, authored attributes and `style`.
///
/// Authored attributes go first so that the resolved stroke, fill, opacity
/// and markers always win.
pub(crate) fn primitive_node(
    primitive: &Primitive,
    element: &Element,
    style: &ResolvedStyle,
) -> Box<dyn svg::Node> {
    macro_rules! finish {
        ($node:expr) => {{
            let node = apply_authored!($node, element);
            let mut node = apply_paint!(node, style);
            if let Some(marker) = style.marker_start() {
                node = node.set("marker-start", marker);
            }
            if let Some(marker) = style.marker_end() {
                node = node.set("marker-end", marker);
            }
            node.into()
        }};
    }

    match primitive {
        Primitive::Path { d } => finish!(svg_element::Path::new().set("d", d.as_str())),
        Primitive::Line { x1, y1, x2, y2 } => finish!(
            svg_element::Line::new()
                .set("x1", *x1)
                .set("y1", *y1)
                .set("x2", *x2)
                .set("y2", *y2)
        ),
        Primitive::Polyline { points } => {
            finish!(svg_element::Polyline::new().set("points", points_value(points)))
        }
        Primitive::Rect {
            x,
            y,
            width,
            height,
            rx,
        } => {
            let mut rect = svg_element::Rectangle::new()
                .set("x", *x)
                .set("y", *y)
                .set("width", *width)
                .set("height", *height);
            if *rx > 0.0 {
                rect = rect.set("rx", *rx);
            }
            finish!(rect)
        }
        Primitive::Circle { cx, cy, r } => finish!(
            svg_element::Circle::new()
                .set("cx", *cx)
                .set("cy", *cy)
                .set("r", *r)
        ),
        Primitive::Ellipse { cx, cy, rx, ry } => finish!(
            svg_element::Ellipse::new()
                .set("cx", *cx)
                .set("cy", *cy)
                .set("rx", *rx)
                .set("ry", *ry)
        ),
    }
}

fn marker_node(spec: &MarkerSpec) -> svg_element::Marker {
    let mut marker = svg_element::Marker::new()
        .set("id", spec.id())
        .set("refX", spec.reference().x())
        .set("refY", spec.reference().y())
        .set("markerWidth", spec.width())
        .set("markerHeight", spec.height())
        .set("orient", spec.orient());
    if let Some(view_box) = spec.view_box() {
        marker = marker.set("viewBox", view_box);
    }
    marker
}

/// A single-line label centered on `center`.
pub(crate) fn centered_label(
    label: &str,
    center: Point,
    font_family: &str,
    font_size: f32,
    color: Color,
) -> svg_element::Text {
    svg_element::Text::new(label)
        .set("x", center.x())
        .set("y", center.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
        .set("font-family", font_family)
        .set("font-size", font_size)
        .set("fill", color.to_hex())
}

pub(crate) fn paint_value(color: Option<Color>) -> String {
    match color {
        Some(color) if !color.is_transparent() => color.to_hex(),
        _ => "none".to_string(),
    }
}

fn points_value(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x(), p.y()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serializes the part of `scene` below `root` that falls inside `bounds`.
///
/// The document is `bounds` sized, filled with `background`, and its content
/// is translated so that the bounds' top-left corner lands on the origin.
/// The transform of `root` itself (the interactive pan and zoom) is not
/// applied.
pub fn capture_document(
    scene: &dyn Scene,
    root: ElementId,
    bounds: Bounds,
    chrome: &ChromeConfig,
    background: Color,
) -> svg::Document {
    let overlay = StyleOverlay::compute(scene, root);
    let writer = SubtreeWriter::new(scene, &overlay, Some(chrome));

    let children: Vec<_> = scene
        .element(root)
        .map(|element| writer.write_children(element))
        .unwrap_or_default();
    debug!(root = root.index(), top_level = children.len(); "Scene captured");

    let origin = bounds.min_point().negate();
    let content = add_all!(
        svg_element::Group::new()
            .set("transform", format!("translate({}, {})", origin.x(), origin.y())),
        children
    );

    let mut background_rect = svg_element::Rectangle::new()
        .set("x", 0)
        .set("y", 0)
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("fill", background.to_hex());
    if background.alpha() < 1.0 {
        background_rect = background_rect.set("fill-opacity", background.alpha());
    }

    svg::Document::new()
        .set("xmlns", SVG_NAMESPACE)
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set(
            "viewBox",
            format!("0 0 {} {}", bounds.width(), bounds.height()),
        )
        .add(background_rect)
        .add(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowprint_core::{
        geometry::Transform,
        scene::{
            BACKGROUND_CLASS, CONTAINER_CLASS, CONTROLS_CLASS, EDGES_CLASS, NODE_CLASS,
            SceneBuilder, SceneTree, VIEWPORT_CLASS,
        },
        style::{Paint, StyleDeclaration, Stylesheet},
    };

    fn scene() -> SceneTree {
        let sheet = Stylesheet::new()
            .with_rule(
                "flow__edge-path",
                StyleDeclaration::new()
                    .with_stroke("#b1b1b7".parse::<Paint>().unwrap())
                    .with_fill(Paint::None),
            )
            .with_rule(
                NODE_CLASS,
                StyleDeclaration::new()
                    .with_background_color(Color::new("#fef3c7").unwrap())
                    .with_border_color(Color::new("#f59e0b").unwrap())
                    .with_border_width(1.0),
            );

        let mut b = SceneBuilder::new(sheet);
        let root = b
            .root(Element::new(ElementKind::Container).with_class(CONTAINER_CLASS))
            .unwrap();
        let viewport = b
            .child(
                root,
                Element::new(ElementKind::Group)
                    .with_class(VIEWPORT_CLASS)
                    .with_transform(Transform::translate(Point::new(300.0, 200.0))),
            )
            .unwrap();
        let edges = b
            .child(viewport, Element::new(ElementKind::Canvas).with_class(EDGES_CLASS))
            .unwrap();
        b.child(
            edges,
            Element::new(ElementKind::Shape(Primitive::Path {
                d: "M 280 50 L 400 50".into(),
            }))
            .with_class("flow__edge-path")
            .with_attribute("stroke", "red")
            .with_attribute("stroke-dasharray", "5 5"),
        )
        .unwrap();
        let node = b
            .child(
                viewport,
                Element::new(ElementKind::Block(Bounds::new(0.0, 0.0, 280.0, 100.0)))
                    .with_class(NODE_CLASS)
                    .with_data_id("a"),
            )
            .unwrap();
        b.child(node, Element::new(ElementKind::Text("Start".into())))
            .unwrap();
        b.child(
            viewport,
            Element::new(ElementKind::Container).with_class(BACKGROUND_CLASS),
        )
        .unwrap();
        b.child(root, Element::new(ElementKind::Container).with_class(CONTROLS_CLASS))
            .unwrap();
        b.build().unwrap()
    }

    fn capture(scene: &SceneTree) -> String {
        capture_document(
            scene,
            scene.viewport().unwrap(),
            Bounds::new(-50.0, -50.0, 730.0, 150.0),
            &ChromeConfig::default(),
            Color::white(),
        )
        .to_string()
    }

    #[test]
    fn test_overlay_covers_primitives_only() {
        let scene = scene();
        let overlay = StyleOverlay::compute(&scene, scene.root());
        assert_eq!(overlay.len(), 1);

        let path = scene
            .descendants(scene.root())
            .into_iter()
            .find(|id| scene.element(*id).unwrap().has_class("flow__edge-path"))
            .unwrap();
        assert_eq!(overlay.get(path).unwrap().stroke().to_svg_value(), "#b1b1b7");
        assert!(overlay.get(scene.node_element("a").unwrap()).is_none());
    }

    #[test]
    fn test_capture_document_geometry() {
        let scene = scene();
        let svg = capture(&scene);
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let root = doc.root_element();

        assert_eq!(root.attribute("width"), Some("780"));
        assert_eq!(root.attribute("height"), Some("200"));
        assert_eq!(root.attribute("viewBox"), Some("0 0 780 200"));

        let translate = root
            .descendants()
            .find(|n| n.has_tag_name("g"))
            .and_then(|n| n.attribute("transform"));
        assert_eq!(translate, Some("translate(50, 50)"));
    }

    #[test]
    fn test_capture_ignores_pan_zoom_and_chrome() {
        let scene = scene();
        let svg = capture(&scene);

        assert!(!svg.contains("translate(300, 200)"));
        assert!(!svg.contains(CONTROLS_CLASS));
        assert!(!svg.contains(BACKGROUND_CLASS));
    }

    #[test]
    fn test_capture_resolved_style_overrides_authored() {
        let scene = scene();
        let svg = capture(&scene);
        let doc = roxmltree::Document::parse(&svg).unwrap();

        let path = doc.descendants().find(|n| n.has_tag_name("path")).unwrap();
        assert_eq!(path.attribute("d"), Some("M 280 50 L 400 50"));
        assert_eq!(path.attribute("stroke"), Some("#b1b1b7"));
        assert_eq!(path.attribute("fill"), Some("none"));
        assert_eq!(path.attribute("stroke-dasharray"), Some("5 5"));
        assert_eq!(path.attribute("opacity"), Some("1"));
    }

    #[test]
    fn test_capture_block_box_and_label() {
        let scene = scene();
        let svg = capture(&scene);
        let doc = roxmltree::Document::parse(&svg).unwrap();

        let rect = doc
            .descendants()
            .filter(|n| n.has_tag_name("rect"))
            .find(|n| n.attribute("fill") == Some("#fef3c7"))
            .unwrap();
        assert_eq!(rect.attribute("stroke"), Some("#f59e0b"));
        assert_eq!(rect.attribute("width"), Some("280"));

        let text = doc.descendants().find(|n| n.has_tag_name("text")).unwrap();
        assert_eq!(text.text().map(str::trim), Some("Start"));
        assert_eq!(text.attribute("x"), Some("140"));
        assert_eq!(text.attribute("y"), Some("50"));
    }

    #[test]
    fn test_centered_label_text_is_exact() {
        let label = centered_label(
            "A < B",
            Point::new(10.0, 20.0),
            "sans-serif",
            14.0,
            Color::new("#111827").unwrap(),
        );
        let svg = svg::Document::new()
            .set("xmlns", SVG_NAMESPACE)
            .add(label)
            .to_string();

        assert!(svg.contains(">A &lt; B</text>"));
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let text = doc.descendants().find(|n| n.has_tag_name("text")).unwrap();
        assert_eq!(text.text(), Some("A < B"));
        assert_eq!(text.children().count(), 1);
    }

    #[test]
    fn test_capture_leaves_scene_untouched() {
        let scene = scene();
        let before = scene.clone();
        let first = capture(&scene);
        let second = capture(&scene);

        assert_eq!(first, second);
        for id in scene.descendants(scene.root()) {
            assert_eq!(scene.element(id), before.element(id));
            assert_eq!(scene.resolved_style(id), before.resolved_style(id));
        }
    }
}
