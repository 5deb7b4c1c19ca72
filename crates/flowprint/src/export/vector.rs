//! Vector export: an SVG document rebuilt from scratch.
//!
//! Nothing of the live scene's own document is reused as a whole. A fresh
//! document is sized to the export bounds, edge primitives are copied with
//! their resolved styles, marker definitions come along so arrowheads
//! resolve, and every visible node is redrawn as a rounded box with its
//! label.

use log::{debug, info, trace};
use svg::{self, node::element as svg_element};

use flowprint_core::{
    geometry::Bounds,
    node::Node,
    scene::{Element, ElementId, ElementKind, Scene},
};

use super::{
    ExportFormat, ExportStrategy, Exporter,
    capture::{self, SVG_NAMESPACE, StyleOverlay, SubtreeWriter},
    unsupported,
};
use crate::{
    bounds::compute_bounds,
    config::{AppConfig, VectorConfig},
    download::Payload,
    error::ExportError,
};

/// Rebuilds scenes as standalone SVG documents.
#[derive(Debug, Clone, Default)]
pub struct VectorExporter {
    config: VectorConfig,
    padding: f32,
}

impl VectorExporter {
    pub fn new(config: VectorConfig, padding: f32) -> Self {
        Self { config, padding }
    }

    /// Creates an exporter from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.vector().clone(), config.export().padding())
    }

    /// Builds the SVG document for the visible `nodes` of `scene`.
    ///
    /// The container must exist even though only the edge layer and the
    /// node elements are read.
    ///
    /// # Errors
    ///
    /// [`ExportError::ContainerNotFound`] if the scene has no container and
    /// [`ExportError::NoVisibleContent`] if no node is visible.
    pub fn build_document(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
    ) -> Result<svg::Document, ExportError> {
        scene.container().ok_or(ExportError::ContainerNotFound)?;
        let bounds = compute_bounds(nodes, self.padding).ok_or(ExportError::NoVisibleContent)?;

        let mut document = svg::Document::new()
            .set("xmlns", SVG_NAMESPACE)
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                ),
            )
            .add(self.background(bounds));

        if let Some(layer) = scene.edge_layer() {
            let edges = edge_primitives(scene, layer);
            debug!(edges = edges.len(); "Copying edge primitives");
            for edge in edges {
                document = document.add(edge);
            }
            if let Some(defs) = definitions(scene, layer) {
                document = document.add(defs);
            }
        } else {
            debug!("Scene has no edge layer");
        }

        for node in nodes.iter().filter(|node| node.is_visible()) {
            let element = node.id().and_then(|id| scene.node_element(id));
            if element.is_none() {
                trace!(node_id:? = node.id(); "Node has no scene element, using default look");
            }
            document = document.add(self.node_box(scene, node, element));
        }

        Ok(document)
    }

    fn background(&self, bounds: Bounds) -> svg_element::Rectangle {
        let color = self.config.background_color();
        let mut rect = svg_element::Rectangle::new()
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("fill", &color);
        if color.alpha() < 1.0 {
            rect = rect.set("fill-opacity", color.alpha());
        }
        rect
    }

    /// Redraws one node: a rounded box and, when the node is rendered in the
    /// scene, its centered label.
    fn node_box(
        &self,
        scene: &dyn Scene,
        node: &Node,
        element: Option<ElementId>,
    ) -> svg_element::Group {
        let bounds = node.bounds();
        let (fill, stroke) = match element {
            Some(id) => {
                let style = scene.resolved_style(id);
                // An unset border takes the text color, as in CSS
                (
                    style.background_color(),
                    style.border_color().unwrap_or(style.color()),
                )
            }
            None => (
                Some(self.config.default_fill()),
                self.config.default_border(),
            ),
        };

        let rect = svg_element::Rectangle::new()
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("rx", self.config.corner_radius())
            .set("fill", capture::paint_value(fill))
            .set("stroke", stroke.to_hex())
            .set("stroke-width", self.config.stroke_width());
        let mut group = svg_element::Group::new().add(rect);

        if let Some(id) = element {
            let label = scene.text_content(id);
            if !label.is_empty() {
                group = group.add(capture::centered_label(
                    &label,
                    bounds.center(),
                    self.config.label_font_family(),
                    self.config.label_font_size(),
                    self.config.label_color(),
                ));
            }
        }
        group
    }
}

/// Returns true if `id` sits inside a definitions block below `layer`.
fn is_in_definitions(scene: &dyn Scene, id: ElementId, layer: ElementId) -> bool {
    let mut current = scene.element(id).and_then(Element::parent);
    while let Some(ancestor) = current {
        if ancestor == layer {
            return false;
        }
        let Some(element) = scene.element(ancestor) else {
            return false;
        };
        if matches!(
            element.kind(),
            ElementKind::Definitions | ElementKind::Marker(_)
        ) {
            return true;
        }
        current = element.parent();
    }
    false
}

/// Copies of the paths, lines and polylines drawn in the edge layer.
fn edge_primitives(scene: &dyn Scene, layer: ElementId) -> Vec<Box<dyn svg::Node>> {
    let overlay = StyleOverlay::compute(scene, layer);
    scene
        .descendants(layer)
        .into_iter()
        .filter(|id| !is_in_definitions(scene, *id, layer))
        .filter_map(|id| {
            let element = scene.element(id)?;
            let ElementKind::Shape(primitive) = element.kind() else {
                return None;
            };
            if !primitive.is_edge_shape() {
                return None;
            }
            let style = overlay
                .get(id)
                .cloned()
                .unwrap_or_else(|| scene.resolved_style(id));
            Some(capture::primitive_node(primitive, element, &style))
        })
        .collect()
}

/// Copies the first definitions block of the edge layer.
fn definitions(scene: &dyn Scene, layer: ElementId) -> Option<Box<dyn svg::Node>> {
    let defs = scene.descendants(layer).into_iter().find(|id| {
        matches!(
            scene.element(*id).map(Element::kind),
            Some(ElementKind::Definitions)
        )
    })?;
    let overlay = StyleOverlay::compute(scene, defs);
    SubtreeWriter::new(scene, &overlay, None).write(defs)
}

impl Exporter for VectorExporter {
    fn supports(&self, format: ExportFormat) -> bool {
        format.strategy() == ExportStrategy::Vector
    }

    fn export(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
        format: ExportFormat,
    ) -> Result<Payload, ExportError> {
        if !self.supports(format) {
            return Err(unsupported(format, "vector"));
        }

        info!("Starting vector export");
        let document = self.build_document(scene, nodes)?;
        let text = document.to_string();
        info!(bytes = text.len(); "Vector export finished");
        Ok(Payload::Text(text))
    }
}
