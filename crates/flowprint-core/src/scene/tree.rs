use std::collections::HashMap;

use log::debug;

use super::{
    CONTAINER_CLASS, EDGES_CLASS, Element, ElementId, Scene, SceneError, VIEWPORT_CLASS,
};
use crate::style::{ResolvedStyle, Stylesheet};

/// An immutable, arena-backed [`Scene`].
///
/// Styles are resolved once when the tree is built, so style queries are
/// lookups and no query can observe a half-updated tree.
#[derive(Debug, Clone)]
pub struct SceneTree {
    elements: Vec<Element>,
    resolved: Vec<ResolvedStyle>,
    container: Option<ElementId>,
    viewport: Option<ElementId>,
    edge_layer: Option<ElementId>,
    node_elements: HashMap<String, ElementId>,
}

impl SceneTree {
    /// Returns the root element.
    pub fn root(&self) -> ElementId {
        ElementId::new(0)
    }

    /// Number of elements in the tree.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Scene for SceneTree {
    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    fn container(&self) -> Option<ElementId> {
        self.container
    }

    fn viewport(&self) -> Option<ElementId> {
        self.viewport
    }

    fn edge_layer(&self) -> Option<ElementId> {
        self.edge_layer
    }

    fn node_element(&self, node_id: &str) -> Option<ElementId> {
        self.node_elements.get(node_id).copied()
    }

    fn resolved_style(&self, id: ElementId) -> ResolvedStyle {
        self.resolved.get(id.index()).cloned().unwrap_or_default()
    }
}

/// Assembles a [`SceneTree`] element by element.
///
/// Parents must be added before their children, which keeps the arena in
/// document order and lets styles resolve in a single forward pass.
///
/// # Examples
///
/// ```
/// use flowprint_core::scene::{Element, ElementKind, Scene, SceneBuilder};
/// use flowprint_core::style::Stylesheet;
///
/// let mut builder = SceneBuilder::new(Stylesheet::new());
/// let root = builder.root(Element::new(ElementKind::Container).with_class("flow")).unwrap();
/// builder
///     .child(root, Element::new(ElementKind::Group).with_class("flow__viewport"))
///     .unwrap();
/// let scene = builder.build().unwrap();
///
/// assert_eq!(scene.container(), Some(root));
/// assert!(scene.viewport().is_some());
/// ```
#[derive(Debug, Default)]
pub struct SceneBuilder {
    stylesheet: Stylesheet,
    elements: Vec<Element>,
}

impl SceneBuilder {
    pub fn new(stylesheet: Stylesheet) -> Self {
        Self {
            stylesheet,
            elements: Vec::new(),
        }
    }

    /// Adds the root element. A scene has exactly one.
    pub fn root(&mut self, element: Element) -> Result<ElementId, SceneError> {
        if !self.elements.is_empty() {
            return Err(SceneError::MultipleRoots);
        }
        Ok(self.push(None, element))
    }

    /// Appends `element` as the last child of `parent`.
    pub fn child(&mut self, parent: ElementId, element: Element) -> Result<ElementId, SceneError> {
        if parent.index() >= self.elements.len() {
            return Err(SceneError::UnknownElement(parent.index()));
        }
        let id = self.push(Some(parent), element);
        self.elements[parent.index()].children.push(id);
        Ok(id)
    }

    fn push(&mut self, parent: Option<ElementId>, mut element: Element) -> ElementId {
        let id = ElementId::new(self.elements.len());
        element.parent = parent;
        element.children.clear();
        self.elements.push(element);
        id
    }

    /// Resolves styles and structural roles and freezes the tree.
    ///
    /// Roles go to the first element, in document order, that carries the
    /// role's class.
    pub fn build(self) -> Result<SceneTree, SceneError> {
        if self.elements.is_empty() {
            return Err(SceneError::EmptyScene);
        }

        let mut resolved: Vec<ResolvedStyle> = Vec::with_capacity(self.elements.len());
        let mut node_elements = HashMap::new();
        let mut container = None;
        let mut viewport = None;
        let mut edge_layer = None;

        for (index, element) in self.elements.iter().enumerate() {
            let id = ElementId::new(index);

            // Parents always precede children in the arena
            let parent_style = element.parent.map(|parent| &resolved[parent.index()]);
            let style = ResolvedStyle::cascade(
                parent_style,
                &self.stylesheet,
                &element.classes,
                &element.style,
            );
            resolved.push(style);

            if let Some(data_id) = &element.data_id {
                if node_elements.insert(data_id.clone(), id).is_some() {
                    return Err(SceneError::DuplicateNodeElement(data_id.clone()));
                }
            }

            if container.is_none() && element.has_class(CONTAINER_CLASS) {
                container = Some(id);
            }
            if viewport.is_none() && element.has_class(VIEWPORT_CLASS) {
                viewport = Some(id);
            }
            if edge_layer.is_none() && element.has_class(EDGES_CLASS) {
                edge_layer = Some(id);
            }
        }

        debug!(
            elements = self.elements.len(),
            node_elements = node_elements.len(),
            has_viewport = viewport.is_some();
            "Scene built"
        );

        Ok(SceneTree {
            elements: self.elements,
            resolved,
            container,
            viewport,
            edge_layer,
            node_elements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::{Bounds, Point, Transform},
        scene::{ElementKind, NODE_CLASS, Primitive},
        style::{Paint, StyleDeclaration},
    };

    fn sample_scene() -> (SceneTree, ElementId, ElementId) {
        let sheet = Stylesheet::new()
            .with_rule(
                "flow__edge-path",
                StyleDeclaration::new()
                    .with_stroke("#b1b1b7".parse::<Paint>().unwrap())
                    .with_fill(Paint::None),
            )
            .with_rule(
                NODE_CLASS,
                StyleDeclaration::new().with_font_size(12.0),
            );

        let mut builder = SceneBuilder::new(sheet);
        let root = builder
            .root(Element::new(ElementKind::Container).with_class(CONTAINER_CLASS))
            .unwrap();
        let viewport = builder
            .child(
                root,
                Element::new(ElementKind::Group)
                    .with_class(VIEWPORT_CLASS)
                    .with_transform(Transform::translate(Point::new(120.0, 40.0))),
            )
            .unwrap();
        let edges = builder
            .child(viewport, Element::new(ElementKind::Canvas).with_class(EDGES_CLASS))
            .unwrap();
        let path = builder
            .child(
                edges,
                Element::new(ElementKind::Shape(Primitive::Path {
                    d: "M 280 50 L 400 50".into(),
                }))
                .with_class("flow__edge-path"),
            )
            .unwrap();
        let node = builder
            .child(
                viewport,
                Element::new(ElementKind::Block(Bounds::new(0.0, 0.0, 280.0, 100.0)))
                    .with_class(NODE_CLASS)
                    .with_data_id("a"),
            )
            .unwrap();
        builder
            .child(node, Element::new(ElementKind::Text("  Start ".into())))
            .unwrap();
        builder
            .child(node, Element::new(ElementKind::Text("node".into())))
            .unwrap();

        (builder.build().unwrap(), path, node)
    }

    #[test]
    fn test_roles_are_located() {
        let (scene, _, _) = sample_scene();
        assert_eq!(scene.container(), Some(scene.root()));
        assert_eq!(scene.viewport(), Some(ElementId::new(1)));
        assert_eq!(scene.edge_layer(), Some(ElementId::new(2)));
    }

    #[test]
    fn test_node_element_lookup() {
        let (scene, _, node) = sample_scene();
        assert_eq!(scene.node_element("a"), Some(node));
        assert_eq!(scene.node_element("missing"), None);
    }

    #[test]
    fn test_resolved_style_cascade() {
        let (scene, path, node) = sample_scene();

        let edge_style = scene.resolved_style(path);
        assert_eq!(edge_style.stroke().to_svg_value(), "#b1b1b7");
        assert_eq!(edge_style.fill(), Paint::None);

        assert_eq!(scene.resolved_style(node).font_size(), 12.0);
    }

    #[test]
    fn test_unknown_element_resolves_to_initial_style() {
        let (scene, _, _) = sample_scene();
        assert_eq!(
            scene.resolved_style(ElementId::new(999)),
            ResolvedStyle::default()
        );
        assert!(scene.element(ElementId::new(999)).is_none());
    }

    #[test]
    fn test_text_content_is_trimmed_and_joined() {
        let (scene, _, node) = sample_scene();
        assert_eq!(scene.text_content(node), "Start node");
        assert_eq!(scene.text_content(scene.root()), "Start node");
    }

    #[test]
    fn test_descendants_document_order() {
        let (scene, _, _) = sample_scene();
        let order: Vec<usize> = scene
            .descendants(scene.root())
            .into_iter()
            .map(ElementId::index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(scene.len(), 7);
    }

    #[test]
    fn test_parent_links() {
        let (scene, path, _) = sample_scene();
        let element = scene.element(path).unwrap();
        assert_eq!(element.parent(), scene.edge_layer());
    }

    #[test]
    fn test_missing_roles_are_none() {
        let mut builder = SceneBuilder::default();
        builder.root(Element::new(ElementKind::Container)).unwrap();
        let scene = builder.build().unwrap();

        assert_eq!(scene.container(), None);
        assert_eq!(scene.viewport(), None);
        assert_eq!(scene.edge_layer(), None);
    }

    #[test]
    fn test_builder_errors() {
        assert_eq!(
            SceneBuilder::default().build().unwrap_err(),
            SceneError::EmptyScene
        );

        let mut builder = SceneBuilder::default();
        let root = builder.root(Element::new(ElementKind::Container)).unwrap();
        assert_eq!(
            builder.root(Element::new(ElementKind::Container)),
            Err(SceneError::MultipleRoots)
        );
        assert_eq!(
            builder.child(ElementId::new(42), Element::new(ElementKind::Group)),
            Err(SceneError::UnknownElement(42))
        );

        builder
            .child(root, Element::new(ElementKind::Group).with_data_id("a"))
            .unwrap();
        builder
            .child(root, Element::new(ElementKind::Group).with_data_id("a"))
            .unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            SceneError::DuplicateNodeElement("a".into())
        );
    }
}
