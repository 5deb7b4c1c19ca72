//! Export viewport computation.

use log::{debug, trace};

use flowprint_core::{
    geometry::{Bounds, Insets},
    node::Node,
};

/// Padding added around the visible nodes when none is configured.
pub const DEFAULT_PADDING: f32 = 50.0;

/// Computes the region of the scene that an export covers.
///
/// The result is the union of all visible node boxes, grown by `padding` on
/// every side. Nodes without a measured size count with the renderer's
/// default size. Returns `None` when no node is visible, which means there is
/// nothing to export.
///
/// # Examples
///
/// ```
/// use flowprint::bounds::compute_bounds;
/// use flowprint_core::{geometry::Point, node::Node};
///
/// let nodes = [Node::new(Point::new(0.0, 0.0))];
/// let bounds = compute_bounds(&nodes, 50.0).unwrap();
/// assert_eq!(bounds.min_x(), -50.0);
/// assert_eq!(bounds.width(), 380.0);
///
/// assert!(compute_bounds(&[], 50.0).is_none());
/// ```
pub fn compute_bounds(nodes: &[Node], padding: f32) -> Option<Bounds> {
    let bounds = nodes
        .iter()
        .filter(|node| node.is_visible())
        .map(|node| {
            let bounds = node.bounds();
            trace!(node_id:? = node.id(), bounds:?; "Node bounds");
            bounds
        })
        .reduce(|acc, bounds| acc.merge(&bounds))?
        .add_padding(Insets::uniform(padding));

    debug!(
        min_x = bounds.min_x(),
        min_y = bounds.min_y(),
        width = bounds.width(),
        height = bounds.height();
        "Export bounds computed"
    );

    Some(bounds)
}
