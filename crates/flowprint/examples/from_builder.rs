//! Example: Exporting a scene built in code
//!
//! This example demonstrates how to assemble a scene with `SceneBuilder`,
//! the way a rendering backend would, and export it without going through a
//! serialized snapshot.

use flowprint::{
    DiagramExporter,
    color::Color,
    config::AppConfig,
    download::{DownloadSink, MemorySink},
    export::ExportFormat,
    geometry::{Bounds, Point, Size},
    node::Node,
    scene::{
        CONTAINER_CLASS, EDGES_CLASS, Element, ElementKind, MarkerSpec, NODE_CLASS, Primitive,
        SceneBuilder, VIEWPORT_CLASS,
    },
    style::{Paint, StyleDeclaration, Stylesheet},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building scene...\n");

    // Stylesheet rules apply by class, like the renderer's CSS
    let stylesheet = Stylesheet::new()
        .with_rule(
            "flow__edge-path",
            StyleDeclaration::new()
                .with_stroke("#64748b".parse::<Paint>()?)
                .with_stroke_width(2.0)
                .with_fill(Paint::None)
                .with_marker_end("url(#arrow)"),
        )
        .with_rule(
            NODE_CLASS,
            StyleDeclaration::new()
                .with_background_color(Color::new("#eff6ff")?)
                .with_border_color(Color::new("#3b82f6")?)
                .with_border_width(1.0)
                .with_border_radius(6.0),
        );

    let mut builder = SceneBuilder::new(stylesheet);
    let root = builder.root(Element::new(ElementKind::Container).with_class(CONTAINER_CLASS))?;
    let viewport = builder.child(
        root,
        Element::new(ElementKind::Group).with_class(VIEWPORT_CLASS),
    )?;

    // Edge layer with an arrowhead marker
    let edges = builder.child(
        viewport,
        Element::new(ElementKind::Canvas).with_class(EDGES_CLASS),
    )?;
    let defs = builder.child(edges, Element::new(ElementKind::Definitions))?;
    let marker = builder.child(
        defs,
        Element::new(ElementKind::Marker(
            MarkerSpec::new("arrow")
                .with_view_box("0 0 10 10")
                .with_reference(9.0, 5.0),
        )),
    )?;
    builder.child(
        marker,
        Element::new(ElementKind::Shape(Primitive::Path {
            d: "M 0 0 L 10 5 L 0 10 z".to_string(),
        })),
    )?;

    let labels = [("client", "Web Client"), ("server", "API Server"), ("database", "Database")];
    let mut nodes = Vec::new();
    for (index, (id, label)) in labels.into_iter().enumerate() {
        let position = Point::new(index as f32 * 360.0, 0.0);
        let size = Size::new(220.0, 80.0);

        let block = builder.child(
            viewport,
            Element::new(ElementKind::Block(Bounds::new_from_top_left(position, size)))
                .with_class(NODE_CLASS)
                .with_data_id(id),
        )?;
        builder.child(block, Element::new(ElementKind::Text(label.to_string())))?;
        nodes.push(Node::new(position).with_id(id).with_size(size));

        if index > 0 {
            let from = position.x() - 140.0;
            builder.child(
                edges,
                Element::new(ElementKind::Shape(Primitive::Path {
                    d: format!("M {from} 40 L {} 40", position.x()),
                }))
                .with_class("flow__edge-path"),
            )?;
        }
    }

    let scene = builder.build()?;
    println!("Scene has {} elements and {} nodes", scene.len(), nodes.len());

    let exporter = DiagramExporter::new(AppConfig::default());
    let mut sink = MemorySink::new();
    exporter.export(&scene, &nodes, ExportFormat::Svg, Some("services"), &mut sink)?;

    // Sinks are interchangeable; print what would have been downloaded
    let artifacts = sink.into_artifacts();
    for artifact in &artifacts {
        println!("Produced {artifact}");
        println!("{}", String::from_utf8_lossy(artifact.payload().as_bytes()));
    }

    // Hand the same artifact to another sink
    let mut copy = MemorySink::new();
    for artifact in artifacts {
        copy.download(artifact);
    }
    println!("\nData URI prefix: {}", &copy.artifacts()[0].to_data_uri()[..40]);

    Ok(())
}
