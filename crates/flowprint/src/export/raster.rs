//! Raster export: the whole scene captured as a bitmap.
//!
//! The pipeline is capture (see [`capture`](super::capture)) → parse with
//! `usvg` → render with `resvg` into a `tiny_skia` pixmap that was first
//! filled with the background color → encode. PNG output is the pixmap as
//! is; PDF output embeds it in a single page (see [`pdf`](super::pdf)).

use std::sync::Arc;

use log::{debug, info, warn};
use tiny_skia::Pixmap;

use flowprint_core::{
    geometry::{Bounds, Size},
    node::Node,
    scene::Scene,
};

use super::{ExportFormat, ExportStrategy, Exporter, RasterTarget, capture, pdf, unsupported};
use crate::{
    bounds::compute_bounds,
    config::{AppConfig, ChromeConfig, RasterConfig},
    download::Payload,
    error::ExportError,
};

/// Largest bitmap, in pixels, a raster export may allocate (1 GiB of RGBA).
pub const MAX_BITMAP_PIXELS: u64 = 16_384 * 16_384;

/// A rendered bitmap and the pixel ratio it was rendered at.
pub struct Bitmap {
    pixmap: Pixmap,
    pixel_ratio: f32,
}

impl Bitmap {
    /// Width in device pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in device pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Size in logical (scene) pixels.
    pub fn logical_size(&self) -> Size {
        Size::new(
            self.width() as f32 / self.pixel_ratio,
            self.height() as f32 / self.pixel_ratio,
        )
    }

    /// Returns the RGBA value of one device pixel, unpremultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let pixel = self.pixmap.pixel(x, y)?.demultiply();
        Some([pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()])
    }

    /// Encodes the bitmap as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        self.pixmap
            .encode_png()
            .map_err(|err| ExportError::Encoding(format!("PNG encoding failed: {err}")))
    }

    /// Returns packed 8-bit RGB samples, composited over white.
    pub fn to_rgb(&self) -> Vec<u8> {
        let data = self.pixmap.data();
        let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
        for px in data.chunks_exact(4) {
            // Premultiplied: over white is `c + (255 - a)`
            let inverse = 255 - px[3];
            rgb.extend_from_slice(&[
                px[0].saturating_add(inverse),
                px[1].saturating_add(inverse),
                px[2].saturating_add(inverse),
            ]);
        }
        rgb
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("pixel_ratio", &self.pixel_ratio)
            .finish()
    }
}

/// Captures scenes and renders them as PNG or single-page PDF.
///
/// The font database is loaded once, when the exporter is created, and
/// shared by every export it performs.
pub struct RasterExporter {
    config: RasterConfig,
    chrome: ChromeConfig,
    padding: f32,
    fontdb: Arc<fontdb::Database>,
}

impl RasterExporter {
    /// Creates an exporter and loads the configured fonts.
    pub fn new(config: RasterConfig, chrome: ChromeConfig, padding: f32) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts() {
            db.load_system_fonts();
        }
        for dir in config.font_dirs() {
            if !dir.is_dir() {
                warn!(path = dir.display().to_string(); "Font directory not found");
                continue;
            }
            db.load_fonts_dir(dir);
        }
        info!(font_faces = db.len(); "Font database loaded");

        Self {
            config,
            chrome,
            padding,
            fontdb: Arc::new(db),
        }
    }

    /// Creates an exporter from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.raster().clone(),
            config.chrome().clone(),
            config.export().padding(),
        )
    }

    /// Captures and renders the visible part of `scene`.
    ///
    /// # Errors
    ///
    /// [`ExportError::ContainerNotFound`] if the scene has no container,
    /// [`ExportError::NoVisibleContent`] if no node is visible, and
    /// [`ExportError::Encoding`] if the bitmap cannot be produced or would
    /// exceed [`MAX_BITMAP_PIXELS`].
    pub fn render_bitmap(&self, scene: &dyn Scene, nodes: &[Node]) -> Result<Bitmap, ExportError> {
        let container = scene.container().ok_or(ExportError::ContainerNotFound)?;
        let bounds = compute_bounds(nodes, self.padding).ok_or(ExportError::NoVisibleContent)?;

        let root = match scene.viewport() {
            Some(viewport) => viewport,
            None => {
                warn!("Scene has no viewport, capturing the whole container");
                container
            }
        };

        let document = capture::capture_document(
            scene,
            root,
            bounds,
            &self.chrome,
            self.config.background_color(),
        );
        self.rasterize(&document.to_string(), bounds)
    }

    fn rasterize(&self, svg: &str, bounds: Bounds) -> Result<Bitmap, ExportError> {
        let ratio = self.config.pixel_ratio();
        let (width, height) = bitmap_dimensions(bounds, ratio)?;

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|err| ExportError::Encoding(format!("invalid capture document: {err}")))?;

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Encoding(format!("cannot allocate a {width}x{height} bitmap"))
        })?;

        let [r, g, b, a] = self.config.background_color().to_rgba8();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

        let transform = tiny_skia::Transform::from_scale(ratio, ratio);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        debug!(width, height, pixel_ratio = ratio; "Scene rasterized");
        Ok(Bitmap {
            pixmap,
            pixel_ratio: ratio,
        })
    }
}

/// Pixel dimensions of `bounds` at `ratio`, refused above [`MAX_BITMAP_PIXELS`].
fn bitmap_dimensions(bounds: Bounds, ratio: f32) -> Result<(u32, u32), ExportError> {
    let width = (f64::from(bounds.width()) * f64::from(ratio)).ceil().max(1.0);
    let height = (f64::from(bounds.height()) * f64::from(ratio)).ceil().max(1.0);
    if width * height > MAX_BITMAP_PIXELS as f64 {
        return Err(ExportError::Encoding(format!(
            "a {width}x{height} bitmap exceeds the limit of {MAX_BITMAP_PIXELS} pixels"
        )));
    }
    Ok((width as u32, height as u32))
}

impl std::fmt::Debug for RasterExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterExporter")
            .field("config", &self.config)
            .field("padding", &self.padding)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl Exporter for RasterExporter {
    fn supports(&self, format: ExportFormat) -> bool {
        matches!(format.strategy(), ExportStrategy::Raster(_))
    }

    fn export(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
        format: ExportFormat,
    ) -> Result<Payload, ExportError> {
        let ExportStrategy::Raster(target) = format.strategy() else {
            return Err(unsupported(format, "raster"));
        };

        info!(format:% = format; "Starting raster export");
        let bitmap = self.render_bitmap(scene, nodes)?;

        let bytes = match target {
            RasterTarget::Image => bitmap.encode_png()?,
            RasterTarget::Document => pdf::encode_document(&bitmap)?,
        };
        info!(format:% = format, bytes = bytes.len(); "Raster export finished");
        Ok(Payload::Bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowprint_core::{
        color::Color,
        geometry::{Point, Transform},
        scene::{
            CONTAINER_CLASS, CONTROLS_CLASS, Element, ElementKind, NODE_CLASS, SceneBuilder,
            SceneTree, VIEWPORT_CLASS,
        },
        style::{StyleDeclaration, Stylesheet},
    };

    fn exporter(ratio: f32) -> RasterExporter {
        RasterExporter::new(
            RasterConfig::default()
                .with_pixel_ratio(ratio)
                .with_system_fonts(false),
            ChromeConfig::default(),
            10.0,
        )
    }

    fn red_block_scene() -> SceneTree {
        let sheet = Stylesheet::new().with_rule(
            NODE_CLASS,
            StyleDeclaration::new().with_background_color(Color::new("#ff0000").unwrap()),
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
                    .with_transform(Transform::translate(Point::new(500.0, 500.0))),
            )
            .unwrap();
        b.child(
            viewport,
            Element::new(ElementKind::Block(Bounds::new(0.0, 0.0, 20.0, 20.0)))
                .with_class(NODE_CLASS)
                .with_data_id("a"),
        )
        .unwrap();
        b.child(root, Element::new(ElementKind::Container).with_class(CONTROLS_CLASS))
            .unwrap();
        b.build().unwrap()
    }

    fn nodes() -> Vec<Node> {
        vec![Node::new(Point::new(0.0, 0.0)).with_id("a").with_size(Size::new(20.0, 20.0))]
    }

    #[test]
    fn test_bitmap_size_follows_bounds_and_ratio() {
        let bitmap = exporter(2.0).render_bitmap(&red_block_scene(), &nodes()).unwrap();
        // 20 + 2 * 10 padding = 40 logical pixels
        assert_eq!(bitmap.width(), 80);
        assert_eq!(bitmap.height(), 80);
        assert_eq!(bitmap.logical_size(), Size::new(40.0, 40.0));
    }

    #[test]
    fn test_background_and_content_pixels() {
        let bitmap = exporter(1.0).render_bitmap(&red_block_scene(), &nodes()).unwrap();

        // Padding area is white, node area is red, pan/zoom ignored
        assert_eq!(bitmap.pixel(2, 2), Some([255, 255, 255, 255]));
        assert_eq!(bitmap.pixel(20, 20), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_png_signature() {
        let png = exporter(1.0)
            .export(&red_block_scene(), &nodes(), ExportFormat::Png)
            .unwrap();
        assert_eq!(&png.as_bytes()[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_rgb_composites_over_white() {
        let bitmap = exporter(1.0).render_bitmap(&red_block_scene(), &nodes()).unwrap();
        let rgb = bitmap.to_rgb();
        assert_eq!(rgb.len(), 40 * 40 * 3);
        assert_eq!(&rgb[..3], &[255, 255, 255]);
    }

    #[test]
    fn test_missing_container_is_reported_first() {
        let mut b = SceneBuilder::default();
        b.root(Element::new(ElementKind::Container)).unwrap();
        let scene = b.build().unwrap();

        assert_eq!(
            exporter(1.0).render_bitmap(&scene, &[]).unwrap_err(),
            ExportError::ContainerNotFound
        );
    }

    #[test]
    fn test_no_visible_nodes() {
        let hidden = vec![Node::new(Point::new(0.0, 0.0)).with_hidden(true)];
        assert_eq!(
            exporter(1.0)
                .render_bitmap(&red_block_scene(), &hidden)
                .unwrap_err(),
            ExportError::NoVisibleContent
        );
    }

    #[test]
    fn test_oversized_bitmap_is_refused() {
        let large = vec![
            Node::new(Point::new(0.0, 0.0))
                .with_id("a")
                .with_size(Size::new(5000.0, 3000.0)),
        ];
        let err = exporter(6.0).render_bitmap(&red_block_scene(), &large).unwrap_err();
        assert!(matches!(err, ExportError::Encoding(msg) if msg.contains("exceeds")));

        // The same diagram fits at a lower ratio
        assert_eq!(
            bitmap_dimensions(Bounds::new(0.0, 0.0, 5020.0, 3020.0), 1.0).unwrap(),
            (5020, 3020)
        );
    }

    #[test]
    fn test_svg_is_not_a_raster_format() {
        let exporter = exporter(1.0);
        assert!(exporter.supports(ExportFormat::Png));
        assert!(exporter.supports(ExportFormat::Pdf));
        assert!(!exporter.supports(ExportFormat::Svg));
        assert!(matches!(
            exporter.export(&red_block_scene(), &nodes(), ExportFormat::Svg),
            Err(ExportError::Encoding(_))
        ));
    }
}
