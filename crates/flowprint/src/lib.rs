//! Flowprint - Exporting rendered node/edge diagrams as PNG, PDF and SVG.
//!
//! A diagram engine hands over its rendered scene (through the
//! [`Scene`](scene::Scene) trait) and its node list. Flowprint computes the
//! export bounds, produces the file with one of two strategies, and hands the
//! finished artifact to a [`DownloadSink`](download::DownloadSink).
//!
//! - PNG and PDF capture the scene as rendered, chrome excluded.
//! - SVG rebuilds a clean document from the edges and node boxes.

pub mod bounds;
pub mod config;
pub mod download;
pub mod export;

mod error;

pub use flowprint_core::{color, geometry, node, scene, style};

pub use error::{ExportError, FlowprintError};

use std::cell::OnceCell;

use log::{debug, info};

use config::AppConfig;
use download::{Artifact, Clock, DownloadSink, SystemClock, artifact_filename};
use export::{
    ExportFormat, ExportStrategy, Exporter, raster::RasterExporter, vector::VectorExporter,
};
use node::Node;
use scene::{Scene, SceneTree, document::SceneSnapshot};

/// Entry point for exporting diagrams.
///
/// Holds one exporter per strategy. The raster exporter, and with it the
/// font database, is created on the first PNG or PDF export.
///
/// # Examples
///
/// ```rust,no_run
/// use flowprint::{
///     DiagramExporter,
///     config::AppConfig,
///     download::DirectorySink,
///     export::ExportFormat,
/// };
///
/// let json = std::fs::read_to_string("scene.json").expect("Failed to read scene");
///
/// let exporter = DiagramExporter::new(AppConfig::default());
/// let (nodes, scene) = exporter.parse_snapshot(&json).expect("Invalid scene");
///
/// let mut sink = DirectorySink::new(".");
/// exporter
///     .export(&scene, &nodes, ExportFormat::Svg, Some("pipeline"), &mut sink)
///     .expect("Failed to export");
/// ```
pub struct DiagramExporter {
    config: AppConfig,
    clock: Box<dyn Clock>,
    raster: OnceCell<RasterExporter>,
    vector: VectorExporter,
}

impl DiagramExporter {
    /// Create a new exporter stamping file names with the UTC date.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including padding, raster and vector settings
    pub fn new(config: AppConfig) -> Self {
        let vector = VectorExporter::from_config(&config);
        Self {
            config,
            clock: Box::new(SystemClock),
            raster: OnceCell::new(),
            vector,
        }
    }

    /// Replaces the clock used for file names.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a JSON scene snapshot into its node list and scene.
    ///
    /// # Errors
    ///
    /// Returns `FlowprintError::Parse` for malformed JSON or unknown
    /// element data, and `FlowprintError::Scene` if the element tree is
    /// inconsistent.
    pub fn parse_snapshot(&self, source: &str) -> Result<(Vec<Node>, SceneTree), FlowprintError> {
        info!("Parsing scene snapshot");
        let snapshot: SceneSnapshot = serde_json::from_str(source)
            .map_err(|err| FlowprintError::new_parse_error(&err, source))?;

        let (nodes, scene) = snapshot.into_parts()?;
        debug!(nodes = nodes.len(), elements = scene.len(); "Scene snapshot parsed");
        Ok((nodes, scene))
    }

    fn exporter(&self, format: ExportFormat) -> &dyn Exporter {
        match format.strategy() {
            ExportStrategy::Raster(_) => self
                .raster
                .get_or_init(|| RasterExporter::from_config(&self.config)),
            ExportStrategy::Vector => &self.vector,
        }
    }

    /// Produces the artifact for `format` without delivering it.
    ///
    /// The file name uses the configured base name.
    ///
    /// # Errors
    ///
    /// Returns `FlowprintError::Export` when the scene cannot be exported.
    pub fn render(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
        format: ExportFormat,
    ) -> Result<Artifact, FlowprintError> {
        self.render_named(scene, nodes, format, self.config.export().base_filename())
    }

    fn render_named(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
        format: ExportFormat,
        base_filename: &str,
    ) -> Result<Artifact, FlowprintError> {
        let payload = self.exporter(format).export(scene, nodes, format)?;
        let filename = artifact_filename(base_filename, self.clock.today(), format.extension());
        debug!(filename, bytes = payload.len(); "Artifact produced");
        Ok(Artifact::new(filename, format.mime(), payload))
    }

    /// Exports `nodes` of `scene` as `format` and hands the file to `sink`.
    ///
    /// `base_filename` defaults to the configured base name. On error the
    /// sink is not called.
    ///
    /// # Errors
    ///
    /// Returns `FlowprintError::Export` when the scene cannot be exported.
    pub fn export(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
        format: ExportFormat,
        base_filename: Option<&str>,
        sink: &mut dyn DownloadSink,
    ) -> Result<(), FlowprintError> {
        let base = base_filename.unwrap_or(self.config.export().base_filename());
        info!(format:% = format, base; "Exporting diagram");

        let artifact = self.render_named(scene, nodes, format, base)?;
        info!(artifact:% = artifact; "Export complete");
        sink.download(artifact);
        Ok(())
    }
}

impl Default for DiagramExporter {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl std::fmt::Debug for DiagramExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramExporter")
            .field("config", &self.config)
            .field("raster_loaded", &self.raster.get().is_some())
            .finish()
    }
}
