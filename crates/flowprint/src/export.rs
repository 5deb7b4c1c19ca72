//! Export functionality for Flowprint diagrams.
//!
//! This module provides the [`Exporter`] trait that defines the interface for
//! turning a rendered scene into a file payload. Two strategies exist, and
//! the set is closed:
//!
//! ```text
//!                    ┌─ Raster ─ capture ─ overlay ─ resvg ─┬─ PNG
//! Scene + nodes ─ bounds                                     └─ PDF (embedded bitmap)
//!                    └─ Vector ─ fresh document ─ edge copy ─ node boxes ─ SVG
//! ```
//!
//! # Available Backends
//!
//! - [`raster`] - whole-scene capture via [`raster::RasterExporter`]
//! - [`vector`] - ground-up SVG reconstruction via [`vector::VectorExporter`]
//!
//! # Error Handling
//!
//! Export operations return [`ExportError`]. Both strategies check the scene
//! container before the bounds, so an empty scene without a container
//! reports [`ExportError::ContainerNotFound`].

pub mod capture;
pub mod pdf;
pub mod raster;
pub mod vector;

use std::{fmt, str::FromStr};

use flowprint_core::{node::Node, scene::Scene};

use crate::{download::Payload, error::ExportError};

/// A file format an export can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Pdf,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Png, Self::Pdf, Self::Svg];

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Returns the strategy that produces this format.
    pub fn strategy(self) -> ExportStrategy {
        match self {
            Self::Png => ExportStrategy::Raster(RasterTarget::Image),
            Self::Pdf => ExportStrategy::Raster(RasterTarget::Document),
            Self::Svg => ExportStrategy::Vector,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            "svg" => Ok(Self::Svg),
            other => Err(format!(
                "unsupported export format `{other}`, expected one of: png, pdf, svg"
            )),
        }
    }
}

/// What the raster pipeline wraps its bitmap in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterTarget {
    /// A PNG image.
    Image,
    /// A single-page PDF embedding the bitmap.
    Document,
}

/// How a format is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// Capture the rendered scene as a bitmap.
    Raster(RasterTarget),
    /// Rebuild an independent vector document.
    Vector,
}

/// Abstraction for diagram export backends.
///
/// Implementors read the scene through the [`Scene`] trait only and never
/// change it; the same scene can be exported any number of times, in any
/// order, with identical results.
pub trait Exporter {
    /// Returns true if this exporter produces `format`.
    fn supports(&self, format: ExportFormat) -> bool;

    /// Exports the visible `nodes` of `scene` as `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::ContainerNotFound`] if a capture needs the
    /// scene container and it is missing, [`ExportError::NoVisibleContent`]
    /// if no node is visible,
    /// and [`ExportError::Encoding`] if producing the payload fails or the
    /// format is not supported.
    fn export(
        &self,
        scene: &dyn Scene,
        nodes: &[Node],
        format: ExportFormat,
    ) -> Result<Payload, ExportError>;
}

fn unsupported(format: ExportFormat, exporter: &str) -> ExportError {
    ExportError::Encoding(format!("{format} is not produced by the {exporter} exporter"))
}
