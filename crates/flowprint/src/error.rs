//! Error types for Flowprint operations.
//!
//! This module provides the main error type [`FlowprintError`] which wraps
//! the error conditions that can occur while loading a scene and exporting
//! it, and [`ExportError`], the failures an exporter itself can report.

use std::io;

use thiserror::Error;

use flowprint_core::scene::SceneError;

/// Failures of a single export request.
///
/// Export is all-or-nothing: when one of these is returned, no artifact was
/// produced and nothing was handed to a download sink.
#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    /// The scene has no root container to capture.
    #[error("diagram container not found in the scene")]
    ContainerNotFound,

    /// No node is visible, so there is nothing to export.
    #[error("no visible nodes to export")]
    NoVisibleContent,

    /// Rasterization, encoding or serialization failed.
    #[error("failed to encode export: {0}")]
    Encoding(String),
}

/// The main error type for Flowprint operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the snapshot source next to the failure
/// position, so callers can point at the offending JSON.
#[derive(Debug, Error)]
pub enum FlowprintError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid scene snapshot: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
        src: String,
    },

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl FlowprintError {
    /// Create a new `Parse` error from a JSON failure in `src`.
    pub fn new_parse_error(err: &serde_json::Error, src: impl Into<String>) -> Self {
        Self::Parse {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
            src: src.into(),
        }
    }

    /// Byte offset of a `Parse` error in its source.
    ///
    /// Lines and columns are 1-based; an out-of-range position clamps to
    /// the end of the source.
    pub fn parse_offset(&self) -> Option<usize> {
        let Self::Parse {
            line, column, src, ..
        } = self
        else {
            return None;
        };

        let line_start: usize = src
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum();
        Some((line_start + column.saturating_sub(1)).min(src.len()))
    }
}
