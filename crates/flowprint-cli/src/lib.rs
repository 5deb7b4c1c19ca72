//! CLI logic for the Flowprint export tool.
//!
//! This module contains the core CLI logic: load configuration, read a scene
//! snapshot, export it and write the file into the output directory.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io};

use log::info;

use flowprint::{DiagramExporter, FlowprintError, download::DirectorySink};

/// Run the Flowprint CLI application
///
/// This function reads the scene snapshot named by `args`, exports it in the
/// requested format and writes the file into the output directory.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `FlowprintError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed snapshots
/// - Export errors (no container, nothing visible, encoding failures)
pub fn run(args: &Args) -> Result<(), FlowprintError> {
    info!(
        input_path = args.input,
        output_dir = args.output_dir,
        format:% = args.format;
        "Processing scene"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let exporter = DiagramExporter::new(app_config);
    let (nodes, scene) = exporter.parse_snapshot(&source)?;

    fs::create_dir_all(&args.output_dir)?;
    let mut sink = DirectorySink::new(&args.output_dir);
    exporter.export(&scene, &nodes, args.format, args.name.as_deref(), &mut sink)?;

    // The sink only logs write failures; a missing file fails the run
    let Some(path) = sink.written().first() else {
        return Err(FlowprintError::Io(io::Error::other(format!(
            "no file was written to {}",
            args.output_dir
        ))));
    };

    info!(output_file = path.display().to_string(); "Export written successfully");

    Ok(())
}
