//! Command-line argument definitions for the Flowprint CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the scene snapshot, the export format,
//! where the file goes and what it is called, the configuration file, and
//! logging verbosity.

use clap::Parser;

use flowprint::export::ExportFormat;

/// Command-line arguments for the Flowprint export tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the scene snapshot (JSON)
    #[arg(help = "Path to the input scene snapshot")]
    pub input: String,

    /// Export format (png, pdf, svg)
    #[arg(short, long, default_value = "svg")]
    pub format: ExportFormat,

    /// Base file name; the date and extension are appended
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory the exported file is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
