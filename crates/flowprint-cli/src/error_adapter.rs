//! Error adapter for converting FlowprintError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Snapshot parse
//! errors point into the JSON source; every other error gets a stable code
//! and, where the fix is known, a help line.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use flowprint::{ExportError, FlowprintError, scene::SceneError};

/// Adapter for a snapshot parse failure.
///
/// Wraps [`FlowprintError::Parse`] and labels the failing position in the
/// snapshot source.
pub struct ParseAdapter<'a> {
    message: &'a str,
    src: &'a str,
    offset: usize,
}

impl fmt::Debug for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseAdapter")
            .field("message", &self.message)
            .field("offset", &self.offset)
            .finish()
    }
}

impl fmt::Display for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid scene snapshot: {}", self.message)
    }
}

impl std::error::Error for ParseAdapter<'_> {}

impl MietteDiagnostic for ParseAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("flowprint::parse"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "a snapshot is a JSON object with `nodes` and a `scene` holding a `root` element",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let len = usize::from(self.offset < self.src.len());
        let span: SourceSpan = (self.offset, len).into();
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), span),
        )))
    }
}

/// Adapter for [`FlowprintError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a FlowprintError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            FlowprintError::Io(_) => "flowprint::io",
            FlowprintError::Parse { .. } => "flowprint::parse",
            FlowprintError::Scene(_) => "flowprint::scene",
            FlowprintError::Config(_) => "flowprint::config",
            FlowprintError::Export(ExportError::ContainerNotFound) => {
                "flowprint::export::container_not_found"
            }
            FlowprintError::Export(ExportError::NoVisibleContent) => {
                "flowprint::export::no_visible_content"
            }
            FlowprintError::Export(ExportError::Encoding(_)) => "flowprint::export::encoding",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            FlowprintError::Export(ExportError::ContainerNotFound) => {
                "the scene root needs the `flow` class"
            }
            FlowprintError::Export(ExportError::NoVisibleContent) => {
                "the node list is empty or every node is hidden"
            }
            FlowprintError::Scene(SceneError::DuplicateNodeElement(_)) => {
                "each `data-id` may be used by one element only"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parse failure with a position in the snapshot.
    Diagnostic(ParseAdapter<'a>),
    /// Any other error.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(_) => None,
        }
    }
}

/// Convert a [`FlowprintError`] into a reportable error.
pub fn to_reportable(err: &FlowprintError) -> Reportable<'_> {
    match (err, err.parse_offset()) {
        (FlowprintError::Parse { message, src, .. }, Some(offset)) => {
            Reportable::Diagnostic(ParseAdapter {
                message,
                src,
                offset,
            })
        }
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}
