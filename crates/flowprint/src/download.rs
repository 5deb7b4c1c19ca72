//! Delivering exported artifacts.
//!
//! An [`Artifact`] is the transient result of one export: a payload plus the
//! file name and MIME type it should be saved under. A [`DownloadSink`] takes
//! ownership of it and makes it available to the user. Sinks have no error
//! surface; a sink that cannot deliver logs the failure itself.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use base64::Engine as _;
use chrono::{NaiveDate, Utc};
use log::{error, info};

/// Exported content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// A finished export ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    filename: String,
    mime: &'static str,
    payload: Payload,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, mime: &'static str, payload: Payload) -> Self {
        Self {
            filename: filename.into(),
            mime,
            payload,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Renders the artifact as a `data:` URI.
    ///
    /// Binary payloads are base64 encoded; text payloads are percent encoded
    /// with a UTF-8 charset, which keeps SVG markup readable.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprint::download::{Artifact, Payload};
    ///
    /// let png = Artifact::new("a.png", "image/png", Payload::Bytes(vec![0x89, 0x50]));
    /// assert_eq!(png.to_data_uri(), "data:image/png;base64,iVA=");
    ///
    /// let svg = Artifact::new("a.svg", "image/svg+xml", Payload::Text("<svg a=\"1\"/>".into()));
    /// assert_eq!(
    ///     svg.to_data_uri(),
    ///     "data:image/svg+xml;charset=utf-8,%3Csvg%20a%3D%221%22%2F%3E"
    /// );
    /// ```
    pub fn to_data_uri(&self) -> String {
        match &self.payload {
            Payload::Bytes(bytes) => format!(
                "data:{};base64,{}",
                self.mime,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
            Payload::Text(text) => {
                format!("data:{};charset=utf-8,{}", self.mime, percent_encode(text))
            }
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} bytes)", self.filename, self.mime, self.payload.len())
    }
}

/// Percent-encodes a URI component: everything except ASCII alphanumerics
/// and `- _ . ! ~ * ' ( )`.
fn percent_encode(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
        {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Builds the user-facing file name `{base}-{YYYY-MM-DD}.{extension}`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use flowprint::download::artifact_filename;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// assert_eq!(artifact_filename("graph", date, "png"), "graph-2024-01-01.png");
/// ```
pub fn artifact_filename(base: &str, date: NaiveDate, extension: &str) -> String {
    format!("{base}-{}.{extension}", date.format("%Y-%m-%d"))
}

/// Source of the date stamped into file names.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// The wall clock, in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Receives finished artifacts.
pub trait DownloadSink {
    /// Takes ownership of `artifact` and saves it.
    fn download(&mut self, artifact: Artifact);
}

/// Writes artifacts as files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadSink for DirectorySink {
    fn download(&mut self, artifact: Artifact) {
        let path = self.dir.join(artifact.filename());
        match fs::write(&path, artifact.payload().as_bytes()) {
            Ok(()) => {
                info!(
                    path = path.display().to_string(),
                    bytes = artifact.payload().len();
                    "Artifact saved"
                );
                self.written.push(path);
            }
            Err(err) => {
                error!(path = path.display().to_string(), err:%; "Failed to save artifact");
            }
        }
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}

impl DownloadSink for MemorySink {
    fn download(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }
}
