//! Export pipeline - turns a record into a downloadable artifact.
//!
//! Three strategies are supported:
//! - `Declarative` - rebuilds the document in Typst from the resolved rows
//! - `Raster` - places a supersampled capture of the preview on an A4 page
//! - `Print` - hands a self-printing HTML page to a [`print::PrintDialog`]

pub mod common;
pub mod declarative;
pub mod engine;
pub mod filename;
pub mod print;
pub mod raster;

pub use declarative::{DeclarativeExporter, PhotoAsset};
pub use engine::{Asset, TypstJob, TypstRenderEngine};
pub use filename::{dated_pdf_filename, pdf_filename};
pub use print::{BrowserPrint, PrintDialog, PrintPage};
pub use raster::{RasterExporter, RenderSurface, UploadedSurface, PREVIEW_REGION, SUPERSAMPLE};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::photo::PhotoError;
use crate::record::Record;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("region '{0}' is not present in the rendered surface")]
    RegionMissing(String),
    #[error("capture was taken at {actual}x, {requested}x required")]
    ScaleTooLow { requested: u32, actual: u32 },
    #[error("captured image is not PNG or JPEG")]
    UnsupportedFormat,
    #[error("invalid capture: {0}")]
    Image(#[source] PhotoError),
}

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write Typst source: {0}")]
    WriteSource(#[source] std::io::Error),
    #[error("failed to write asset: {0}")]
    WriteAsset(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {code}: {stderr}")]
    TypstExit { code: i32, stderr: String },
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("print dialog failed: {0}")]
    Print(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportStrategy {
    Print,
    Raster,
    Declarative,
}

/// Result of a successful PDF export.
#[derive(Debug)]
pub struct ExportedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
}

/// Strategies that produce a file.
pub trait Exporter {
    fn export(&self, record: &Record) -> Result<ExportedDocument, ExportError>;
}
