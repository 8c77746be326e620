//! Raster capture: a bitmap of the rendered preview placed on one A4 page.

use std::collections::HashMap;

use serde::Serialize;

use crate::photo::{decode_data_uri, dimensions};
use crate::record::Record;

use super::common::image_extension;
use super::engine::{TypstJob, TypstRenderEngine};
use super::filename::pdf_filename;
use super::{CaptureError, ExportError, ExportedDocument, Exporter};

/// Supersampling factor applied when capturing.
pub const SUPERSAMPLE: u32 = 2;
/// Element id every HTML template renders as its root.
pub const PREVIEW_REGION: &str = "biodata-preview";

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// One captured region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Encoded PNG or JPEG.
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

/// Something that can snapshot a rendered region.
pub trait RenderSurface {
    fn capture(&self, region: &str, scale: u32) -> Result<Capture, CaptureError>;
}

/// Captures rendered and uploaded by the browser.
#[derive(Debug, Default)]
pub struct UploadedSurface {
    captures: HashMap<String, Capture>,
}

impl UploadedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `data:` URI captured at `scale`.
    pub fn insert_data_uri(
        &mut self,
        region: impl Into<String>,
        uri: &str,
        scale: u32,
    ) -> Result<(), CaptureError> {
        let (_, image) = decode_data_uri(uri).map_err(CaptureError::Image)?;
        let (width, height) = dimensions(&image).map_err(CaptureError::Image)?;
        self.captures.insert(
            region.into(),
            Capture {
                image,
                width,
                height,
                scale,
            },
        );
        Ok(())
    }
}

impl RenderSurface for UploadedSurface {
    fn capture(&self, region: &str, scale: u32) -> Result<Capture, CaptureError> {
        let capture = self
            .captures
            .get(region)
            .ok_or_else(|| CaptureError::RegionMissing(region.to_string()))?;
        if capture.scale < scale {
            return Err(CaptureError::ScaleTooLow {
                requested: scale,
                actual: capture.scale,
            });
        }
        Ok(capture.clone())
    }
}

/// Where the bitmap lands on the page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Full page width, unless that makes the image taller than the page; then
/// fit to the page height and centre horizontally.
pub fn place_on_a4(width_px: u32, height_px: u32) -> Placement {
    let aspect = height_px as f64 / width_px.max(1) as f64;
    let height = A4_WIDTH_MM * aspect;
    if height <= A4_HEIGHT_MM {
        Placement {
            x: 0.0,
            y: 0.0,
            width: A4_WIDTH_MM,
            height,
        }
    } else {
        let width = A4_HEIGHT_MM / aspect;
        Placement {
            x: (A4_WIDTH_MM - width) / 2.0,
            y: 0.0,
            width,
            height: A4_HEIGHT_MM,
        }
    }
}

/// Single-page Typst job embedding `capture`.
pub fn build_job(capture: &Capture) -> Result<TypstJob, CaptureError> {
    let extension = image_extension(&capture.image).ok_or(CaptureError::UnsupportedFormat)?;
    let file_name = format!("capture.{extension}");
    let placement = place_on_a4(capture.width, capture.height);

    let source = format!(
        "#set page(width: {A4_WIDTH_MM}mm, height: {A4_HEIGHT_MM}mm, margin: 0mm)\n\
         #place(top + left, dx: {:.3}mm, dy: {:.3}mm, image(\"{}\", width: {:.3}mm, height: {:.3}mm))\n",
        placement.x, placement.y, file_name, placement.width, placement.height
    );

    Ok(TypstJob::new(source).with_asset(file_name, capture.image.clone()))
}

pub struct RasterExporter<S> {
    engine: TypstRenderEngine,
    surface: S,
}

impl<S: RenderSurface> RasterExporter<S> {
    pub fn new(engine: TypstRenderEngine, surface: S) -> Self {
        Self { engine, surface }
    }
}

impl<S: RenderSurface> Exporter for RasterExporter<S> {
    fn export(&self, record: &Record) -> Result<ExportedDocument, ExportError> {
        let capture = self.surface.capture(PREVIEW_REGION, SUPERSAMPLE)?;
        log::debug!(
            "Captured {}x{} at {}x for raster export",
            capture.width,
            capture.height,
            capture.scale
        );
        let job = build_job(&capture)?;
        let pdf = self.engine.render(&job)?;
        Ok(ExportedDocument {
            filename: pdf_filename(record),
            pdf,
        })
    }
}
