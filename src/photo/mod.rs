//! Profile photo geometry, cropping and data URIs.
//!
//! Crop rectangles are always expressed in source-image pixels. Preview
//! coordinates are converted once, up front, so the exported photo contains
//! exactly the pixels the user framed.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode cropped image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("crop area is empty")]
    EmptyCrop,
    #[error("crop area {area:?} exceeds the {width}x{height} source image")]
    OutOfBounds {
        area: CropArea,
        width: u32,
        height: u32,
    },
    #[error("not a base64 data URI")]
    InvalidDataUri,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

/// Biodata photos are portrait 3:4 in every layout.
pub const PORTRAIT: AspectRatio = AspectRatio {
    width: 3,
    height: 4,
};

impl AspectRatio {
    pub fn height_for(self, width: f64) -> f64 {
        width * self.height as f64 / self.width as f64
    }
}

/// Display box of the photo, in whatever unit the caller renders with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoFrame {
    pub width: f64,
    pub height: f64,
}

impl PhotoFrame {
    pub fn with_width(width: f64, ratio: AspectRatio) -> Self {
        Self {
            width,
            height: ratio.height_for(width),
        }
    }

    /// 150x200 px box used by the HTML layouts.
    pub fn preview() -> Self {
        Self::with_width(150.0, PORTRAIT)
    }

    /// 120x160 pt box used in exported PDFs.
    pub fn print() -> Self {
        Self::with_width(120.0, PORTRAIT)
    }
}

/// Rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rectangle as drawn on a scaled preview of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PreviewRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropArea {
    /// Map a preview-space rectangle onto the source image.
    ///
    /// `preview_size` is the size the whole source image was displayed at.
    /// The result is clamped to the source bounds.
    pub fn from_preview(
        rect: PreviewRect,
        preview_size: (f64, f64),
        source_size: (u32, u32),
    ) -> Self {
        let (source_width, source_height) = source_size;
        let scale_x = source_width as f64 / preview_size.0;
        let scale_y = source_height as f64 / preview_size.1;

        let x = ((rect.x * scale_x).round().max(0.0) as u32).min(source_width);
        let y = ((rect.y * scale_y).round().max(0.0) as u32).min(source_height);
        let width = ((rect.width * scale_x).round().max(0.0) as u32).min(source_width - x);
        let height = ((rect.height * scale_y).round().max(0.0) as u32).min(source_height - y);

        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Largest centred rectangle of the given ratio.
    pub fn centered(source_width: u32, source_height: u32, ratio: AspectRatio) -> Self {
        let by_width = source_width as u64 * ratio.height as u64 / ratio.width as u64;
        let (width, height) = if by_width <= source_height as u64 {
            (source_width, by_width as u32)
        } else {
            let by_height = source_height as u64 * ratio.width as u64 / ratio.height as u64;
            (by_height as u32, source_height)
        };

        Self {
            x: (source_width - width) / 2,
            y: (source_height - height) / 2,
            width,
            height,
        }
    }

    fn check_bounds(&self, width: u32, height: u32) -> Result<(), PhotoError> {
        if self.width == 0 || self.height == 0 {
            return Err(PhotoError::EmptyCrop);
        }
        let fits_x = self.x.checked_add(self.width).is_some_and(|r| r <= width);
        let fits_y = self.y.checked_add(self.height).is_some_and(|b| b <= height);
        if !fits_x || !fits_y {
            return Err(PhotoError::OutOfBounds {
                area: *self,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// Pixel dimensions of an encoded image.
pub fn dimensions(data: &[u8]) -> Result<(u32, u32), PhotoError> {
    let image = image::load_from_memory(data).map_err(PhotoError::Decode)?;
    Ok((image.width(), image.height()))
}

/// Crop exactly `area` out of an encoded PNG/JPEG and return it as JPEG.
pub fn crop(data: &[u8], area: CropArea) -> Result<Vec<u8>, PhotoError> {
    let source = image::load_from_memory(data).map_err(PhotoError::Decode)?;
    area.check_bounds(source.width(), source.height())?;

    let cropped = source.crop_imm(area.x, area.y, area.width, area.height);
    let rgb = DynamicImage::ImageRgb8(cropped.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder).map_err(PhotoError::Encode)?;
    Ok(buffer.into_inner())
}

/// Split a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let rest = uri.strip_prefix("data:").ok_or(PhotoError::InvalidDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(PhotoError::InvalidDataUri)?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or(PhotoError::InvalidDataUri)?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| PhotoError::InvalidDataUri)?;
    Ok((mime.to_string(), bytes))
}

pub fn encode_data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

pub fn is_data_uri(url: &str) -> bool {
    url.starts_with("data:")
}
