//! Pure Rust compression backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, dimensions from [`fit_within`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at `round(quality × 100)` |
//! | Encode → PNG | `image::ImageFormat::Png` (lossless, quality unused) |
//! | Encode → WebP | `image::ImageFormat::WebP` (lossless encoder, quality unused) |
//!
//! Quality is validated here and nowhere else: anything outside `(0, 1]`
//! (including NaN) fails the image with [`CompressError::InvalidQuality`].

use super::backend::{CompressError, Compressor};
use super::calculations::{fit_within, percent_quality};
use super::params::CompressRequest;
use crate::settings::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Extensions whose decoders are compiled in.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCompressor;

impl RustCompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCompressor {
    fn default() -> Self {
        Self::new()
    }
}

fn check_request(request: &CompressRequest<'_>) -> Result<(), CompressError> {
    if !(request.quality > 0.0 && request.quality <= 1.0) {
        return Err(CompressError::InvalidQuality(request.quality));
    }
    if request.max_dimension == 0 {
        return Err(CompressError::InvalidDimension);
    }
    Ok(())
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: f32) -> Result<Vec<u8>, CompressError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, percent_quality(quality));
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_to(&mut buffer, ImageFormat::Png),
        OutputFormat::Webp => {
            // The WebP encoder only takes 8-bit RGB(A)
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut buffer, ImageFormat::WebP)
        }
    };
    result.map_err(|e| CompressError::Encode(format!("{format}: {e}")))?;
    Ok(buffer.into_inner())
}

impl Compressor for RustCompressor {
    fn compress(&self, request: &CompressRequest<'_>) -> Result<Vec<u8>, CompressError> {
        check_request(request)?;

        let img = image::load_from_memory(request.source)
            .map_err(|e| CompressError::Decode(e.to_string()))?;

        let original = (img.width(), img.height());
        let (width, height) = fit_within(original, request.max_dimension);
        let img = if (width, height) == original {
            img
        } else {
            log::debug!(
                "Resizing {}x{} -> {}x{}",
                original.0,
                original.1,
                width,
                height
            );
            img.resize_exact(width, height, FilterType::Lanczos3)
        };

        encode(&img, request.format, request.quality)
    }
}
