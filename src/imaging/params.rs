//! Parameter types for the compression primitive.
//!
//! [`CompressRequest`] describes *what* to produce, not *how*. It is the
//! interface between the processing engine (which decides what each queued
//! image needs) and the [`backend`](super::backend) (which does the pixel
//! work), so the engine can be tested against a mock.

use crate::settings::{OutputFormat, ProcessingSettings};

/// One compression job: source bytes in, encoded bytes out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressRequest<'a> {
    /// Raw bytes of the source file, any supported input encoding.
    pub source: &'a [u8],
    /// Longest edge of the output, in pixels.
    pub max_dimension: u32,
    /// Encoder quality. Passed through from settings unchecked.
    pub quality: f32,
    pub format: OutputFormat,
}

impl<'a> CompressRequest<'a> {
    pub fn new(source: &'a [u8], settings: &ProcessingSettings) -> Self {
        Self {
            source,
            max_dimension: settings.max_width,
            quality: settings.quality,
            format: settings.format,
        }
    }
}
