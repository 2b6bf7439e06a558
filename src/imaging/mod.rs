//! Image compression, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Resize** | Lanczos3 to fit the longer edge |
//! | **Encode → JPEG** | `JpegEncoder` with percent quality |
//! | **Encode → PNG / WebP** | lossless `image` encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`CompressRequest`], what one compression should produce
//! - **Backend**: [`Compressor`] trait + [`RustCompressor`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{CompressError, Compressor};
pub use calculations::{fit_within, percent_quality};
pub use params::CompressRequest;
pub use rust_backend::{RustCompressor, supported_input_extensions};
