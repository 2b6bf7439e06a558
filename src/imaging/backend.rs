//! Compression primitive trait and shared error type.
//!
//! The [`Compressor`] trait is the single seam between the processing engine
//! and any codec work: source bytes + max dimension + quality + output format
//! in, encoded bytes out, or a failure.
//!
//! The production implementation is
//! [`RustCompressor`](super::rust_backend::RustCompressor), pure Rust on the
//! `image` crate. Tests use the [`MockCompressor`](tests::MockCompressor),
//! which records requests and fails on demand.

use super::params::CompressRequest;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompressError {
    #[error("quality {0} is outside (0, 1]")]
    InvalidQuality(f32),
    #[error("max dimension must be greater than zero")]
    InvalidDimension,
    #[error("could not decode source image: {0}")]
    Decode(String),
    #[error("could not encode output image: {0}")]
    Encode(String),
}

/// Trait for compression backends.
pub trait Compressor: Sync {
    /// Decode, downscale to fit `max_dimension`, and re-encode.
    fn compress(&self, request: &CompressRequest<'_>) -> Result<Vec<u8>, CompressError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::settings::OutputFormat;
    use std::sync::Mutex;

    /// Source bytes the mock refuses, standing in for a corrupt file.
    pub const CORRUPT: &[u8] = b"corrupt";

    /// Mock compressor that records requests without touching codecs.
    /// Uses Mutex (not RefCell) so it is Sync like the real backend.
    ///
    /// Output bytes are `"<ext>:"` followed by the source bytes, so tests can
    /// tell which request produced which result.
    #[derive(Default)]
    pub struct MockCompressor {
        pub requests: Mutex<Vec<RecordedRequest>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub source: Vec<u8>,
        pub max_dimension: u32,
        pub quality: f32,
        pub format: OutputFormat,
    }

    impl MockCompressor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Compressor for MockCompressor {
        fn compress(&self, request: &CompressRequest<'_>) -> Result<Vec<u8>, CompressError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                source: request.source.to_vec(),
                max_dimension: request.max_dimension,
                quality: request.quality,
                format: request.format,
            });

            if request.source == CORRUPT {
                return Err(CompressError::Decode("mock: corrupt input".into()));
            }
            let mut out = format!("{}:", request.format.extension()).into_bytes();
            out.extend_from_slice(request.source);
            Ok(out)
        }
    }

    #[test]
    fn mock_records_request() {
        let compressor = MockCompressor::new();
        let out = compressor
            .compress(&CompressRequest {
                source: b"abc",
                max_dimension: 800,
                quality: 0.8,
                format: OutputFormat::Webp,
            })
            .unwrap();

        assert_eq!(out, b"webp:abc");
        let requests = compressor.get_requests();
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            &requests[0],
            RecordedRequest {
                max_dimension: 800,
                format: OutputFormat::Webp,
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_on_corrupt_marker() {
        let compressor = MockCompressor::new();
        let result = compressor.compress(&CompressRequest {
            source: CORRUPT,
            max_dimension: 800,
            quality: 0.8,
            format: OutputFormat::Png,
        });
        assert!(matches!(result, Err(CompressError::Decode(_))));
        assert_eq!(compressor.get_requests().len(), 1);
    }
}
