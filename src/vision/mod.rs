//! Vision Module
//!
//! Image input handling for the decision pipeline: the fixed-shape
//! [`ImageTensor`], the fallback-aware [`ImageNormalizer`], and the canonical
//! test image used by the self-test endpoint.

mod normalizer;
mod tensor;
mod test_image;

pub use normalizer::{decode_base64, ImageInput, ImageNormalizer, NormalizePath};
pub use tensor::{ImageTensor, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};
pub use test_image::{canonical_test_image_base64, canonical_test_pixels, MOCK_IMAGE_DATA};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no image data")]
    EmptyInput,
    #[error("data URL is missing a base64 payload")]
    InvalidDataUrl,
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[cfg(feature = "codec")]
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image codec is not compiled in")]
    CodecUnavailable,
    #[error("raw pixel buffer has {found} bytes, expected {expected}")]
    RawLength { expected: usize, found: usize },
    #[error("tensor shape {found:?} is not 224x224x3")]
    InvalidShape { found: Vec<usize> },
    #[error("tensor value {0} is outside [0, 1]")]
    OutOfRange(f32),
    #[error("tensor layout: {0}")]
    Layout(#[from] ndarray::ShapeError),
}
