//! Image Normalizer
//!
//! Turns whatever the field device sent into an [`ImageTensor`]. Decoding
//! problems never reach the caller: the normalizer always hands back a
//! conformant tensor and logs what went wrong.

use base64::{engine::general_purpose, Engine as _};
use tracing::{debug, error, warn};

use super::{ImageTensor, NormalizeError};
use crate::capability::CapabilityFlags;

/// Input accepted by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    /// Base64-encoded image file (PNG, JPEG, ...), optionally as a data URL.
    Encoded(String),
    /// Packed RGB8 pixels, row-major.
    Raw { width: u32, height: u32, pixels: Vec<u8> },
}

impl From<String> for ImageInput {
    fn from(data: String) -> Self {
        ImageInput::Encoded(data)
    }
}

impl From<&str> for ImageInput {
    fn from(data: &str) -> Self {
        ImageInput::Encoded(data.to_string())
    }
}

/// Which normalizer branch produced a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizePath {
    Decoded,
    Placeholder,
    Random,
}

pub struct ImageNormalizer {
    flags: CapabilityFlags,
}

impl ImageNormalizer {
    pub fn new(flags: CapabilityFlags) -> Self {
        Self { flags }
    }

    pub fn normalize(&self, input: &ImageInput) -> ImageTensor {
        self.normalize_traced(input).0
    }

    /// Like [`normalize`](Self::normalize) but also reports the branch taken.
    pub fn normalize_traced(&self, input: &ImageInput) -> (ImageTensor, NormalizePath) {
        if !self.flags.codec_available {
            warn!("Image codec not available, using placeholder image for preprocessing");
            return (ImageTensor::placeholder(), NormalizePath::Placeholder);
        }

        match decode(input) {
            Ok(tensor) => (tensor, NormalizePath::Decoded),
            Err(e) => {
                error!("Error preprocessing image: {}", e);
                (ImageTensor::random(), NormalizePath::Random)
            }
        }
    }
}

/// Strip an optional `data:<mime>;base64,` prefix and any whitespace, then decode.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, NormalizeError> {
    let payload = match data.trim_start().strip_prefix("data:") {
        Some(rest) => rest
            .split_once("base64,")
            .map(|(_, body)| body)
            .ok_or(NormalizeError::InvalidDataUrl)?,
        None => data,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }
    Ok(general_purpose::STANDARD.decode(compact)?)
}

#[cfg(feature = "codec")]
fn decode(input: &ImageInput) -> Result<ImageTensor, NormalizeError> {
    use image::{imageops::FilterType, RgbImage};
    use ndarray::Array3;

    use super::tensor::{INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};

    let rgb: RgbImage = match input {
        ImageInput::Encoded(data) => {
            let bytes = decode_base64(data)?;
            let decoded = image::load_from_memory(&bytes)?;
            debug!("Decoded {}x{} image ({:?})", decoded.width(), decoded.height(), decoded.color());
            decoded.to_rgb8()
        }
        ImageInput::Raw { width, height, pixels } => {
            let expected = (*width as usize)
                .checked_mul(*height as usize)
                .and_then(|n| n.checked_mul(INPUT_CHANNELS))
                .ok_or(NormalizeError::RawLength {
                    expected: usize::MAX,
                    found: pixels.len(),
                })?;
            if expected == 0 || pixels.len() != expected {
                return Err(NormalizeError::RawLength {
                    expected,
                    found: pixels.len(),
                });
            }
            RgbImage::from_raw(*width, *height, pixels.clone()).ok_or(NormalizeError::RawLength {
                expected,
                found: pixels.len(),
            })?
        }
    };

    let resized = image::imageops::resize(
        &rgb,
        INPUT_WIDTH as u32,
        INPUT_HEIGHT as u32,
        FilterType::CatmullRom,
    );
    let scaled: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();

    let data = Array3::from_shape_vec((INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS), scaled)?;
    ImageTensor::try_from_array(data)
}

#[cfg(not(feature = "codec"))]
fn decode(_input: &ImageInput) -> Result<ImageTensor, NormalizeError> {
    Err(NormalizeError::CodecUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_conformant(t: &ImageTensor) {
        assert_eq!(t.shape(), &ImageTensor::SHAPE);
        assert!(t.view().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_no_codec_gives_placeholder() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::none());
        let (tensor, path) = normalizer.normalize_traced(&ImageInput::from("####"));
        assert_eq!(path, NormalizePath::Placeholder);
        assert_eq!(tensor, ImageTensor::placeholder());
    }

    #[test]
    fn test_invalid_base64_falls_back_to_random() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::all());
        let (tensor, path) = normalizer.normalize_traced(&ImageInput::from("####"));
        assert_eq!(path, NormalizePath::Random);
        assert_conformant(&tensor);
    }

    #[test]
    fn test_raw_buffer_with_huge_dimensions() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::all());
        let input = ImageInput::Raw {
            width: u32::MAX,
            height: u32::MAX,
            pixels: vec![0; 12],
        };
        let (tensor, path) = normalizer.normalize_traced(&input);
        assert_eq!(path, NormalizePath::Random);
        assert_conformant(&tensor);
    }

    #[test]
    fn test_valid_base64_but_not_an_image() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::all());
        let not_an_image = general_purpose::STANDARD.encode(b"definitely not a png");
        let (tensor, path) = normalizer.normalize_traced(&ImageInput::Encoded(not_an_image));
        assert_eq!(path, NormalizePath::Random);
        assert_conformant(&tensor);
    }

    #[test]
    fn test_raw_buffer_with_wrong_length() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::all());
        let input = ImageInput::Raw { width: 4, height: 4, pixels: vec![0; 10] };
        let (tensor, path) = normalizer.normalize_traced(&input);
        assert_eq!(path, NormalizePath::Random);
        assert_conformant(&tensor);
    }

    #[test]
    fn test_decode_base64_strips_data_url_and_whitespace() {
        let encoded = general_purpose::STANDARD.encode(b"leaf");
        let wrapped = format!("data:image/png;base64,{}\n", encoded);
        assert_eq!(decode_base64(&wrapped).unwrap(), b"leaf");

        let spaced = format!("{} {}", &encoded[..4], &encoded[4..]);
        assert_eq!(decode_base64(&spaced).unwrap(), b"leaf");
    }

    #[test]
    fn test_decode_base64_errors() {
        assert!(matches!(decode_base64("   "), Err(NormalizeError::EmptyInput)));
        assert!(matches!(decode_base64("data:image/png,abc"), Err(NormalizeError::InvalidDataUrl)));
        assert!(matches!(decode_base64("####"), Err(NormalizeError::InvalidBase64(_))));
    }

    #[cfg(feature = "codec")]
    #[test]
    fn test_raw_buffer_is_resized_and_scaled() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::all());
        let pixels = [255u8, 0, 0].repeat(8 * 6);
        let input = ImageInput::Raw { width: 8, height: 6, pixels };
        let (tensor, path) = normalizer.normalize_traced(&input);
        assert_eq!(path, NormalizePath::Decoded);
        assert_conformant(&tensor);
        let v = tensor.view();
        assert!((v[[112, 112, 0]] - 1.0).abs() < 1e-6);
        assert!(v[[112, 112, 1]].abs() < 1e-6);
    }

    #[cfg(feature = "codec")]
    #[test]
    fn test_canonical_png_round_trips_through_decoder() {
        let normalizer = ImageNormalizer::new(CapabilityFlags::all());
        let encoded = crate::vision::canonical_test_image_base64(&CapabilityFlags::all()).unwrap();
        let (tensor, path) = normalizer.normalize_traced(&ImageInput::Encoded(encoded));
        assert_eq!(path, NormalizePath::Decoded);
        let v = tensor.view();
        // Same size as the model input, so no resampling blur in the patch centre.
        assert!((v[[100, 100, 1]] - 139.0 / 255.0).abs() < 1e-6);
        assert!((v[[10, 10, 1]] - 128.0 / 255.0).abs() < 1e-6);
    }
}
