use super::tensor::{INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, PATCH_END, PATCH_START};
use super::NormalizeError;
use crate::capability::CapabilityFlags;

/// Sent instead of a PNG when the codec is missing; it takes the placeholder path.
pub const MOCK_IMAGE_DATA: &str = "mock_image_data";

const FOREST_GREEN: [u8; 3] = [34, 139, 34];

/// 224×224 RGB8 leaf stand-in: green background, forest-green square in the middle.
pub fn canonical_test_pixels() -> Vec<u8> {
    let mut pixels = vec![0u8; INPUT_HEIGHT * INPUT_WIDTH * INPUT_CHANNELS];
    for (i, px) in pixels.chunks_exact_mut(INPUT_CHANNELS).enumerate() {
        let (row, col) = (i / INPUT_WIDTH, i % INPUT_WIDTH);
        let in_patch = (PATCH_START..PATCH_END).contains(&row) && (PATCH_START..PATCH_END).contains(&col);
        if in_patch {
            px.copy_from_slice(&FOREST_GREEN);
        } else {
            px[1] = 128;
        }
    }
    pixels
}

/// Base64 PNG of [`canonical_test_pixels`], or [`MOCK_IMAGE_DATA`] without a codec.
pub fn canonical_test_image_base64(flags: &CapabilityFlags) -> Result<String, NormalizeError> {
    if !flags.codec_available {
        tracing::warn!("Image codec not available, using mock base64 for test");
        return Ok(MOCK_IMAGE_DATA.to_string());
    }
    encode_png(canonical_test_pixels())
}

#[cfg(feature = "codec")]
fn encode_png(pixels: Vec<u8>) -> Result<String, NormalizeError> {
    use base64::{engine::general_purpose, Engine as _};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    let found = pixels.len();
    let image = RgbImage::from_raw(INPUT_WIDTH as u32, INPUT_HEIGHT as u32, pixels).ok_or(
        NormalizeError::RawLength {
            expected: INPUT_HEIGHT * INPUT_WIDTH * INPUT_CHANNELS,
            found,
        },
    )?;

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(buffer))
}

#[cfg(not(feature = "codec"))]
fn encode_png(_pixels: Vec<u8>) -> Result<String, NormalizeError> {
    Err(NormalizeError::CodecUnavailable)
}
