//! Camera payload decoding

use contracts::{ImageData, ImageFormat, RgbFrame};

use crate::error::{IngestionError, Result};

/// Decode a raw camera payload into an RGB frame
///
/// Alpha is discarded and channels are reordered to RGB.
///
/// # Errors
/// When the payload length does not match `width * height * bpp`.
pub fn decode_image(sensor_id: &str, image: &ImageData) -> Result<RgbFrame> {
    let bpp = image.format.bytes_per_pixel();
    let pixel_count = image.width as usize * image.height as usize;
    let expected = pixel_count * bpp;

    if image.data.len() != expected {
        return Err(IngestionError::decode(
            sensor_id,
            format!(
                "{}x{} {:?} needs {} bytes, got {}",
                image.width,
                image.height,
                image.format,
                expected,
                image.data.len()
            ),
        ));
    }

    let pixels = match image.format {
        ImageFormat::Rgb8 => image.data.clone(),
        ImageFormat::Rgba8 => image
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect::<Vec<u8>>()
            .into(),
        ImageFormat::Bgra8 => image
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect::<Vec<u8>>()
            .into(),
    };

    RgbFrame::new(image.width, image.height, pixels)
        .ok_or_else(|| IngestionError::decode(sensor_id, "pixel buffer size mismatch"))
}
