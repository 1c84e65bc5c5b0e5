//! Letterbox pre-processing

use contracts::RgbFrame;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::PAD_VALUE;
use crate::error::{DetectionError, Result};

/// Geometry of a letterboxed frame, used to map boxes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize factor applied to the source frame
    pub scale: f32,
    /// Left padding in model pixels
    pub pad_x: f32,
    /// Top padding in model pixels
    pub pad_y: f32,
    pub src_width: u32,
    pub src_height: u32,
}

impl Letterbox {
    /// Map a model-space `[x1, y1, x2, y2]` box to source pixels, clamped
    pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
        let w = self.src_width as f32;
        let h = self.src_height as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, h),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, h),
        ]
    }
}

/// Resize `frame` to fit a `size`×`size` square, keeping aspect ratio
///
/// # Returns
/// Normalised CHW tensor data (`3 * size * size` values in [0, 1]) and the
/// letterbox geometry.
pub fn letterbox(frame: &RgbFrame, size: u32) -> Result<(Vec<f32>, Letterbox)> {
    let src = RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or_else(|| DetectionError::output_shape("frame buffer does not match its size"))?;

    let scale =
        (size as f32 / frame.width() as f32).min(size as f32 / frame.height() as f32);
    let new_w = ((frame.width() as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((frame.height() as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    if (new_w, new_h) == (frame.width(), frame.height()) {
        imageops::overlay(&mut canvas, &src, pad_x as i64, pad_y as i64);
    } else {
        let resized = imageops::resize(&src, new_w, new_h, FilterType::Triangle);
        imageops::overlay(&mut canvas, &resized, pad_x as i64, pad_y as i64);
    }

    let plane = (size * size) as usize;
    let mut input = vec![0.0f32; 3 * plane];
    for (i, px) in canvas.pixels().enumerate() {
        for c in 0..3 {
            input[c * plane + i] = px[c] as f32 / 255.0;
        }
    }

    Ok((
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            src_width: frame.width(),
            src_height: frame.height(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_frame_padded_top_and_bottom() {
        let frame = RgbFrame::filled(640, 480, [255, 0, 0]);
        let (input, geometry) = letterbox(&frame, 640).unwrap();

        assert_eq!(input.len(), 3 * 640 * 640);
        assert_eq!(geometry.scale, 1.0);
        assert_eq!(geometry.pad_x, 0.0);
        assert_eq!(geometry.pad_y, 80.0);

        let plane = 640 * 640;
        // top padding row
        assert!((input[0] - 114.0 / 255.0).abs() < 1e-6);
        // image centre, red channel then green channel
        let centre = 320 * 640 + 320;
        assert_eq!(input[centre], 1.0);
        assert_eq!(input[plane + centre], 0.0);
    }

    #[test]
    fn test_downscale_and_unmap() {
        let frame = RgbFrame::filled(1280, 640, [0, 0, 0]);
        let (_, geometry) = letterbox(&frame, 640).unwrap();

        assert_eq!(geometry.scale, 0.5);
        assert_eq!(geometry.pad_y, 160.0);

        let mapped = geometry.unmap([10.0, 170.0, 20.0, 900.0]);
        assert_eq!(mapped, [20.0, 20.0, 40.0, 640.0]);
    }
}
