//! YOLOv8 support
//!
//! Pre-processing (letterbox), output decoding and class-aware NMS for the
//! standard `[1, 84, 8400]` COCO detection head. The ONNX Runtime backend is
//! behind the `onnx` feature; everything else is plain Rust.

mod labels;
mod letterbox;
mod postprocess;

#[cfg(feature = "onnx")]
mod onnx;

pub use labels::COCO_LABELS;
pub use letterbox::{letterbox, Letterbox};
pub use postprocess::{decode_output, iou, non_max_suppression, Candidate};

#[cfg(feature = "onnx")]
pub use onnx::YoloOnnxDetector;

/// Model input edge length
pub const INPUT_SIZE: u32 = 640;

/// Letterbox padding value
pub const PAD_VALUE: u8 = 114;

/// Thresholds applied inside the model wrapper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloConfig {
    /// Minimum class score for a candidate
    pub confidence: f32,
    /// IoU above which same-class boxes are suppressed
    pub iou: f32,
    /// Maximum boxes per frame
    pub max_detections: usize,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            iou: 0.7,
            max_detections: 300,
        }
    }
}
