//! # Detection
//!
//! Object detection pipeline.
//!
//! Responsibilities:
//! - Run a `DetectionModel` on one decoded frame
//! - Keep only the classes agents care about (car, truck, bus, person,
//!   bicycle, motorcycle)
//! - Degrade to an always-empty pipeline when no model is available
//! - YOLOv8 pre/post-processing, plus an ONNX Runtime backend
//!
//! ## Feature Flags
//!
//! - `onnx`: Enable `YoloOnnxDetector` (requires the ort crate)

mod error;
mod fixed;
mod pipeline;
pub mod yolo;

pub use error::{DetectionError, Result};
pub use fixed::FixedDetector;
pub use pipeline::DetectionPipeline;

#[cfg(feature = "onnx")]
pub use yolo::YoloOnnxDetector;

/// Load the detection pipeline from an optional model path
///
/// Missing path, a build without the `onnx` feature, or a model that fails to
/// load all yield a disabled pipeline with a warning.
pub fn load_pipeline(model_path: Option<&std::path::Path>) -> DetectionPipeline {
    let Some(path) = model_path else {
        tracing::warn!("no detection model configured, detection disabled");
        return DetectionPipeline::disabled();
    };

    #[cfg(feature = "onnx")]
    {
        match YoloOnnxDetector::load(path) {
            Ok(detector) => DetectionPipeline::new(Some(Box::new(detector))),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load detection model, detection disabled");
                DetectionPipeline::disabled()
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::warn!(
            path = %path.display(),
            "built without the `onnx` feature, detection disabled"
        );
        DetectionPipeline::disabled()
    }
}
