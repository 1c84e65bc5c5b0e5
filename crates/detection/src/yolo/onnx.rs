//! ONNX Runtime YOLOv8 backend

use std::path::Path;

use contracts::{ContractError, DetectionModel, RawDetection, RgbFrame};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{debug, info};

use super::letterbox::letterbox;
use super::postprocess::decode_output;
use super::{YoloConfig, INPUT_SIZE};
use crate::error::{DetectionError, Result};

/// YOLOv8 detector running an exported `.onnx` model on CPU
pub struct YoloOnnxDetector {
    session: Session,
    config: YoloConfig,
    name: String,
}

impl YoloOnnxDetector {
    /// Load a model with the default thresholds
    pub fn load(path: &Path) -> Result<Self> {
        Self::with_config(path, YoloConfig::default())
    }

    pub fn with_config(path: &Path, config: YoloConfig) -> Result<Self> {
        info!(path = %path.display(), "loading YOLOv8 model");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| DetectionError::model_load(path.display().to_string(), e.to_string()))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolov8".to_string());

        info!(model = %name, "YOLOv8 model loaded");
        Ok(Self {
            session,
            config,
            name,
        })
    }

    fn run(&mut self, frame: &RgbFrame) -> Result<Vec<RawDetection>> {
        let (input, geometry) = letterbox(frame, INPUT_SIZE)?;
        let size = INPUT_SIZE as usize;
        let shape = [1, 3, size, size];

        let inference = |e: ort::Error| ContractError::inference("yolov8", e.to_string());
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))
                .map_err(inference)?;
        let outputs = self
            .session
            .run(ort::inputs!["images" => input_value])
            .map_err(inference)?;

        let head = detection_head(outputs.len())?;
        let (out_shape, data) = outputs[head]
            .try_extract_tensor::<f32>()
            .map_err(inference)?;
        let out_shape: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();

        let detections = decode_output(data, &out_shape, &geometry, &self.config)?;
        debug!(count = detections.len(), "YOLOv8 inference done");
        Ok(detections)
    }
}

/// Index of the detection head, the model's first output
fn detection_head(outputs: usize) -> Result<usize> {
    if outputs == 0 {
        return Err(DetectionError::output_shape("model produced no outputs"));
    }
    Ok(0)
}

impl DetectionModel for YoloOnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&mut self, frame: &RgbFrame) -> std::result::Result<Vec<RawDetection>, ContractError> {
        self.run(frame).map_err(|e| match e {
            DetectionError::Contract(inner) => inner,
            other => ContractError::inference(self.name.clone(), other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_without_outputs_is_shape_error() {
        assert!(matches!(
            detection_head(0),
            Err(DetectionError::OutputShape { .. })
        ));
        assert_eq!(detection_head(2).unwrap(), 0);
    }
}
