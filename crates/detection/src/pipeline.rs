//! Detection pipeline

use contracts::{Detection, DetectionModel, ObjectClass, RgbFrame};
use metrics::counter;
use tracing::{debug, info, trace, warn};

/// Detection pipeline
///
/// Wraps an optional model. Without one the pipeline is disabled and every
/// frame yields no detections.
pub struct DetectionPipeline {
    model: Option<Box<dyn DetectionModel>>,
}

impl DetectionPipeline {
    pub fn new(model: Option<Box<dyn DetectionModel>>) -> Self {
        match &model {
            Some(m) => info!(model = m.name(), "detection pipeline enabled"),
            None => info!("detection pipeline disabled"),
        }
        Self { model }
    }

    /// Pipeline that never detects anything
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Model name, None when disabled
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    /// Detect objects in one frame
    ///
    /// Only allow-listed classes are returned; confidence is passed through
    /// untouched. A model failure is logged and yields no detections.
    pub fn detect(&mut self, frame: &RgbFrame) -> Vec<Detection> {
        let Some(model) = self.model.as_mut() else {
            return Vec::new();
        };

        let raw = match model.infer(frame) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(model = model.name(), error = %e, "inference failed, frame skipped");
                counter!("carla_bridge_inference_failures_total").increment(1);
                return Vec::new();
            }
        };

        let total = raw.len();
        let detections: Vec<Detection> = raw
            .into_iter()
            .filter_map(|d| match ObjectClass::from_label(&d.label) {
                Some(class) => Some(Detection {
                    bbox: d.bbox,
                    confidence: d.confidence,
                    class,
                }),
                None => {
                    trace!(label = %d.label, "detection outside allow-list dropped");
                    None
                }
            })
            .collect();

        debug!(
            total,
            kept = detections.len(),
            "frame {}x{} scored",
            frame.width(),
            frame.height()
        );
        detections
    }
}
