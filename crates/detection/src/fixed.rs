//! Stub model returning the same detections for every frame

use contracts::{ContractError, DetectionModel, RawDetection, RgbFrame};

/// Fixed detector
///
/// Stands in for a real model in tests and mock runs.
#[derive(Debug, Clone, Default)]
pub struct FixedDetector {
    detections: Vec<RawDetection>,
    calls: u64,
}

impl FixedDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            calls: 0,
        }
    }

    /// One detection of `label` covering the frame centre
    pub fn single(label: &str, confidence: f32) -> Self {
        Self::new(vec![RawDetection::new(
            [100.0, 100.0, 200.0, 200.0],
            confidence,
            label,
        )])
    }

    /// Frames inferred so far
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectionModel for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn infer(&mut self, _frame: &RgbFrame) -> Result<Vec<RawDetection>, ContractError> {
        self.calls += 1;
        Ok(self.detections.clone())
    }
}
