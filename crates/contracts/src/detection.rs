//! Detection model contract and detection records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ContractError, RgbFrame};

/// Object classes forwarded to agents
///
/// Any label outside this allow-list is discarded by the detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Car,
    Truck,
    Bus,
    Person,
    Bicycle,
    Motorcycle,
}

impl ObjectClass {
    /// Every allowed class
    pub const ALL: [ObjectClass; 6] = [
        ObjectClass::Car,
        ObjectClass::Truck,
        ObjectClass::Bus,
        ObjectClass::Person,
        ObjectClass::Bicycle,
        ObjectClass::Motorcycle,
    ];

    /// Map a model label onto the allow-list
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "car" => Some(ObjectClass::Car),
            "truck" => Some(ObjectClass::Truck),
            "bus" => Some(ObjectClass::Bus),
            "person" => Some(ObjectClass::Person),
            "bicycle" => Some(ObjectClass::Bicycle),
            "motorcycle" => Some(ObjectClass::Motorcycle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::Car => "car",
            ObjectClass::Truck => "truck",
            ObjectClass::Bus => "bus",
            ObjectClass::Person => "person",
            ObjectClass::Bicycle => "bicycle",
            ObjectClass::Motorcycle => "motorcycle",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unfiltered model output
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Bounding box [x1, y1, x2, y2] in pixels
    pub bbox: [f32; 4],

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Label as named by the model
    pub label: String,
}

impl RawDetection {
    pub fn new(bbox: [f32; 4], confidence: f32, label: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            label: label.into(),
        }
    }
}

/// One detected object of an allowed class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Bounding box [x1, y1, x2, y2] in pixels
    pub bbox: [f32; 4],

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Object class
    pub class: ObjectClass,
}

/// Object detection model
///
/// Model identity and weights are external; implementations only have to map
/// a frame to labelled boxes.
pub trait DetectionModel: Send {
    /// Model name (used for logging)
    fn name(&self) -> &str;

    /// Run inference on one frame
    fn infer(&mut self, frame: &RgbFrame) -> Result<Vec<RawDetection>, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_labels() {
        for class in ObjectClass::ALL {
            assert_eq!(ObjectClass::from_label(class.as_str()), Some(class));
        }
        assert_eq!(ObjectClass::from_label("dog"), None);
        assert_eq!(ObjectClass::from_label("Car"), None);
    }
}
