//! OutboundMessage - one line of the agent protocol.

use serde::{Deserialize, Serialize};

use crate::{Detection, GnssData, ObjectClass};

/// Message forwarded to a vehicle's agent
///
/// One message per detected object. Serialized as a single JSON object per
/// line; field order matches the agent protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Bounding box [x1, y1, x2, y2] in pixels
    pub bbox: [f32; 4],

    /// Detection confidence (0.0-1.0)
    pub confidence: f32,

    /// Object class
    pub class_name: ObjectClass,

    /// GNSS latitude
    pub gps_lat: f64,

    /// GNSS longitude
    pub gps_lon: f64,

    /// GNSS altitude (meters)
    pub gps_alt: f64,

    /// Vehicle heading (degrees)
    pub heading: f64,

    /// Seconds since the UNIX epoch
    pub timestamp: f64,
}

impl OutboundMessage {
    /// Combine a detection with the vehicle's positioning snapshot
    pub fn new(detection: &Detection, gnss: GnssData, heading: f64, timestamp: f64) -> Self {
        Self {
            bbox: detection.bbox,
            confidence: detection.confidence,
            class_name: detection.class,
            gps_lat: gnss.latitude,
            gps_lon: gnss.longitude,
            gps_alt: gnss.altitude,
            heading,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_schema() {
        let detection = Detection {
            bbox: [1.0, 2.0, 3.0, 4.0],
            confidence: 0.5,
            class: ObjectClass::Person,
        };
        let gnss = GnssData {
            latitude: 48.1,
            longitude: 11.5,
            altitude: 520.0,
        };
        let msg = OutboundMessage::new(&detection, gnss, 90.0, 1_700_000_000.25);
        let json = serde_json::to_string(&msg).unwrap();

        assert_eq!(
            json,
            r#"{"bbox":[1.0,2.0,3.0,4.0],"confidence":0.5,"class_name":"person","gps_lat":48.1,"gps_lon":11.5,"gps_alt":520.0,"heading":90.0,"timestamp":1700000000.25}"#
        );

        let decoded: OutboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, msg);
    }
}
