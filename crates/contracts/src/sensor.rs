//! SensorPacket - raw sensor callback output, and the decoded frame type.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Sensor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Camera,
    Gnss,
}

impl SensorType {
    /// CARLA blueprint id for this sensor type
    pub fn blueprint(self) -> &'static str {
        match self {
            SensorType::Camera => "sensor.camera.rgb",
            SensorType::Gnss => "sensor.other.gnss",
        }
    }
}

/// Sensor data packet
///
/// Raw data received from a CARLA sensor callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPacket {
    /// Sensor ID
    pub sensor_id: String,

    /// Sensor type
    pub sensor_type: SensorType,

    /// CARLA simulation timestamp (seconds)
    pub timestamp: f64,

    /// Optional simulation frame number (ordering/diagnostics)
    pub frame_id: Option<u64>,

    /// Payload
    pub payload: SensorPayload,
}

/// Sensor payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// Camera image
    Image(ImageData),

    /// Positioning reading
    Gnss(GnssData),
}

/// Image data as delivered by the sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Image width
    pub width: u32,

    /// Image height
    pub height: u32,

    /// Pixel format
    pub format: ImageFormat,

    /// Raw pixel data
    pub data: Bytes,
}

/// Image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Rgb8,
    Rgba8,
    Bgra8,
}

impl ImageFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Rgb8 => 3,
            ImageFormat::Rgba8 | ImageFormat::Bgra8 => 4,
        }
    }
}

/// GNSS data (positioning reading)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GnssData {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Altitude (meters)
    pub altitude: f64,
}

/// Decoded camera frame
///
/// Row-major pixel array of `height × width × 3` bytes in RGB order.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    pixels: Bytes,
}

impl RgbFrame {
    /// Wrap an RGB pixel buffer, `None` if its length is not `width * height * 3`
    pub fn new(width: u32, height: u32, pixels: impl Into<Bytes>) -> Option<Self> {
        let pixels = pixels.into();
        if pixels.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Uniformly filled frame
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels: Vec<u8> = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            pixels: Bytes::from(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGB bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at (x, y), `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]])
    }
}
