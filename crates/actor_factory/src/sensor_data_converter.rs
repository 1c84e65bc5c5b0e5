//! CARLA sensor data conversion
//!
//! Turns native CARLA measurements into `SensorPacket`s.
//! Only compiled when the `real-carla` feature is enabled.

use bytes::Bytes;
use carla::sensor::data::{GnssMeasurement, Image};
use carla::sensor::{SensorData, SensorDataBase};
use contracts::{GnssData, ImageData, ImageFormat, SensorPacket, SensorPayload, SensorType};

/// CARLA cameras deliver BGRA, 4 bytes per pixel
fn image_to_payload(image: &Image) -> SensorPayload {
    SensorPayload::Image(ImageData {
        width: image.width() as u32,
        height: image.height() as u32,
        format: ImageFormat::Bgra8,
        data: Bytes::copy_from_slice(image.as_raw_bytes()),
    })
}

fn gnss_to_payload(gnss: &GnssMeasurement) -> SensorPayload {
    SensorPayload::Gnss(GnssData {
        latitude: gnss.latitude(),
        longitude: gnss.longitude(),
        // carla-rust names the altitude accessor `attitude`
        altitude: gnss.attitude(),
    })
}

/// Convert CARLA sensor data to a `SensorPacket`
///
/// Returns None if the measurement does not match `sensor_type`.
pub fn convert_sensor_data(
    sensor_id: &str,
    sensor_type: SensorType,
    data: &SensorData,
) -> Option<SensorPacket> {
    let payload = match sensor_type {
        SensorType::Camera => image_to_payload(&Image::try_from(data.clone()).ok()?),
        SensorType::Gnss => gnss_to_payload(&GnssMeasurement::try_from(data.clone()).ok()?),
    };

    Some(SensorPacket {
        sensor_id: sensor_id.to_string(),
        sensor_type,
        timestamp: data.timestamp(),
        frame_id: Some(data.frame() as u64),
        payload,
    })
}
