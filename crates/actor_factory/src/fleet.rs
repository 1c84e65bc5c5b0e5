//! Fleet description and spawn result.

use std::collections::HashMap;

use contracts::{ActorId, Transform};

/// Default vehicle blueprint
pub const DEFAULT_VEHICLE_BLUEPRINT: &str = "vehicle.tesla.model3";

/// Forward-mounted RGB camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSpec {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Horizontal field of view in degrees
    pub fov: f32,
    /// Mount pose relative to the vehicle
    pub mount: Transform,
}

impl CameraSpec {
    /// Blueprint attributes for `sensor.camera.rgb`
    pub fn attributes(&self) -> HashMap<String, String> {
        HashMap::from([
            ("image_size_x".to_string(), self.width.to_string()),
            ("image_size_y".to_string(), self.height.to_string()),
            ("fov".to_string(), self.fov.to_string()),
        ])
    }
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov: 90.0,
            // front bumper, 1.5m high
            mount: Transform::from_location(2.0, 0.0, 1.5),
        }
    }
}

/// What to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSpec {
    /// Requested vehicle count
    pub count: usize,
    /// Vehicle blueprint name
    pub vehicle_blueprint: String,
    /// Camera attached to every vehicle
    pub camera: CameraSpec,
    /// GNSS mount pose relative to the vehicle
    pub gnss_mount: Transform,
}

impl FleetSpec {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    /// Identity string of the i-th vehicle
    pub fn vehicle_id(index: usize) -> String {
        format!("carla_vehicle_{index}")
    }
}

impl Default for FleetSpec {
    fn default() -> Self {
        let camera = CameraSpec::default();
        Self {
            count: 3,
            vehicle_blueprint: DEFAULT_VEHICLE_BLUEPRINT.to_string(),
            gnss_mount: camera.mount,
            camera,
        }
    }
}

/// A vehicle with both sensors attached
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedVehicle {
    /// Identity string (`carla_vehicle_{index}`)
    pub id: String,
    /// Spawn point index
    pub index: usize,
    /// Vehicle actor
    pub actor: ActorId,
    /// Camera actor
    pub camera: ActorId,
    /// GNSS actor
    pub gnss: ActorId,
    /// Where it was spawned
    pub spawn_point: Transform,
}

impl SpawnedVehicle {
    /// Sensor config id for the camera
    pub fn camera_sensor_id(&self) -> String {
        format!("{}/camera", self.id)
    }

    /// Sensor config id for the GNSS
    pub fn gnss_sensor_id(&self) -> String {
        format!("{}/gnss", self.id)
    }
}

/// Spawn result
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    /// Requested vehicle count
    pub requested: usize,
    /// Spawn points offered by the map
    pub available_spawn_points: usize,
    /// Successfully spawned vehicles, in spawn order
    pub vehicles: Vec<SpawnedVehicle>,
}

impl Fleet {
    /// Demand exceeded the offered spawn points
    pub fn was_clamped(&self) -> bool {
        self.requested > self.available_spawn_points
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
