//! Runtime handles, poses and world settings.

use serde::{Deserialize, Serialize};

/// CARLA actor handle type
pub type ActorId = u32;

/// Fixed simulation step used by the bridge (20 Hz)
pub const FIXED_DELTA_SECONDS: f64 = 0.05;

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z) in meters
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    pub rotation: Rotation,
}

impl Transform {
    /// Transform at `location` with no rotation
    pub fn from_location(x: f64, y: f64, z: f64) -> Self {
        Self {
            location: Location { x, y, z },
            rotation: Rotation::default(),
        }
    }

    /// Heading in degrees (the yaw component)
    pub fn heading_deg(&self) -> f64 {
        self.rotation.yaw
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Episode settings applied to the simulated world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    /// World only advances on explicit ticks
    pub synchronous_mode: bool,

    /// Fixed simulated step in seconds (None = variable step)
    pub fixed_delta_seconds: Option<f64>,

    /// Disable rendering entirely (cameras need it on)
    pub no_rendering_mode: bool,
}

impl WorldSettings {
    /// Synchronous stepping at the bridge's fixed delta, rendering on
    pub fn synchronous() -> Self {
        Self {
            synchronous_mode: true,
            fixed_delta_seconds: Some(FIXED_DELTA_SECONDS),
            no_rendering_mode: false,
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            synchronous_mode: false,
            fixed_delta_seconds: None,
            no_rendering_mode: false,
        }
    }
}
