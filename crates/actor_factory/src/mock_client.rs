//! Mock simulator client
//!
//! In-process stand-in for a CARLA server running in synchronous mode.
//! Every `tick` delivers one measurement to each listening sensor before it
//! returns. Supports failure injection for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    ActorId, GnssData, ImageData, ImageFormat, SensorPacket, SensorPayload, SensorSource,
    SensorType, Transform, WorldSettings,
};
use tracing::{debug, instrument, trace};

use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_sensor::{MockSensor, SensorSlot};

/// Mock client configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Spawn points offered by the mock map
    pub spawn_points: usize,
    /// Refuse connections
    pub unreachable: bool,
    /// Zero-based `spawn_vehicle` calls that fail
    pub fail_vehicle_spawns: Vec<usize>,
    /// Sensor blueprints that fail to spawn
    pub fail_sensor_blueprints: Vec<String>,
    /// Actor IDs whose destroy fails
    pub fail_destroy: Vec<ActorId>,
    /// GNSS sensors deliver readings on tick
    pub emit_gnss: bool,
    /// Sleep one fixed delta per tick, like a server rendering in real time
    pub pace_ticks: bool,
    /// Yaw change per tick (degrees)
    pub yaw_rate_deg: f64,
    /// GNSS reading at frame 0
    pub origin: GnssData,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            spawn_points: 20,
            unreachable: false,
            fail_vehicle_spawns: Vec::new(),
            fail_sensor_blueprints: Vec::new(),
            fail_destroy: Vec::new(),
            emit_gnss: true,
            pace_ticks: false,
            yaw_rate_deg: 1.0,
            origin: GnssData {
                latitude: 49.0,
                longitude: 8.0,
                altitude: 100.0,
            },
        }
    }
}

enum MockActor {
    Vehicle {
        blueprint: String,
        transform: Transform,
    },
    Sensor {
        blueprint: String,
        parent: ActorId,
        sensor_type: SensorType,
        width: u32,
        height: u32,
        slot: Arc<SensorSlot>,
    },
}

struct MockWorld {
    config: MockConfig,
    connected: AtomicBool,
    settings: Mutex<WorldSettings>,
    saved_settings: Mutex<Option<WorldSettings>>,
    frame: AtomicU64,
    next_actor_id: AtomicU32,
    vehicle_spawns: AtomicUsize,
    actors: Mutex<HashMap<ActorId, MockActor>>,
}

/// Mock simulator client
///
/// Cheap to clone; clones share the same mock world.
#[derive(Clone)]
pub struct MockSimulatorClient {
    world: Arc<MockWorld>,
}

/// Sensor delivery planned for one tick
struct Delivery {
    sensor_id: ActorId,
    parent: ActorId,
    sensor_type: SensorType,
    width: u32,
    height: u32,
    slot: Arc<SensorSlot>,
}

impl MockSimulatorClient {
    /// Create default mock client
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create mock client from configuration
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            world: Arc::new(MockWorld {
                config,
                connected: AtomicBool::new(false),
                settings: Mutex::new(WorldSettings::default()),
                saved_settings: Mutex::new(None),
                frame: AtomicU64::new(0),
                // start from 1000, easy to recognise
                next_actor_id: AtomicU32::new(1000),
                vehicle_spawns: AtomicUsize::new(0),
                actors: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.actors().len()
    }

    /// All live actor IDs
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        self.actors().keys().copied().collect()
    }

    /// Current simulation frame
    pub fn frame(&self) -> u64 {
        self.world.frame.load(Ordering::SeqCst)
    }

    /// Active world settings
    pub fn settings(&self) -> WorldSettings {
        *self
            .world
            .settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Connection state
    pub fn is_connected(&self) -> bool {
        self.world.connected.load(Ordering::SeqCst)
    }

    fn actors(&self) -> std::sync::MutexGuard<'_, HashMap<ActorId, MockActor>> {
        self.world
            .actors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.world.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ActorFactoryError::connection("not connected"))
        }
    }

    fn mock_spawn_point(index: usize) -> Transform {
        Transform::from_location(10.0 * index as f64, -5.0 * index as f64, 0.5)
    }

    /// Advance vehicle yaw and collect the sensors to deliver to
    fn step_actors(&self) -> Vec<Delivery> {
        let yaw_rate = self.world.config.yaw_rate_deg;
        let mut actors = self.actors();
        let mut deliveries = Vec::new();

        for (&actor_id, actor) in actors.iter_mut() {
            match actor {
                MockActor::Vehicle { transform, .. } => {
                    transform.rotation.yaw = (transform.rotation.yaw + yaw_rate) % 360.0;
                }
                MockActor::Sensor {
                    parent,
                    sensor_type,
                    width,
                    height,
                    slot,
                    ..
                } => deliveries.push(Delivery {
                    sensor_id: actor_id,
                    parent: *parent,
                    sensor_type: *sensor_type,
                    width: *width,
                    height: *height,
                    slot: slot.clone(),
                }),
            }
        }

        deliveries.sort_by_key(|d| d.sensor_id);
        deliveries
    }

    fn payload_for(&self, delivery: &Delivery, frame: u64) -> Option<SensorPayload> {
        match delivery.sensor_type {
            SensorType::Camera => {
                let size = delivery.width as usize * delivery.height as usize * 4;
                Some(SensorPayload::Image(ImageData {
                    width: delivery.width,
                    height: delivery.height,
                    format: ImageFormat::Bgra8,
                    data: Bytes::from(vec![128u8; size]),
                }))
            }
            SensorType::Gnss if self.world.config.emit_gnss => {
                let origin = self.world.config.origin;
                let drift = frame as f64 * 1e-6;
                let lane = delivery.parent as f64 * 1e-4;
                Some(SensorPayload::Gnss(GnssData {
                    latitude: origin.latitude + drift + lane,
                    longitude: origin.longitude + drift,
                    altitude: origin.altitude,
                }))
            }
            SensorType::Gnss => None,
        }
    }
}

impl Default for MockSimulatorClient {
    fn default() -> Self {
        Self::new()
    }
}

fn attribute_u32(attributes: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    attributes
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl SimulatorClient for MockSimulatorClient {
    #[instrument(name = "mock_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.world.config.unreachable {
            return Err(ActorFactoryError::connection(format!(
                "mock server at {host}:{port} unreachable"
            )));
        }
        self.world.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[instrument(name = "mock_carla_configure_world", skip(self))]
    async fn configure_world(&self, settings: WorldSettings) -> Result<WorldSettings> {
        self.ensure_connected()?;
        let mut current = self
            .world
            .settings
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *current, settings);
        self.world
            .saved_settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_or_insert(previous);
        Ok(previous)
    }

    async fn tick(&self) -> Result<u64> {
        self.ensure_connected()?;

        let settings = self.settings();
        if self.world.config.pace_ticks {
            if let Some(delta) = settings.fixed_delta_seconds {
                tokio::time::sleep(Duration::from_secs_f64(delta)).await;
            }
        }

        let frame = self.world.frame.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = frame as f64 * settings.fixed_delta_seconds.unwrap_or(0.05);

        // Deliver outside the actor lock so callbacks never contend with it
        for delivery in self.step_actors() {
            if let Some(payload) = self.payload_for(&delivery, frame) {
                delivery.slot.deliver(SensorPacket {
                    sensor_id: delivery.sensor_id.to_string(),
                    sensor_type: delivery.sensor_type,
                    timestamp,
                    frame_id: Some(frame),
                    payload,
                });
            }
        }

        trace!(frame, "mock world ticked");
        Ok(frame)
    }

    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.ensure_connected()?;
        Ok((0..self.world.config.spawn_points)
            .map(Self::mock_spawn_point)
            .collect())
    }

    #[instrument(name = "mock_carla_spawn_vehicle", skip(self, transform), fields(blueprint = %blueprint))]
    async fn spawn_vehicle(&self, blueprint: &str, transform: Transform) -> Result<ActorId> {
        self.ensure_connected()?;

        let attempt = self.world.vehicle_spawns.fetch_add(1, Ordering::SeqCst);
        if self.world.config.fail_vehicle_spawns.contains(&attempt) {
            return Err(ActorFactoryError::vehicle_spawn(
                blueprint,
                "mock failure",
            ));
        }

        let actor_id = self.allocate_actor_id();
        self.actors().insert(
            actor_id,
            MockActor::Vehicle {
                blueprint: blueprint.to_string(),
                transform,
            },
        );
        debug!(actor_id, "mock vehicle spawned with autopilot");
        Ok(actor_id)
    }

    #[instrument(
        name = "mock_carla_spawn_sensor",
        skip(self, _transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        _transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        let sensor_type = match blueprint {
            "sensor.camera.rgb" => SensorType::Camera,
            "sensor.other.gnss" => SensorType::Gnss,
            other => {
                return Err(ActorFactoryError::sensor_spawn(
                    other,
                    format!("actor_{parent_id}"),
                    format!("blueprint '{other}' not found"),
                ))
            }
        };

        let mut actors = self.actors();

        if !matches!(actors.get(&parent_id), Some(MockActor::Vehicle { .. })) {
            return Err(ActorFactoryError::sensor_spawn(
                blueprint,
                format!("actor_{parent_id}"),
                "parent vehicle not found",
            ));
        }

        if self
            .world
            .config
            .fail_sensor_blueprints
            .iter()
            .any(|b| b == blueprint)
        {
            return Err(ActorFactoryError::sensor_spawn(
                blueprint,
                format!("actor_{parent_id}"),
                "mock failure",
            ));
        }

        let actor_id = self.allocate_actor_id();
        actors.insert(
            actor_id,
            MockActor::Sensor {
                blueprint: blueprint.to_string(),
                parent: parent_id,
                sensor_type,
                width: attribute_u32(attributes, "image_size_x", 800),
                height: attribute_u32(attributes, "image_size_y", 600),
                slot: Arc::new(SensorSlot::default()),
            },
        );
        Ok(actor_id)
    }

    async fn actor_transform(&self, actor_id: ActorId) -> Result<Transform> {
        match self.actors().get(&actor_id) {
            Some(MockActor::Vehicle { transform, .. }) => Ok(*transform),
            Some(MockActor::Sensor { parent, .. }) => {
                Err(ActorFactoryError::Contract(contracts::ContractError::Other(
                    format!("actor {actor_id} is a sensor attached to {parent}"),
                )))
            }
            None => Err(ActorFactoryError::ActorNotFound { actor_id }),
        }
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.world.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // Idempotent: Ok even if the actor does not exist
        let removed = self.actors().remove(&actor_id);
        match removed {
            Some(MockActor::Sensor {
                slot, blueprint, ..
            }) => {
                slot.stop();
                trace!(actor_id, blueprint = %blueprint, "mock sensor destroyed");
            }
            Some(MockActor::Vehicle { blueprint, .. }) => {
                trace!(actor_id, blueprint = %blueprint, "mock vehicle destroyed");
            }
            None => {}
        }
        Ok(())
    }

    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.actors().contains_key(&actor_id))
    }

    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>> {
        match self.actors().get(&actor_id) {
            Some(MockActor::Sensor {
                sensor_type: actual,
                slot,
                ..
            }) if *actual == sensor_type => Some(Box::new(MockSensor::new(
                sensor_id,
                sensor_type,
                slot.clone(),
            ))),
            _ => None,
        }
    }

    #[instrument(name = "mock_carla_teardown", skip(self))]
    async fn teardown(&self) -> Result<()> {
        let saved = self
            .world
            .saved_settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(previous) = saved {
            *self
                .world
                .settings
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = previous;
        }
        self.world.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
