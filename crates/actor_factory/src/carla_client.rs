//! Real CARLA client implementation
//!
//! Connects to a CARLA server through the carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use contracts::{ActorId, SensorSource, SensorType, Transform, WorldSettings};
use tracing::{debug, info, instrument, warn};

use crate::carla_sensor_source::CarlaSensorSource;
use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};

/// Real CARLA client
///
/// Uses Mutex for interior mutability so `&self` methods can drive the World.
#[derive(Clone)]
pub struct RealCarlaClient {
    timeout: Duration,
    client: Arc<Mutex<Option<Client>>>,
    world: Arc<Mutex<Option<World>>>,
    /// Settings replaced by `configure_world`
    saved_settings: Arc<Mutex<Option<WorldSettings>>>,
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    ///
    /// `timeout` bounds every RPC to the server.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: Arc::new(Mutex::new(None)),
            world: Arc::new(Mutex::new(None)),
            saved_settings: Arc::new(Mutex::new(None)),
            actors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut guard = lock(&self.world);
        let world = guard
            .as_mut()
            .ok_or_else(|| ActorFactoryError::connection("not connected to CARLA server"))?;
        f(world)
    }

    fn current_settings(world: &World) -> WorldSettings {
        let settings = world.settings();
        WorldSettings {
            synchronous_mode: settings.synchronous_mode,
            fixed_delta_seconds: settings.fixed_delta_seconds,
            no_rendering_mode: settings.no_rendering_mode,
        }
    }

    fn apply(&self, world: &mut World, settings: WorldSettings) -> Result<()> {
        let mut native = world.settings();
        native.synchronous_mode = settings.synchronous_mode;
        native.fixed_delta_seconds = settings.fixed_delta_seconds;
        native.no_rendering_mode = settings.no_rendering_mode;
        world.apply_settings(&native, self.timeout);

        let applied = Self::current_settings(world);
        if applied.synchronous_mode != settings.synchronous_mode {
            return Err(ActorFactoryError::SettingsFailed {
                message: "server did not accept synchronous mode".into(),
            });
        }
        Ok(())
    }

    fn to_carla_transform(transform: Transform) -> CarlaTransform {
        CarlaTransform {
            location: Location {
                x: transform.location.x as f32,
                y: transform.location.y as f32,
                z: transform.location.z as f32,
            },
            rotation: Rotation {
                pitch: transform.rotation.pitch as f32,
                yaw: transform.rotation.yaw as f32,
                roll: transform.rotation.roll as f32,
            },
        }
    }

    fn from_carla_transform(transform: &CarlaTransform) -> Transform {
        let mut out = Transform::from_location(
            transform.location.x as f64,
            transform.location.y as f64,
            transform.location.z as f64,
        );
        out.rotation.pitch = transform.rotation.pitch as f64;
        out.rotation.yaw = transform.rotation.yaw as f64;
        out.rotation.roll = transform.rotation.roll as f64;
        out
    }

    fn create_vehicle(world: &mut World, blueprint: &str, transform: Transform) -> Result<Vehicle> {
        let vehicle_bp = world
            .blueprint_library()
            .find(blueprint)
            .ok_or_else(|| {
                ActorFactoryError::vehicle_spawn(blueprint, format!("blueprint '{blueprint}' not found"))
            })?;

        let actor = world
            .spawn_actor(&vehicle_bp, &Self::to_carla_transform(transform))
            .map_err(|e| ActorFactoryError::vehicle_spawn(blueprint, e.to_string()))?;

        Vehicle::try_from(actor)
            .map_err(|_| ActorFactoryError::vehicle_spawn(blueprint, "spawned actor is not a vehicle"))
    }

    fn create_sensor(
        world: &mut World,
        blueprint: &str,
        transform: Transform,
        parent: &Vehicle,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<Sensor> {
        let owner = format!("actor_{parent_id}");
        let mut sensor_bp = world
            .blueprint_library()
            .find(blueprint)
            .ok_or_else(|| {
                ActorFactoryError::sensor_spawn(blueprint, &owner, format!("blueprint '{blueprint}' not found"))
            })?;

        for (key, value) in attributes {
            if !sensor_bp.set_attribute(key, value) {
                warn!(key, value, "failed to set sensor attribute");
            }
        }

        let actor = world
            .spawn_actor_attached(&sensor_bp, &Self::to_carla_transform(transform), parent, None)
            .map_err(|e| ActorFactoryError::sensor_spawn(blueprint, &owner, e.to_string()))?;

        Sensor::try_from(actor)
            .map_err(|_| ActorFactoryError::sensor_spawn(blueprint, &owner, "spawned actor is not a sensor"))
    }

    fn parent_vehicle(&self, sensor_blueprint: &str, parent_id: ActorId) -> Result<Vehicle> {
        match lock(&self.actors).get(&parent_id) {
            Some(ActorType::Vehicle(v)) => Ok(v.clone()),
            _ => Err(ActorFactoryError::sensor_spawn(
                sensor_blueprint,
                format!("actor_{parent_id}"),
                "parent vehicle not found",
            )),
        }
    }
}

impl SimulatorClient for RealCarlaClient {
    #[instrument(name = "real_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let mut client = Client::connect(host, port, None);
        client.set_timeout(self.timeout);
        let world = client.world();

        info!(map = %world.map().name(), "connected to CARLA server");

        *lock(&self.client) = Some(client);
        *lock(&self.world) = Some(world);
        Ok(())
    }

    #[instrument(name = "real_carla_configure_world", skip(self))]
    async fn configure_world(&self, settings: WorldSettings) -> Result<WorldSettings> {
        self.with_world_mut(|world| {
            let previous = Self::current_settings(world);
            self.apply(world, settings)?;
            lock(&self.saved_settings).get_or_insert(previous);
            info!(
                synchronous = settings.synchronous_mode,
                fixed_delta = ?settings.fixed_delta_seconds,
                "world settings applied"
            );
            Ok(previous)
        })
    }

    async fn tick(&self) -> Result<u64> {
        self.with_world_mut(|world| Ok(world.tick()))
    }

    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.with_world_mut(|world| {
            let points = world.map().recommended_spawn_points();
            Ok((0..points.len())
                .filter_map(|i| points.get(i))
                .map(|t| Self::from_carla_transform(&t))
                .collect())
        })
    }

    #[instrument(name = "real_carla_spawn_vehicle", skip(self, transform), fields(blueprint = %blueprint))]
    async fn spawn_vehicle(&self, blueprint: &str, transform: Transform) -> Result<ActorId> {
        let vehicle = self.with_world_mut(|world| Self::create_vehicle(world, blueprint, transform))?;
        let actor_id = vehicle.id();

        vehicle.set_autopilot(true);
        debug!(actor_id, blueprint, "vehicle spawned with autopilot");
        lock(&self.actors).insert(actor_id, ActorType::Vehicle(vehicle));

        Ok(actor_id)
    }

    #[instrument(
        name = "real_carla_spawn_sensor",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let parent = self.parent_vehicle(blueprint, parent_id)?;
        let sensor = self.with_world_mut(|world| {
            Self::create_sensor(world, blueprint, transform, &parent, parent_id, attributes)
        })?;
        let actor_id = sensor.id();

        debug!(actor_id, blueprint, parent_id, "sensor spawned and attached");
        lock(&self.actors).insert(actor_id, ActorType::Sensor(sensor));

        Ok(actor_id)
    }

    async fn actor_transform(&self, actor_id: ActorId) -> Result<Transform> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Vehicle(v)) => Ok(Self::from_carla_transform(&v.transform())),
            Some(ActorType::Sensor(s)) => Ok(Self::from_carla_transform(&s.transform())),
            None => Err(ActorFactoryError::ActorNotFound { actor_id }),
        }
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let removed = lock(&self.actors).remove(&actor_id);
        match removed {
            Some(ActorType::Vehicle(vehicle)) => {
                if !vehicle.destroy() {
                    warn!(actor_id, "destroy vehicle returned false");
                }
            }
            Some(ActorType::Sensor(sensor)) => {
                if sensor.is_listening() {
                    sensor.stop();
                }
                if !sensor.destroy() {
                    warn!(actor_id, "destroy sensor returned false");
                }
            }
            None => {}
        }
        Ok(())
    }

    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(lock(&self.actors).contains_key(&actor_id))
    }

    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Sensor(sensor)) => Some(Box::new(CarlaSensorSource::new(
                sensor_id,
                sensor_type,
                sensor.clone(),
            ))),
            _ => None,
        }
    }

    #[instrument(name = "real_carla_teardown", skip(self))]
    async fn teardown(&self) -> Result<()> {
        let Some(previous) = lock(&self.saved_settings).take() else {
            return Ok(());
        };
        self.with_world_mut(|world| self.apply(world, previous))
            .inspect(|_| info!("original world settings restored"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires CARLA server"]
    async fn test_real_client_connect_and_restore() {
        let mut client = RealCarlaClient::new(Duration::from_secs(10));
        client.connect("localhost", 2000).await.unwrap();
        let previous = client
            .configure_world(WorldSettings::synchronous())
            .await
            .unwrap();
        client.tick().await.unwrap();
        client.teardown().await.unwrap();
        let mut guard = client.world.lock().unwrap();
        let restored = RealCarlaClient::current_settings(guard.as_mut().unwrap());
        assert_eq!(restored.synchronous_mode, previous.synchronous_mode);
    }
}
