//! ActorFactory core implementation
//!
//! Spawns the vehicle fleet and destroys actors.

use contracts::{ActorId, SensorType, Transform};
use tracing::{error, info, instrument, warn};

use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};
use crate::fleet::{Fleet, FleetSpec, SpawnedVehicle};

/// Actor Factory
///
/// Spawns vehicles with a camera and a GNSS each, and destroys them again.
/// Owns the simulator client; use [`ActorFactory::client`] for everything else.
pub struct ActorFactory<C: SimulatorClient> {
    client: C,
}

impl<C: SimulatorClient> ActorFactory<C> {
    /// Create new ActorFactory
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Underlying simulator client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Spawn the fleet described by `spec`
    ///
    /// Demand is clamped to the spawn points the map offers. A vehicle whose
    /// spawn fails is logged and left out; the remaining vehicles still spawn.
    ///
    /// # Errors
    /// Only when the spawn points cannot be queried at all.
    #[instrument(
        name = "actor_factory_spawn_fleet",
        skip(self, spec),
        fields(requested = spec.count, blueprint = %spec.vehicle_blueprint)
    )]
    pub async fn spawn_fleet(&self, spec: &FleetSpec) -> Result<Fleet> {
        let spawn_points = self.client.spawn_points().await?;
        let mut fleet = Fleet {
            requested: spec.count,
            available_spawn_points: spawn_points.len(),
            vehicles: Vec::with_capacity(spec.count.min(spawn_points.len())),
        };

        if fleet.was_clamped() {
            warn!(
                requested = spec.count,
                available = spawn_points.len(),
                "only {} spawn points available",
                spawn_points.len()
            );
        }

        info!(count = spec.count.min(spawn_points.len()), "spawning vehicles");

        for (index, spawn_point) in spawn_points.iter().take(spec.count).enumerate() {
            let vehicle_id = FleetSpec::vehicle_id(index);
            match self
                .spawn_vehicle_with_sensors(index, &vehicle_id, *spawn_point, spec)
                .await
            {
                Ok(vehicle) => {
                    let loc = spawn_point.location;
                    info!(
                        vehicle_id = %vehicle.id,
                        actor_id = vehicle.actor,
                        "vehicle {} spawned at ({:.1}, {:.1}, {:.1})",
                        index,
                        loc.x,
                        loc.y,
                        loc.z
                    );
                    fleet.vehicles.push(vehicle);
                }
                Err(e) => {
                    error!(vehicle_id = %vehicle_id, error = %e, "failed to spawn vehicle {}", index);
                }
            }
        }

        info!(
            spawned = fleet.vehicles.len(),
            requested = spec.count,
            "fleet spawn completed"
        );

        Ok(fleet)
    }

    /// Spawn one vehicle and its sensors
    ///
    /// If a sensor fails, the actors already created for this vehicle are
    /// destroyed before the error is returned.
    #[instrument(
        name = "actor_factory_spawn_vehicle_with_sensors",
        skip(self, spawn_point, spec),
        fields(vehicle_id = %vehicle_id)
    )]
    async fn spawn_vehicle_with_sensors(
        &self,
        index: usize,
        vehicle_id: &str,
        spawn_point: Transform,
        spec: &FleetSpec,
    ) -> Result<SpawnedVehicle> {
        let actor = self
            .client
            .spawn_vehicle(&spec.vehicle_blueprint, spawn_point)
            .await
            .map_err(|e| ActorFactoryError::vehicle_spawn(vehicle_id, e.to_string()))?;

        let camera = match self
            .spawn_sensor_actor(vehicle_id, actor, SensorType::Camera, spec)
            .await
        {
            Ok(camera) => camera,
            Err(e) => {
                warn!(vehicle_id, error = %e, "camera spawn failed, rolling back vehicle");
                self.destroy_actor_safe(actor, vehicle_id).await;
                return Err(e);
            }
        };

        let gnss = match self
            .spawn_sensor_actor(vehicle_id, actor, SensorType::Gnss, spec)
            .await
        {
            Ok(gnss) => gnss,
            Err(e) => {
                warn!(vehicle_id, error = %e, "gnss spawn failed, rolling back vehicle");
                self.destroy_actor_safe(camera, vehicle_id).await;
                self.destroy_actor_safe(actor, vehicle_id).await;
                return Err(e);
            }
        };

        Ok(SpawnedVehicle {
            id: vehicle_id.to_string(),
            index,
            actor,
            camera,
            gnss,
            spawn_point,
        })
    }

    async fn spawn_sensor_actor(
        &self,
        vehicle_id: &str,
        parent: ActorId,
        sensor_type: SensorType,
        spec: &FleetSpec,
    ) -> Result<ActorId> {
        let (transform, attributes) = match sensor_type {
            SensorType::Camera => (spec.camera.mount, spec.camera.attributes()),
            SensorType::Gnss => (spec.gnss_mount, Default::default()),
        };

        self.client
            .spawn_sensor(sensor_type.blueprint(), transform, parent, &attributes)
            .await
            .map_err(|e| {
                ActorFactoryError::sensor_spawn(sensor_type.blueprint(), vehicle_id, e.to_string())
            })
            .inspect(|&actor_id| {
                info!(actor_id, sensor_type = ?sensor_type, "sensor spawned and attached");
            })
    }

    /// Destroy a vehicle's sensors, then the vehicle itself
    ///
    /// Failures are logged and otherwise ignored; safe to call repeatedly.
    #[instrument(name = "actor_factory_destroy_vehicle", skip(self, vehicle), fields(vehicle_id = %vehicle.id))]
    pub async fn destroy_vehicle(&self, vehicle: &SpawnedVehicle) {
        self.destroy_actor_safe(vehicle.camera, &vehicle.id).await;
        self.destroy_actor_safe(vehicle.gnss, &vehicle.id).await;
        self.destroy_actor_safe(vehicle.actor, &vehicle.id).await;
    }

    /// Destroy actor, ignoring errors (logged only)
    async fn destroy_actor_safe(&self, actor_id: ActorId, owner: &str) {
        if let Err(e) = self.client.destroy_actor(actor_id).await {
            warn!(actor_id, owner, error = %e, "failed to destroy actor");
        }
    }
}
