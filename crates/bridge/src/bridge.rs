//! Bridge orchestrator
//!
//! Drives the simulator one fixed step at a time and routes every vehicle's
//! detections to its agent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use actor_factory::{ActorFactory, FleetSpec, SimulatorClient};
use agent_link::{AgentChannel, AgentLauncher};
use contracts::{OutboundMessage, SensorType, WorldSettings};
use detection::DetectionPipeline;
use ingestion::{IngestionMetrics, VehicleContext};
use observability::{
    record_detections, record_frame_processed, record_message_forwarded, record_progress,
    record_tick,
};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::{self, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::record::VehicleRecord;
use crate::state::BridgeState;
use crate::stats::{fps, RunStats};

/// Ticks between two progress reports
pub const PROGRESS_INTERVAL: u64 = 20;

/// Connect and switch the world to synchronous fixed-step mode
///
/// # Returns
/// The settings that were active before; `teardown` restores them.
///
/// # Errors
/// An unreachable simulator is fatal.
#[instrument(name = "bridge_connect", skip(client))]
pub async fn connect<C: SimulatorClient>(
    client: &mut C,
    host: &str,
    port: u16,
) -> Result<WorldSettings> {
    client.connect(host, port).await?;
    let settings = WorldSettings::synchronous();
    let previous = client.configure_world(settings).await?;
    info!(
        fixed_delta_seconds = ?settings.fixed_delta_seconds,
        "world switched to synchronous mode"
    );
    Ok(previous)
}

/// Run inference off the async scheduler where the runtime allows it
///
/// `block_in_place` needs a multi-threaded runtime; elsewhere the closure runs
/// inline.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => task::block_in_place(f),
        _ => f(),
    }
}

/// Simulator-to-agents bridge
pub struct Bridge<C: SimulatorClient, L: AgentLauncher> {
    state: BridgeState,
    factory: ActorFactory<C>,
    launcher: L,
    detector: DetectionPipeline,
    metrics: Arc<IngestionMetrics>,
    vehicles: Vec<VehicleRecord<L::Agent>>,
}

impl<C: SimulatorClient, L: AgentLauncher> Bridge<C, L> {
    /// Bridge over an already connected and configured client
    pub fn new(client: C, launcher: L, detector: DetectionPipeline) -> Self {
        Self {
            state: BridgeState::Idle,
            factory: ActorFactory::new(client),
            launcher,
            detector,
            metrics: Arc::new(IngestionMetrics::new()),
            vehicles: Vec::new(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Vehicles in fleet order
    pub fn vehicles(&self) -> &[VehicleRecord<L::Agent>] {
        &self.vehicles
    }

    pub fn client(&self) -> &C {
        self.factory.client()
    }

    /// Ingestion counters shared by every vehicle
    pub fn ingestion_metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Spawn the fleet and start listening to every sensor
    ///
    /// # Errors
    /// Only when the simulator cannot be queried at all; single vehicle
    /// failures just shrink the fleet.
    #[instrument(name = "bridge_spawn_fleet", skip(self, spec), fields(requested = spec.count))]
    pub async fn spawn_fleet(&mut self, spec: &FleetSpec) -> Result<usize> {
        self.state.transition(BridgeState::FleetReady)?;

        let fleet = self.factory.spawn_fleet(spec).await?;
        for vehicle in fleet.vehicles {
            let context = VehicleContext::new(vehicle.id.as_str(), self.metrics.clone());
            let mut sources = Vec::with_capacity(2);

            for (actor, sensor_id, sensor_type) in [
                (vehicle.camera, vehicle.camera_sensor_id(), SensorType::Camera),
                (vehicle.gnss, vehicle.gnss_sensor_id(), SensorType::Gnss),
            ] {
                match self.client().get_sensor_source(actor, sensor_id.clone(), sensor_type) {
                    Some(source) => {
                        source.listen(context.callback());
                        sources.push(source);
                    }
                    None => {
                        warn!(vehicle_id = %vehicle.id, sensor_id = %sensor_id, actor_id = actor, "no data source for sensor");
                    }
                }
            }

            debug!(vehicle_id = %vehicle.id, listening = sources.len(), "vehicle registered");
            self.vehicles.push(VehicleRecord::new(vehicle, context, sources));
        }

        info!(vehicles = self.vehicles.len(), "fleet ready");
        Ok(self.vehicles.len())
    }

    /// Launch one agent per vehicle
    ///
    /// A vehicle whose agent fails to launch keeps running without one.
    ///
    /// # Returns
    /// Number of agents launched
    #[instrument(name = "bridge_start_agents", skip(self))]
    pub async fn start_agents(&mut self) -> Result<usize> {
        self.state.transition(BridgeState::AgentsRunning)?;

        let mut launched = 0;
        for record in &mut self.vehicles {
            match self.launcher.launch(&record.vehicle.id).await {
                Ok(agent) => {
                    info!(vehicle_id = %record.vehicle.id, "agent launched");
                    record.agent = Some(agent);
                    launched += 1;
                }
                Err(e) => {
                    warn!(vehicle_id = %record.vehicle.id, error = %e, "agent launch failed, vehicle runs without agent");
                }
            }
        }

        info!(launched, vehicles = self.vehicles.len(), "agents started");
        Ok(launched)
    }

    /// Tick until `duration` has elapsed or `shutdown` resolves, then clean up
    ///
    /// Cleanup runs exactly once on every path out of this method.
    ///
    /// # Errors
    /// Only when called before [`start_agents`](Self::start_agents); the
    /// bridge is still cleaned up.
    pub async fn run(
        mut self,
        duration: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Result<RunStats> {
        if let Err(e) = self.state.transition(BridgeState::Ticking) {
            self.cleanup().await;
            return Err(e);
        }

        info!(
            vehicles = self.vehicles.len(),
            duration_secs = duration.as_secs_f64(),
            "simulation loop started"
        );

        let started = Instant::now();
        let mut stats = RunStats::default();

        let interrupted = tokio::select! {
            _ = self.tick_loop(started, duration, &mut stats) => false,
            _ = shutdown => {
                info!("interrupt received, stopping simulation loop");
                true
            }
        };
        stats.interrupted = interrupted;
        stats.duration = started.elapsed();

        info!(
            ticks = stats.ticks,
            frames = stats.frames_processed,
            messages = stats.messages_forwarded,
            fps = format!("{:.2}", stats.fps()),
            "simulation loop finished"
        );

        self.cleanup().await;
        Ok(stats)
    }

    async fn tick_loop(&mut self, started: Instant, duration: Duration, stats: &mut RunStats) {
        while started.elapsed() < duration {
            self.step(stats).await;

            if stats.ticks % PROGRESS_INTERVAL == 0 {
                let elapsed = started.elapsed();
                let rate = fps(stats.frames_processed, elapsed);
                info!(
                    elapsed_secs = format!("{:.1}", elapsed.as_secs_f64()),
                    ticks = stats.ticks,
                    frames = stats.frames_processed,
                    fps = format!("{:.2}", rate),
                    "progress"
                );
                record_progress(elapsed.as_secs_f64(), stats.ticks, stats.frames_processed, rate);
            }
        }
    }

    /// One tick plus one frame per vehicle
    pub(crate) async fn step(&mut self, stats: &mut RunStats) {
        let step_started = Instant::now();
        stats.ticks += 1;

        let ok = match self.client().tick().await {
            Ok(frame) => {
                debug!(frame, "world ticked");
                true
            }
            Err(e) => {
                stats.tick_failures += 1;
                warn!(tick = stats.ticks, error = %e, "world tick failed");
                false
            }
        };

        self.process_vehicles(stats).await;

        let step_ms = step_started.elapsed().as_secs_f64() * 1000.0;
        stats.step_ms.push(step_ms);
        record_tick(step_ms, ok);
    }

    /// Take at most one frame per vehicle, score it and forward the results
    pub(crate) async fn process_vehicles(&mut self, stats: &mut RunStats) {
        let client = self.factory.client();

        for record in &mut self.vehicles {
            let vehicle_id = record.vehicle.id.as_str();

            if record.context.gnss().latest().is_none() {
                continue;
            }
            let Some(frame) = record.context.frames().try_pop() else {
                continue;
            };

            let heading = match client.actor_transform(record.vehicle.actor).await {
                Ok(transform) => transform.heading_deg(),
                Err(e) => {
                    warn!(vehicle_id, error = %e, "failed to read vehicle transform, frame skipped");
                    continue;
                }
            };

            let detector = &mut self.detector;
            let detections = run_blocking(|| detector.detect(&frame));
            record.frame_count += 1;
            stats.frames_processed += 1;
            record_frame_processed(vehicle_id);
            record_detections(detections.len());

            if detections.is_empty() {
                continue;
            }

            // positioning as of now, not as of capture
            let Some(gnss) = record.context.gnss().latest() else {
                continue;
            };
            let timestamp = chrono::Utc::now().timestamp_micros() as f64 / 1e6;

            for detection in &detections {
                let message = OutboundMessage::new(detection, gnss, heading, timestamp);
                let Some(agent) = record.agent.as_mut() else {
                    stats.forward_failures += 1;
                    record_message_forwarded(vehicle_id, false);
                    continue;
                };

                match agent.send(&message).await {
                    Ok(()) => {
                        stats.messages_forwarded += 1;
                        record_message_forwarded(vehicle_id, true);
                    }
                    Err(e) => {
                        stats.forward_failures += 1;
                        record_message_forwarded(vehicle_id, false);
                        warn!(vehicle_id, error = %e, "message dropped");
                    }
                }
            }
        }
    }

    /// Release every agent and simulator resource
    ///
    /// Stops all sensor listeners, shuts the agents down concurrently (each
    /// gets the launcher's grace period), destroys every vehicle and restores
    /// the world settings. Never fails; problems are logged.
    #[instrument(name = "bridge_cleanup", skip(self), fields(vehicles = self.vehicles.len()))]
    pub async fn cleanup(mut self) {
        if let Err(e) = self.state.transition(BridgeState::Cleanup) {
            debug!(error = %e, "cleanup state transition");
        }

        for record in &self.vehicles {
            record.stop_sensors();
        }

        let grace = self.launcher.grace_period();
        let mut shutdowns = JoinSet::new();
        for record in &mut self.vehicles {
            if let Some(mut agent) = record.agent.take() {
                shutdowns.spawn(async move {
                    agent.shutdown(grace).await;
                });
            }
        }
        let agents = shutdowns.len();
        while let Some(joined) = shutdowns.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "agent shutdown task failed");
            }
        }

        for record in &self.vehicles {
            self.factory.destroy_vehicle(&record.vehicle).await;
        }

        if let Err(e) = self.factory.client().teardown().await {
            warn!(error = %e, "failed to restore world settings");
        }

        info!(agents, vehicles = self.vehicles.len(), "cleanup complete");
    }

    /// Clean up a bridge that never reached [`run`](Self::run)
    pub async fn abort(self) {
        warn!(state = ?self.state, "aborting bridge");
        self.cleanup().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_factory::{MockConfig, MockSimulatorClient};
    use agent_link::MemoryLauncher;
    use contracts::{GnssData, RawDetection, RgbFrame};
    use detection::FixedDetector;

    use crate::error::BridgeError;

    fn detector(labels: &[&str]) -> DetectionPipeline {
        let raw = labels
            .iter()
            .map(|label| RawDetection::new([10.0, 20.0, 30.0, 40.0], 0.8, *label))
            .collect();
        DetectionPipeline::new(Some(Box::new(FixedDetector::new(raw))))
    }

    async fn client(config: MockConfig) -> MockSimulatorClient {
        let mut client = MockSimulatorClient::with_config(MockConfig {
            pace_ticks: true,
            ..config
        });
        connect(&mut client, "localhost", 2000).await.unwrap();
        client
    }

    async fn ready_bridge(
        config: MockConfig,
        launcher: MemoryLauncher,
        labels: &[&str],
        vehicles: usize,
    ) -> Bridge<MockSimulatorClient, MemoryLauncher> {
        let mut bridge = Bridge::new(client(config).await, launcher, detector(labels));
        bridge.spawn_fleet(&FleetSpec::new(vehicles)).await.unwrap();
        bridge.start_agents().await.unwrap();
        bridge
    }

    fn messages(launcher: &MemoryLauncher, vehicle_id: &str) -> Vec<serde_json::Value> {
        launcher
            .transcript(vehicle_id)
            .unwrap()
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_messages_without_gnss() {
        let launcher = MemoryLauncher::new();
        let config = MockConfig {
            emit_gnss: false,
            ..Default::default()
        };
        let bridge = ready_bridge(config, launcher.clone(), &["car"], 1).await;

        let stats = bridge
            .run(Duration::from_millis(250), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.frames_processed, 0);
        assert!(messages(&launcher, "carla_vehicle_0").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_allowed_classes_forwarded() {
        let launcher = MemoryLauncher::new();
        let bridge = ready_bridge(
            MockConfig::default(),
            launcher.clone(),
            &["car", "dog", "person"],
            1,
        )
        .await;

        let stats = bridge
            .run(Duration::from_millis(50), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 1);
        let classes: Vec<_> = messages(&launcher, "carla_vehicle_0")
            .iter()
            .map(|m| m["class_name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(classes, vec!["car", "person"]);
        assert_eq!(stats.messages_forwarded, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_inference_on_multi_thread_runtime() {
        let launcher = MemoryLauncher::new();
        let bridge = ready_bridge(MockConfig::default(), launcher.clone(), &["bus"], 2).await;

        let stats = bridge
            .run(Duration::from_millis(200), std::future::pending())
            .await
            .unwrap();

        assert!(stats.ticks > 0);
        assert!(stats.frames_processed > 0);
        assert_eq!(stats.messages_forwarded, stats.frames_processed);
        assert_eq!(stats.forward_failures, 0);
    }

    #[tokio::test]
    async fn test_gnss_read_at_forwarding_time() {
        let launcher = MemoryLauncher::new();
        let config = MockConfig {
            emit_gnss: false,
            ..Default::default()
        };
        let mut bridge = ready_bridge(config, launcher.clone(), &["car"], 1).await;

        let context = bridge.vehicles()[0].context.clone();
        context.frames().try_push(RgbFrame::filled(4, 4, [0, 0, 0]));
        context.gnss().store(GnssData {
            latitude: 1.0,
            longitude: 2.0,
            altitude: 3.0,
        });
        context.gnss().store(GnssData {
            latitude: 48.5,
            longitude: 11.25,
            altitude: 520.0,
        });

        let mut stats = RunStats::default();
        bridge.process_vehicles(&mut stats).await;

        let sent = messages(&launcher, "carla_vehicle_0");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["gps_lat"], 48.5);
        assert_eq!(sent[0]["gps_lon"], 11.25);
        assert_eq!(sent[0]["gps_alt"], 520.0);
        assert_eq!(bridge.vehicles()[0].frame_count, 1);

        bridge.abort().await;
    }

    #[tokio::test]
    async fn test_heading_from_live_transform() {
        let launcher = MemoryLauncher::new();
        let mut bridge = ready_bridge(MockConfig::default(), launcher.clone(), &["bus"], 1).await;

        let mut stats = RunStats::default();
        bridge.step(&mut stats).await;
        bridge.step(&mut stats).await;

        let sent = messages(&launcher, "carla_vehicle_0");
        assert_eq!(sent.len(), 2);
        // yaw advances one degree per tick
        assert_eq!(sent[0]["heading"], 1.0);
        assert_eq!(sent[1]["heading"], 2.0);
        assert!(sent[0]["timestamp"].as_f64().unwrap() > 1_600_000_000.0);

        bridge.abort().await;
    }

    #[tokio::test]
    async fn test_cleanup_with_empty_fleet() {
        let config = MockConfig {
            spawn_points: 0,
            ..Default::default()
        };
        let launcher = MemoryLauncher::new();
        let bridge = ready_bridge(config, launcher.clone(), &["car"], 3).await;
        assert!(bridge.vehicles().is_empty());

        let client = bridge.client().clone();
        let stats = bridge
            .run(Duration::ZERO, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 0);
        assert_eq!(launcher.launched(), 0);
        assert!(!client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_agent_launch_keeps_vehicle() {
        let launcher = MemoryLauncher::failing_for(&["carla_vehicle_0"]);
        let bridge = ready_bridge(MockConfig::default(), launcher.clone(), &["car"], 2).await;
        assert!(!bridge.vehicles()[0].has_agent());
        assert!(bridge.vehicles()[1].has_agent());

        let stats = bridge
            .run(Duration::from_millis(100), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.frames_processed, 4);
        assert_eq!(stats.forward_failures, 2);
        assert_eq!(stats.messages_forwarded, 2);
        assert!(launcher.transcript("carla_vehicle_0").is_none());
        assert_eq!(messages(&launcher, "carla_vehicle_1").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_triggers_cleanup() {
        let launcher = MemoryLauncher::new();
        let bridge = ready_bridge(MockConfig::default(), launcher.clone(), &["car"], 2).await;
        let client = bridge.client().clone();

        let stats = bridge
            .run(
                Duration::from_secs(60),
                tokio::time::sleep(Duration::from_millis(120)),
            )
            .await
            .unwrap();

        assert!(stats.interrupted);
        assert!(stats.ticks < 10);
        assert_eq!(client.actor_count(), 0);
        assert!(!client.is_connected());
        assert!(launcher.transcript("carla_vehicle_0").unwrap().is_shut_down());
        assert!(launcher.transcript("carla_vehicle_1").unwrap().is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_agent_does_not_stop_loop() {
        let launcher = MemoryLauncher::new();
        let bridge = ready_bridge(MockConfig::default(), launcher.clone(), &["truck"], 1).await;
        launcher.transcript("carla_vehicle_0").unwrap().break_pipe();

        let stats = bridge
            .run(Duration::from_millis(150), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.frames_processed, 3);
        assert_eq!(stats.forward_failures, 3);
    }

    #[tokio::test]
    async fn test_run_requires_agents_started() {
        let mut bridge = Bridge::new(
            client(MockConfig::default()).await,
            MemoryLauncher::new(),
            detector(&["car"]),
        );
        bridge.spawn_fleet(&FleetSpec::new(1)).await.unwrap();
        let client = bridge.client().clone();

        let err = bridge
            .run(Duration::from_secs(1), std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::InvalidTransition {
                from: BridgeState::FleetReady,
                to: BridgeState::Ticking,
            }
        ));
        // cleaned up anyway
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_spawn_fleet_twice_rejected() {
        let mut bridge = ready_bridge(MockConfig::default(), MemoryLauncher::new(), &[], 1).await;
        assert!(bridge.spawn_fleet(&FleetSpec::new(1)).await.is_err());
        assert_eq!(bridge.vehicles().len(), 1);
        assert_eq!(bridge.vehicles()[0].sensor_count(), 2);
        bridge.abort().await;
    }

    #[tokio::test]
    async fn test_connect_unreachable_is_fatal() {
        let mut client = MockSimulatorClient::with_config(MockConfig {
            unreachable: true,
            ..Default::default()
        });
        let err = connect(&mut client, "localhost", 2000).await.unwrap_err();
        assert!(matches!(err, BridgeError::Simulator(e) if e.is_fatal()));
    }
}
