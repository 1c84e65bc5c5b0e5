//! `run` command implementation.

use std::future::Future;

use actor_factory::{FleetSpec, MockConfig, MockSimulatorClient, SimulatorClient};
use agent_link::ProcessLauncher;
use anyhow::{Context, Result};
use bridge::{Bridge, RunStats};
use tracing::{info, warn};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    args.validate()?;

    if let Some(port) = args.metrics_port() {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }

    info!(
        host = %args.host,
        port = args.port,
        vehicles = args.vehicles,
        duration_secs = args.duration,
        agent = %args.agent_program,
        "Starting bridge"
    );

    let shutdown = setup_shutdown_signal();

    let stats = if args.mock {
        run_mock(args, shutdown).await?
    } else {
        run_default(args, shutdown).await?
    };

    info!(
        ticks = stats.ticks,
        frames = stats.frames_processed,
        messages = stats.messages_forwarded,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Bridge run completed"
    );
    stats.print_summary();

    info!("CARLA Bridge finished");
    Ok(())
}

#[cfg(feature = "real-carla")]
async fn run_default(args: &RunArgs, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
    use actor_factory::RealCarlaClient;
    use std::time::Duration;

    let client = RealCarlaClient::new(Duration::from_secs(args.client_timeout_secs));
    drive(client, args, shutdown).await
}

#[cfg(not(feature = "real-carla"))]
async fn run_default(args: &RunArgs, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
    warn!("Built without the `real-carla` feature, using the in-process simulator");
    run_mock(args, shutdown).await
}

async fn run_mock(args: &RunArgs, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
    info!("Running in MOCK mode (no CARLA server required)");
    let client = MockSimulatorClient::with_config(MockConfig {
        pace_ticks: true,
        ..Default::default()
    });
    drive(client, args, shutdown).await
}

/// Connect, spawn, launch agents and run until done or interrupted
async fn drive<C: SimulatorClient>(
    mut client: C,
    args: &RunArgs,
    shutdown: impl Future<Output = ()>,
) -> Result<RunStats> {
    bridge::connect(&mut client, &args.host, args.port)
        .await
        .with_context(|| format!("Failed to connect to CARLA at {}:{}", args.host, args.port))?;
    info!("Connected, world in synchronous mode");

    let detector = detection::load_pipeline(args.model.as_deref());
    let launcher = ProcessLauncher::new(args.agent_spec());
    let mut bridge = Bridge::new(client, launcher, detector);

    let fleet = FleetSpec {
        count: args.vehicles,
        vehicle_blueprint: args.vehicle_blueprint.clone(),
        ..Default::default()
    };
    let spawned = match bridge.spawn_fleet(&fleet).await {
        Ok(spawned) => spawned,
        Err(e) => {
            bridge.abort().await;
            return Err(e).context("Failed to spawn vehicles");
        }
    };
    if spawned == 0 {
        warn!("No vehicle could be spawned, the run will forward nothing");
    }

    if let Err(e) = bridge.start_agents().await {
        bridge.abort().await;
        return Err(e).context("Failed to start agents");
    }

    bridge
        .run(args.run_duration(), shutdown)
        .await
        .context("Bridge run failed")
}

/// Resolves on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
