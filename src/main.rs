//! Alexandria Mesh demo host
//!
//! Stands in for a game server: a handful of simulated clients come and go,
//! two meshes orbit the origin, and every packet the registry would send is
//! logged instead of written to a socket.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use glam::{DQuat, DVec3};
use parking_lot::RwLock;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use alexandria_mesh::config::AlexandriaConfig;
use alexandria_mesh::mesh::{run_tick_loop, MeshId, MeshRegistry, SharedMeshRegistry};
use alexandria_mesh::protocol::TracingChannel;
use alexandria_mesh::{ClientId, ItemAppearance, NamedColor, Transform, VERSION};

/// Simulated clients online at once
const SIMULATED_CLIENTS: usize = 4;

/// Ticks between a simulated client leaving and a new one joining
const CLIENT_CHURN_TICKS: u64 = 100;

/// Orbit radius of the demo meshes, in blocks
const ORBIT_RADIUS: f64 = 3.0;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = AlexandriaConfig::load().await?;

    info!("Alexandria mesh demo v{}", VERSION);
    info!(
        "Configuration loaded from: {}",
        config.config_path.display()
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let clients: Arc<RwLock<Vec<ClientId>>> = Arc::new(RwLock::new(
        (0..SIMULATED_CLIENTS).map(|_| ClientId::random()).collect(),
    ));

    let registry = SharedMeshRegistry::new(MeshRegistry::new(
        Arc::new(TracingChannel::new().with_packet_logging(config.debug)),
        config.mesh.clone(),
    ));
    let meshes = create_demo_meshes(&registry, &clients);
    info!(count = meshes.len(), "Demo meshes created");

    // Visibility refresh
    let tick_registry = registry.clone();
    let tick_interval = config.tick_interval();
    let mut tick_shutdown_rx = shutdown_tx.subscribe();
    let tick_handle = tokio::spawn(async move {
        run_tick_loop(tick_registry, tick_interval, &mut tick_shutdown_rx).await
    });

    // Motion and client churn
    let sim_registry = registry.clone();
    let sim_clients = clients.clone();
    let mut sim_shutdown_rx = shutdown_tx.subscribe();
    let sim_handle = tokio::spawn(async move {
        simulate(
            sim_registry,
            sim_clients,
            meshes,
            tick_interval,
            &mut sim_shutdown_rx,
        )
        .await;
    });

    info!("Demo host running, press Ctrl+C to stop");
    wait_for_shutdown(shutdown_tx.clone()).await;

    info!("Shutting down...");
    let _ = sim_handle.await;
    match tick_handle.await {
        Ok(ticks) => info!(ticks, "Tick loop finished"),
        Err(e) => warn!("Tick loop task failed: {}", e),
    }

    let removed = registry.lock().clear(true);
    info!(removed, "All meshes removed. Goodbye!");
    Ok(())
}

/// Initialize the logging/tracing system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,alexandria_mesh=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();
}

/// One interpolated mesh everyone sees, one carrier-mounted mesh only the
/// first half of the clients see
fn create_demo_meshes(
    registry: &SharedMeshRegistry,
    clients: &Arc<RwLock<Vec<ClientId>>>,
) -> Vec<MeshId> {
    let mut registry = registry.lock();

    let everyone = clients.clone();
    let orb = registry.create(
        ItemAppearance::new("minecraft:heart_of_the_sea"),
        Transform::from_translation(DVec3::new(ORBIT_RADIUS, 65.0, 0.0)),
        move |_| everyone.read().iter().copied().collect::<HashSet<_>>(),
        true,
    );
    if let Some(mesh) = registry.get_mut(orb) {
        mesh.set_highlight(NamedColor::Aqua.into());
    }

    let half = clients.clone();
    let blade = registry.create(
        ItemAppearance::new("minecraft:diamond_sword").with_custom_model_data(1),
        Transform::from_translation(DVec3::new(-ORBIT_RADIUS, 65.0, 0.0)),
        move |_| {
            let clients = half.read();
            let visible: HashSet<ClientId> =
                clients.iter().take(clients.len() / 2).copied().collect();
            visible
        },
        false,
    );

    vec![orb, blade]
}

/// Move the meshes every tick and rotate one client out periodically
async fn simulate(
    registry: SharedMeshRegistry,
    clients: Arc<RwLock<Vec<ClientId>>>,
    meshes: Vec<MeshId>,
    tick_interval: Duration,
    shutdown_rx: &mut broadcast::Receiver<()>,
) {
    let mut timer = interval(tick_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick = 0u64;

    loop {
        tokio::select! {
            _ = timer.tick() => {
                tick += 1;

                {
                    let mut registry = registry.lock();
                    for (i, id) in meshes.iter().enumerate() {
                        let angle = tick as f64 * 0.05 + i as f64 * std::f64::consts::PI;
                        let transform = Transform::new(
                            DVec3::new(angle.cos() * ORBIT_RADIUS, 65.0, angle.sin() * ORBIT_RADIUS),
                            DQuat::from_rotation_y(-angle),
                        );
                        if let Some(mesh) = registry.get_mut(*id) {
                            mesh.set_transform(transform);
                        }
                    }
                }

                if tick % CLIENT_CHURN_TICKS == 0 {
                    let mut clients = clients.write();
                    let left = clients.remove(0);
                    let joined = ClientId::random();
                    clients.push(joined);
                    info!(left = %left, joined = %joined, "Simulated client churn");
                }
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    let _ = shutdown_tx.send(());
}
