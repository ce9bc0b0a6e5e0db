//! Tick loop
//!
//! Drives a shared registry from a tokio interval, for hosts that have no
//! scheduler of their own to call [`MeshRegistry::tick`] from.
//!
//! [`MeshRegistry::tick`]: super::MeshRegistry::tick

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::registry::SharedMeshRegistry;

/// How often (in ticks) the loop logs a milestone
pub const MILESTONE_TICKS: u64 = 1000;

/// Tick `registry` every `tick_interval` until a shutdown signal arrives.
///
/// Returns the number of ticks run.
pub async fn run_tick_loop(
    registry: SharedMeshRegistry,
    tick_interval: Duration,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> u64 {
    info!(
        tick_rate_ms = tick_interval.as_millis() as u64,
        "Starting mesh tick loop"
    );

    let started = Instant::now();
    let mut ticks = 0u64;
    let mut timer = interval(tick_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let report = registry.tick();
                ticks += 1;

                if report.tick % MILESTONE_TICKS == 0 {
                    debug!(
                        tick = report.tick,
                        meshes = report.meshes,
                        "Mesh tick milestone"
                    );
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!(
        total_ticks = ticks,
        uptime_secs = started.elapsed().as_secs(),
        "Mesh tick loop stopped"
    );
    ticks
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::config::MeshSettings;
    use crate::math::Transform;
    use crate::mesh::MeshRegistry;
    use crate::protocol::{ClientId, ItemAppearance, RecordingChannel};

    #[tokio::test]
    async fn test_tick_loop_runs_until_shutdown() {
        let channel = Arc::new(RecordingChannel::new());
        let registry =
            SharedMeshRegistry::new(MeshRegistry::new(channel.clone(), MeshSettings::default()));
        let client = ClientId::random();
        registry.lock().create(
            ItemAppearance::new("minecraft:stick"),
            Transform::IDENTITY,
            move |_| HashSet::from([client]),
            true,
        );

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let loop_registry = registry.clone();
        let handle = tokio::spawn(async move {
            run_tick_loop(loop_registry, Duration::from_millis(5), &mut shutdown_rx).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = shutdown_tx.send(());
        let ticks = handle.await.expect("tick loop task");

        assert!(ticks > 0);
        assert_eq!(registry.lock().ticks(), ticks);
        // Spawned once, however many ticks ran
        assert_eq!(channel.deliveries_to(client).len(), 1);
    }
}
