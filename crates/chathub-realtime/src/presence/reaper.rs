//! Periodic sweep that turns dead or silent registry entries into
//! liveness-lost events.
//!
//! The heartbeat catches most lost connections on its own. The reaper
//! covers handles whose heartbeat already stopped and pushes that failed
//! outside the heartbeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::connection::events::ConnectionEvent;

use super::registry::PresenceRegistry;

/// Emits [`ConnectionEvent::LivenessLost`] for every registered connection
/// that is dead or has been silent longer than `timeout`.
///
/// Returns the number of connections reported.
pub async fn sweep(
    registry: &PresenceRegistry,
    events: &mpsc::Sender<ConnectionEvent>,
    timeout: Duration,
) -> usize {
    let mut reported = 0;

    for handle in registry.handles() {
        let silent = handle.idle_for().await > timeout;
        if handle.is_alive() && !silent {
            continue;
        }

        debug!(
            conn_id = %handle.id,
            user_id = %handle.user_id,
            silent,
            "Reaping stale connection"
        );
        handle.mark_dead();
        if events
            .send(ConnectionEvent::liveness_lost(&handle))
            .await
            .is_err()
        {
            break;
        }
        reported += 1;
    }

    reported
}

/// Runs [`sweep`] every `interval` until shutdown.
pub async fn run_reaper(
    registry: Arc<PresenceRegistry>,
    events: mpsc::Sender<ConnectionEvent>,
    interval: Duration,
    timeout: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reaped = sweep(&registry, &events, timeout).await;
                if reaped > 0 {
                    info!(reaped, "Presence reaper swept stale connections");
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    debug!("Presence reaper stopped");
}
