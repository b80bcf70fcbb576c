use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::order::OrderStatus;
use crate::metrics::Metrics;
use crate::store::StoreState;

use super::player::{AlertPlayer, PlaybackError};
use super::watcher::{AlertIntent, PendingAlertWatcher};

// ============================================================================
// Alert Monitor - drives an AlertPlayer from store changes
// ============================================================================
//
// Read-only observer of the store. Blocked playback is logged and counted,
// never surfaced to anyone. The baseline is the pending count at `spawn`,
// so spawn after the first load to stay quiet about orders already waiting.
//
// ============================================================================

pub struct AlertMonitor {
    handle: JoinHandle<()>,
}

impl AlertMonitor {
    pub fn spawn(
        mut updates: watch::Receiver<StoreState>,
        player: Arc<dyn AlertPlayer>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        let baseline = updates.borrow_and_update().count(OrderStatus::Pending);
        tracing::info!(pending = baseline, "Pending alert monitor started");

        let handle = tokio::spawn(async move {
            let mut watcher = PendingAlertWatcher::with_baseline(baseline);

            while updates.changed().await.is_ok() {
                let pending = updates.borrow_and_update().count(OrderStatus::Pending);

                match watcher.observe(pending) {
                    AlertIntent::Start => match player.start_loop() {
                        Ok(()) => tracing::info!(pending, "Pending alert started"),
                        Err(PlaybackError::Blocked) => {
                            watcher.playback_blocked();
                            if let Some(metrics) = &metrics {
                                metrics.alert_blocked_total.inc();
                            }
                            tracing::warn!(pending, "Alert playback blocked, waiting for next new order");
                        }
                    },
                    AlertIntent::Stop => player.stop_and_rewind(),
                    AlertIntent::Hold => {}
                }
            }

            tracing::info!("Pending alert monitor stopped");
        });

        Self { handle }
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}
