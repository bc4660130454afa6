use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::BotBackend;
use crate::session::ConnectionState;

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic health check. The first check runs immediately; results are sent
/// on the channel. The task is aborted when the monitor is dropped.
pub struct HealthMonitor {
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn spawn(
        backend: Arc<dyn BotBackend>,
        interval: Duration,
        tx: mpsc::UnboundedSender<ConnectionState>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = backend.health().await;
                if let Err(err) = &result {
                    warn!("health check failed: {}", err);
                }
                let state = ConnectionState::from_health(&result);
                debug!("health check -> {}", state.label());
                if tx.send(state).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
