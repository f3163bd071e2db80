//! Background task that fires due auto-progressions.
//!
//! The driver polls [`TransitionEngine::fire_due`] every `driver_tick`. Since
//! items carry absolute `due_at` times the tick only bounds how late an item
//! can fire, never how early.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::engine::TransitionEngine;

/// Handle to a running progression driver.
#[derive(Debug)]
pub struct ProgressionDriver {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl ProgressionDriver {
    /// Spawn the polling loop on the current tokio runtime.
    pub fn spawn(engine: Arc<TransitionEngine>) -> Self {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        // `interval` panics on a zero period.
        let tick = engine.config().driver_tick.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(tick_ms = tick.as_millis() as u64, "progression driver started");

            loop {
                tokio::select! {
                    _ = signal.notified() => break,
                    _ = interval.tick() => {
                        let reports = engine.fire_due();
                        if !reports.is_empty() {
                            let stale = reports.iter().filter(|r| r.is_stale()).count();
                            tracing::debug!(
                                fired = reports.len() - stale,
                                stale,
                                "progression driver tick"
                            );
                        }
                    }
                }
            }

            tracing::info!("progression driver stopped");
        });

        Self { shutdown, handle }
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the loop and wait for it to exit. Items still queued stay queued.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "progression driver task failed");
        }
    }
}
