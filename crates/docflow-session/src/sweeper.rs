//! Background worker evicting expired sessions

use crate::emitter::SessionEventEmitter;
use crate::store::SessionStore;
use crate::SessionConfig;
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Background worker that sweeps terminal sessions past their TTL
///
/// Besides removing the session itself, a sweep tears down the session's
/// event channels so late subscribers cannot attach to a dead run.
pub struct SessionSweeper {
    store: Arc<SessionStore>,
    emitter: Arc<SessionEventEmitter>,
    interval: Duration,
    swept_total: usize,
}

impl SessionSweeper {
    /// Create a sweeper over the given store and emitter
    pub fn new(
        store: Arc<SessionStore>,
        emitter: Arc<SessionEventEmitter>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            emitter,
            interval: config.sweep_interval(),
            swept_total: 0,
        }
    }

    /// Run the sweeper indefinitely
    ///
    /// Sweeps at the configured interval until a shutdown signal (Ctrl+C)
    /// is received.
    pub async fn run(&mut self) {
        let mut ticker = interval(self.interval);

        tracing::info!("Session sweeper started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping sweeper");
                    break;
                }
            }
        }

        tracing::info!("Sweeper stopped after {} eviction(s)", self.swept_total);
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles(&mut self, cycles: usize) {
        let mut ticker = interval(self.interval);

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Sweep cycle {}/{}", cycle + 1, cycles);
            self.sweep_once();
        }
    }

    /// Total sessions evicted over this sweeper's lifetime
    pub fn swept_total(&self) -> usize {
        self.swept_total
    }

    fn sweep_once(&mut self) {
        let swept = self.store.sweep_expired();
        for id in &swept {
            self.emitter.remove_session(*id);
        }
        self.swept_total += swept.len();
    }
}
