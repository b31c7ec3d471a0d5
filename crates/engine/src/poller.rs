//! Background playback poller.
//!
//! The poller owns its client capability and its [`ChangeDetector`]; it talks
//! to the rest of the program only through three channels: a one-shot slot
//! through which the capability arrives, a capacity-1 update channel, and a
//! one-shot stop signal.

use crate::{ChangeDetector, PlayStateUpdate};
use playstate_bridge_core::{AppConfig, ConfigError};
use playstate_bridge_providers::PlayerStateSource;
use std::time::Duration;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl PollerConfig {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_app_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(cfg.poll_interval()?))
    }

    /// How long a changed update may wait for the consumer before it is dropped.
    pub fn delivery_timeout(&self) -> Duration {
        self.interval / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    NoCapability,
    QueryFailed,
    Unchanged,
    Delivered,
    Dropped,
}

/// Sends the stop signal at most once.
#[derive(Debug)]
pub struct StopHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl StopHandle {
    pub fn new(tx: oneshot::Sender<()>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Returns `false` if the signal was already sent. Never blocks, and is
    /// harmless if the loop has already exited.
    pub fn stop(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.tx.is_none()
    }
}

pub struct PollerHandle {
    pub stop: StopHandle,
    pub updates: mpsc::Receiver<PlayStateUpdate>,
    pub task: JoinHandle<()>,
}

pub struct Poller<S> {
    cfg: PollerConfig,
    source: Option<S>,
    capability: Option<oneshot::Receiver<S>>,
    detector: ChangeDetector,
    updates: mpsc::Sender<PlayStateUpdate>,
}

impl<S: PlayerStateSource + 'static> Poller<S> {
    pub fn new(
        cfg: PollerConfig,
        capability: oneshot::Receiver<S>,
    ) -> (Self, mpsc::Receiver<PlayStateUpdate>) {
        let (updates, rx) = mpsc::channel(1);
        let poller = Self {
            cfg,
            source: None,
            capability: Some(capability),
            detector: ChangeDetector::new(),
            updates,
        };
        (poller, rx)
    }

    /// Starts the ticking loop right away; ticks are no-ops until a
    /// capability arrives on `capability`.
    pub fn spawn(cfg: PollerConfig, capability: oneshot::Receiver<S>) -> PollerHandle {
        let (poller, updates) = Self::new(cfg, capability);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(poller.run(stop_rx));
        PollerHandle {
            stop: StopHandle::new(stop_tx),
            updates,
            task,
        }
    }

    async fn run(mut self, mut stop_rx: oneshot::Receiver<()>) {
        info!(interval_ms = self.cfg.interval.as_millis() as u64, "polling started");

        loop {
            tokio::select! {
                res = &mut stop_rx => {
                    log_stop(res.is_ok());
                    break;
                }
                _ = tokio::time::sleep(self.cfg.interval) => {}
            }

            tokio::select! {
                res = &mut stop_rx => {
                    log_stop(res.is_ok());
                    break;
                }
                outcome = self.tick() => {
                    trace!(?outcome, "poll tick");
                }
            }
        }
    }

    pub async fn tick(&mut self) -> TickOutcome {
        if self.source.is_none() {
            self.install_capability();
        }
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::NoCapability;
        };

        let snapshot = match source.player_state().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(provider = source.name(), error = %err, "error getting player state");
                return TickOutcome::QueryFailed;
            }
        };

        let out = self.detector.observe(&snapshot);
        let Some(update) = out.update else {
            trace!("nothing changed");
            return TickOutcome::Unchanged;
        };

        match self
            .updates
            .send_timeout(update, self.cfg.delivery_timeout())
            .await
        {
            Ok(()) => {
                debug!(diff = ?out.diff, "play state update queued");
                TickOutcome::Delivered
            }
            Err(SendTimeoutError::Timeout(_)) => {
                debug!(diff = ?out.diff, "sending play state update timed out; dropped");
                TickOutcome::Dropped
            }
            Err(SendTimeoutError::Closed(_)) => {
                warn!("play state consumer is gone; update dropped");
                TickOutcome::Dropped
            }
        }
    }

    fn install_capability(&mut self) {
        let Some(rx) = self.capability.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(source) => {
                info!(provider = source.name(), "client capability installed");
                self.source = Some(source);
                self.capability = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => {
                warn!("capability slot closed without a client; poller stays idle");
                self.capability = None;
            }
        }
    }
}

fn log_stop(signalled: bool) {
    if signalled {
        info!("polling stopped");
    } else {
        info!("stop handle dropped; polling stopped");
    }
}
