use playstate_bridge_engine::{PlayStateUpdate, StopHandle};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlaying {
    pub running: bool,
    pub current: PlayStateUpdate,
}

/// Frame-driven reader of poller updates.
pub struct UpdateConsumer {
    updates: mpsc::Receiver<PlayStateUpdate>,
    stop: Option<StopHandle>,
    state: NowPlaying,
}

impl UpdateConsumer {
    pub fn new(updates: mpsc::Receiver<PlayStateUpdate>, stop: StopHandle) -> Self {
        Self {
            updates,
            stop: Some(stop),
            state: NowPlaying {
                running: true,
                current: PlayStateUpdate::default(),
            },
        }
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.state
    }

    /// Takes at most one queued update without waiting. Returns whether the
    /// observable state changed.
    pub fn process_frame(&mut self) -> bool {
        match self.updates.try_recv() {
            Ok(update) => {
                let changed = self.state.current != update;
                self.state.current = update;
                changed
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                if self.state.running {
                    debug!("poller update channel closed");
                    self.state.running = false;
                    return true;
                }
                false
            }
        }
    }

    /// Sends the stop signal once and forgets the handle.
    pub fn stop_polling(&mut self) -> bool {
        self.state.running = false;
        match self.stop.take() {
            Some(mut handle) => handle.stop(),
            None => false,
        }
    }
}
