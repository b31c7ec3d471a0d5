use anyhow::Result;
use async_trait::async_trait;
use playstate_bridge_core::PlaybackSnapshot;

pub mod spotify;

pub use spotify::SpotifyClient;

/// Authenticated handle able to read the current playback state.
///
/// Owned by exactly one poller; implementors are free to keep mutable
/// per-connection state.
#[async_trait]
pub trait PlayerStateSource: Send {
    fn name(&self) -> &'static str;
    async fn player_state(&mut self) -> Result<PlaybackSnapshot>;
}
