use playstate_bridge_core::PlaybackSnapshot;
use serde::{Deserialize, Serialize};

pub mod poller;

pub use poller::{Poller, PollerConfig, PollerHandle, StopHandle, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    TrackChanged,
    StateChanged,
    ProgressChanged,
    Nothing,
}

/// Record handed from the poller to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlayStateUpdate {
    pub is_playing: bool,
    pub album_name: String,
    pub track_name: String,
    pub artists_name: String,
    pub cover_url: String,
    pub progress_ms: u64,
    pub track_length_ms: u64,
}

impl From<&PlaybackSnapshot> for PlayStateUpdate {
    fn from(snapshot: &PlaybackSnapshot) -> Self {
        Self {
            is_playing: snapshot.is_playing,
            album_name: snapshot.album_name().to_string(),
            track_name: snapshot.track_name().to_string(),
            artists_name: snapshot.artists_name(),
            cover_url: snapshot.cover_url().to_string(),
            progress_ms: snapshot.progress_ms,
            track_length_ms: snapshot.track_length_ms(),
        }
    }
}

/// Last values the poller has seen. Only the poller task touches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerState {
    pub last_track_id: Option<String>,
    pub was_playing: bool,
    pub last_progress_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ChangeOutput {
    pub diff: DiffKind,
    pub update: Option<PlayStateUpdate>,
}

#[derive(Debug, Default)]
pub struct ChangeDetector {
    state: PollerState,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PollerState {
        &self.state
    }

    /// Compares against the retained state and commits the snapshot when it
    /// differs, whether or not the resulting update is later delivered.
    pub fn observe(&mut self, snapshot: &PlaybackSnapshot) -> ChangeOutput {
        let diff = self.compute_diff(snapshot);
        if diff == DiffKind::Nothing {
            return ChangeOutput { diff, update: None };
        }

        self.state = PollerState {
            last_track_id: snapshot.track_id().map(str::to_string),
            was_playing: snapshot.is_playing,
            last_progress_ms: snapshot.progress_ms,
        };

        ChangeOutput {
            diff,
            update: Some(PlayStateUpdate::from(snapshot)),
        }
    }

    fn compute_diff(&self, snapshot: &PlaybackSnapshot) -> DiffKind {
        if self.state.last_track_id.as_deref() != snapshot.track_id() {
            DiffKind::TrackChanged
        } else if self.state.was_playing != snapshot.is_playing {
            DiffKind::StateChanged
        } else if self.state.last_progress_ms != snapshot.progress_ms {
            DiffKind::ProgressChanged
        } else {
            DiffKind::Nothing
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ChangeDetector, DiffKind, PlayStateUpdate, PollerState};
    use playstate_bridge_core::{AlbumInfo, PlaybackSnapshot, TrackItem};
    use pretty_assertions::assert_eq;

    pub(crate) fn snapshot(id: &str, playing: bool, progress_ms: u64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            item: Some(TrackItem {
                id: id.to_string(),
                name: format!("Track {id}"),
                duration_ms: 180_000,
                album: AlbumInfo {
                    name: format!("Album {id}"),
                    images: vec![format!("https://img/{id}/640"), format!("https://img/{id}/64")],
                },
                artists: vec!["Artist One".to_string(), "Artist Two".to_string()],
            }),
            is_playing: playing,
            progress_ms,
        }
    }

    #[test]
    fn identical_snapshot_is_not_a_change() {
        let mut detector = ChangeDetector::new();
        let first = detector.observe(&snapshot("X", true, 1000));
        assert_eq!(first.diff, DiffKind::TrackChanged);
        assert!(first.update.is_some());

        let second = detector.observe(&snapshot("X", true, 1000));
        assert_eq!(second.diff, DiffKind::Nothing);
        assert!(second.update.is_none());
    }

    #[test]
    fn each_tracked_field_triggers_an_update() {
        let mut detector = ChangeDetector::new();
        let _ = detector.observe(&snapshot("X", true, 1000));

        let paused = detector.observe(&snapshot("X", false, 1000));
        assert_eq!(paused.diff, DiffKind::StateChanged);

        let seeked = detector.observe(&snapshot("X", false, 5000));
        assert_eq!(seeked.diff, DiffKind::ProgressChanged);

        let next = detector.observe(&snapshot("Y", true, 0));
        assert_eq!(next.diff, DiffKind::TrackChanged);
        assert_eq!(
            next.update,
            Some(PlayStateUpdate {
                is_playing: true,
                album_name: "Album Y".to_string(),
                track_name: "Track Y".to_string(),
                artists_name: "Artist One, Artist Two".to_string(),
                cover_url: "https://img/Y/640".to_string(),
                progress_ms: 0,
                track_length_ms: 180_000,
            })
        );
        assert_eq!(
            detector.state(),
            &PollerState {
                last_track_id: Some("Y".to_string()),
                was_playing: true,
                last_progress_ms: 0,
            }
        );
    }

    #[test]
    fn idle_from_fresh_state_is_not_a_change() {
        let mut detector = ChangeDetector::new();
        let out = detector.observe(&PlaybackSnapshot::idle());
        assert_eq!(out.diff, DiffKind::Nothing);
    }

    #[test]
    fn track_disappearing_yields_empty_update() {
        let mut detector = ChangeDetector::new();
        let _ = detector.observe(&snapshot("X", false, 1000));

        let out = detector.observe(&PlaybackSnapshot {
            item: None,
            is_playing: false,
            progress_ms: 1000,
        });
        assert_eq!(out.diff, DiffKind::TrackChanged);
        assert_eq!(
            out.update,
            Some(PlayStateUpdate {
                progress_ms: 1000,
                ..PlayStateUpdate::default()
            })
        );

        let idle = detector.observe(&PlaybackSnapshot::idle());
        assert_eq!(
            idle.update,
            Some(PlayStateUpdate::default()),
            "no-track snapshot must carry empty strings and zeros"
        );
    }
}
