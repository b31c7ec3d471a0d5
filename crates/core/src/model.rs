use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AlbumInfo {
    pub name: String,
    /// Image URLs in the order the service lists them.
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TrackItem {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    pub album: AlbumInfo,
    pub artists: Vec<String>,
}

/// Point-in-time read of remote playback status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlaybackSnapshot {
    pub item: Option<TrackItem>,
    pub is_playing: bool,
    pub progress_ms: u64,
}

impl PlaybackSnapshot {
    /// Nothing is loaded on any device.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn track_id(&self) -> Option<&str> {
        self.item.as_ref().map(|item| item.id.as_str())
    }

    pub fn track_name(&self) -> &str {
        self.item.as_ref().map(|item| item.name.as_str()).unwrap_or("")
    }

    pub fn album_name(&self) -> &str {
        self.item
            .as_ref()
            .map(|item| item.album.name.as_str())
            .unwrap_or("")
    }

    pub fn artists_name(&self) -> String {
        self.item
            .as_ref()
            .map(|item| item.artists.join(", "))
            .unwrap_or_default()
    }

    /// First listed album image; no size selection.
    pub fn cover_url(&self) -> &str {
        self.item
            .as_ref()
            .and_then(|item| item.album.images.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn track_length_ms(&self) -> u64 {
        self.item.as_ref().map(|item| item.duration_ms).unwrap_or(0)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}
