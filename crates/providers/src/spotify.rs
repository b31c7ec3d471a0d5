use crate::PlayerStateSource;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use playstate_bridge_core::{urls, AccessToken, AlbumInfo, PlaybackSnapshot, TrackItem};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::trace;

const DEFAULT_API_BASE: &str = "https://api.spotify.com";
const PLAYER_PATH: &str = "/v1/me/player";

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    progress_ms: Option<u64>,
    #[serde(default)]
    item: Option<ItemResponse>,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    album: Option<AlbumResponse>,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
}

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    images: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    url: String,
}

impl From<PlayerResponse> for PlaybackSnapshot {
    fn from(resp: PlayerResponse) -> Self {
        let item = resp.item.map(|item| {
            let album = item
                .album
                .map(|a| AlbumInfo {
                    name: a.name,
                    images: a.images.into_iter().map(|i| i.url).collect(),
                })
                .unwrap_or_default();
            TrackItem {
                id: item.id.unwrap_or_default(),
                name: item.name,
                duration_ms: item.duration_ms,
                album,
                artists: item.artists.into_iter().map(|a| a.name).collect(),
            }
        });

        PlaybackSnapshot {
            item,
            is_playing: resp.is_playing,
            progress_ms: resp.progress_ms.unwrap_or(0),
        }
    }
}

/// Spotify Web API client bound to a single access token.
pub struct SpotifyClient {
    http: reqwest::Client,
    token: AccessToken,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(token: AccessToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl PlayerStateSource for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    async fn player_state(&mut self) -> Result<PlaybackSnapshot> {
        let resp = self
            .http
            .get(urls::api_url(&self.api_base, PLAYER_PATH))
            .bearer_auth(&self.token.access_token)
            .send()
            .await
            .context("failed to query spotify player state")?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            trace!("no active spotify device");
            return Ok(PlaybackSnapshot::idle());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("spotify player state request failed: {status}: {body}"));
        }

        let raw = resp
            .text()
            .await
            .context("failed to read spotify player state body")?;
        let payload: PlayerResponse =
            serde_json::from_str(&raw).context("failed to parse spotify player state")?;
        Ok(payload.into())
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerResponse;
    use playstate_bridge_core::PlaybackSnapshot;

    #[test]
    fn episode_without_album_maps_to_empty_album() {
        let raw = r#"{
            "is_playing": false,
            "progress_ms": 5000,
            "item": { "id": "ep1", "name": "Episode", "duration_ms": 60000, "type": "episode" }
        }"#;
        let resp: PlayerResponse = serde_json::from_str(raw).expect("parse");
        let snapshot: PlaybackSnapshot = resp.into();

        assert_eq!(snapshot.track_id(), Some("ep1"));
        assert_eq!(snapshot.album_name(), "");
        assert_eq!(snapshot.artists_name(), "");
        assert_eq!(snapshot.cover_url(), "");
        assert_eq!(snapshot.progress_ms, 5000);
    }

    #[test]
    fn null_progress_and_item_default_to_idle() {
        let raw = r#"{ "is_playing": false, "progress_ms": null, "item": null }"#;
        let resp: PlayerResponse = serde_json::from_str(raw).expect("parse");
        let snapshot: PlaybackSnapshot = resp.into();
        assert_eq!(snapshot, PlaybackSnapshot::idle());
    }
}
