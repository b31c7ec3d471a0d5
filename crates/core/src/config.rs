use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const SCOPE_USER_READ_PRIVATE: &str = "user-read-private";
pub const SCOPE_USER_READ_PLAYBACK_STATE: &str = "user-read-playback-state";

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing spotify client id")]
    MissingClientId,
    #[error("missing spotify client secret")]
    MissingClientSecret,
    #[error("poll interval must be at least one second")]
    InvalidPollInterval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Address the one-shot callback listener binds to.
    pub listen_addr: String,
    /// Redirect registered with the Spotify application; must reach `listen_addr`.
    pub redirect_url: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            listen_addr: "localhost:8188".to_string(),
            redirect_url: "http://localhost:8188".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base_url: "https://api.spotify.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub client_id: String,
    pub client_secret: String,
    pub poll_interval_secs: u64,
    pub frame_ms: u64,
    pub log_level: String,
    #[serde(default)]
    pub callback: CallbackConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            client_id: String::new(),
            client_secret: String::new(),
            poll_interval_secs: 5,
            frame_ms: 100,
            log_level: "info".to_string(),
            callback: CallbackConfig::default(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn credentials(&self) -> Result<ClientCredentials, ConfigError> {
        ClientCredentials::new(&self.client_id, &self.client_secret)
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(Duration::from_secs(self.poll_interval_secs))
    }

    pub fn scopes() -> Vec<String> {
        vec![
            SCOPE_USER_READ_PRIVATE.to_string(),
            SCOPE_USER_READ_PLAYBACK_STATE.to_string(),
        ]
    }
}

/// Spotify application identity used for the authorization code flow.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, ConfigError> {
        let client_id = client_id.trim();
        let client_secret = client_secret.trim();
        if client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if client_secret.is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ClientCredentials, ConfigError};
    use std::time::Duration;

    #[test]
    fn missing_credentials_are_config_errors() {
        assert_eq!(
            ClientCredentials::new("", "secret"),
            Err(ConfigError::MissingClientId)
        );
        assert_eq!(
            ClientCredentials::new("id", "   "),
            Err(ConfigError::MissingClientSecret)
        );

        let creds = ClientCredentials::new(" id ", "secret").expect("valid credentials");
        assert_eq!(creds.client_id, "id");
        assert!(format!("{creds:?}").contains("<redacted>"));
    }

    #[test]
    fn defaults_match_spotify_local_flow() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.poll_interval().unwrap(), Duration::from_secs(5));
        assert_eq!(cfg.callback.redirect_url, "http://localhost:8188");
        assert_eq!(cfg.callback.listen_addr, "localhost:8188");
        assert_eq!(
            cfg.credentials().unwrap_err(),
            ConfigError::MissingClientId
        );
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let cfg = AppConfig {
            poll_interval_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(cfg.poll_interval(), Err(ConfigError::InvalidPollInterval));
    }
}
