pub mod config;
pub mod model;
pub mod urls;

pub use config::{AppConfig, CallbackConfig, ClientCredentials, ConfigError, EndpointsConfig};
pub use model::{AccessToken, AlbumInfo, PlaybackSnapshot, TrackItem};
