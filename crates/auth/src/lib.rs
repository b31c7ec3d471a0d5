//! Spotify authorization-code flow: URL construction, code exchange and the
//! one-shot local callback listener.

pub mod authenticator;
pub mod error;
pub mod listener;

pub use authenticator::{AuthSession, Authenticator};
pub use error::AuthError;
pub use listener::{CallbackListener, ListenerState};
