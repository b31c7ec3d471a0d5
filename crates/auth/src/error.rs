use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("state mismatch in authorization callback")]
    StateMismatch,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("authorization callback carried no code")]
    MissingCode,
    #[error("token exchange failed with status {status}: {body}")]
    Exchange { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid authorize endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("failed to bind callback listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidEndpoint(error.to_string())
    }
}
