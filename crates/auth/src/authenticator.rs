use crate::error::AuthError;
use playstate_bridge_core::{urls, AccessToken, AppConfig, ClientCredentials};
use tracing::{debug, info};
use url::Url;

const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_REDIRECT_URL: &str = "http://localhost:8188";

/// One authorization attempt: the URL to open and the state token that the
/// callback must echo back.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub authorization_url: Url,
    pub state: String,
}

/// Builds authorization URLs and exchanges callback codes for tokens.
///
/// ```no_run
/// use playstate_bridge_auth::Authenticator;
/// use playstate_bridge_core::ClientCredentials;
///
/// let creds = ClientCredentials::new("client-id", "client-secret")?;
/// let auth = Authenticator::new(creds);
/// let session = auth.new_session()?;
/// println!("open {}", session.authorization_url);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: reqwest::Client,
    credentials: ClientCredentials,
    redirect_url: String,
    authorize_url: String,
    token_url: String,
    scopes: Vec<String>,
}

impl Authenticator {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: AppConfig::scopes(),
        }
    }

    pub fn from_app_config(cfg: &AppConfig, credentials: ClientCredentials) -> Self {
        Self::new(credentials)
            .with_redirect_url(cfg.callback.redirect_url.clone())
            .with_authorize_url(cfg.endpoints.authorize_url.clone())
            .with_token_url(cfg.endpoints.token_url.clone())
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn auth_url(&self, state: &str) -> Result<Url, AuthError> {
        Ok(urls::authorize_url(
            &self.authorize_url,
            &self.credentials.client_id,
            &self.redirect_url,
            &self.scopes,
            state,
        )?)
    }

    /// Starts an attempt with a fresh random state token.
    pub fn new_session(&self) -> Result<AuthSession, AuthError> {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let authorization_url = self.auth_url(&state)?;
        debug!(url = %authorization_url, "created authorization session");
        Ok(AuthSession {
            authorization_url,
            state,
        })
    }

    /// Exchanges an authorization code. The received state is checked before
    /// any request is made; failures are final for this code.
    pub async fn exchange_code(
        &self,
        session: &AuthSession,
        received_state: &str,
        code: &str,
    ) -> Result<AccessToken, AuthError> {
        if received_state != session.state {
            return Err(AuthError::StateMismatch);
        }

        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: AccessToken = resp
            .json()
            .await
            .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
        info!(scope = ?token.scope, "authorization code exchanged");
        Ok(token)
    }
}
