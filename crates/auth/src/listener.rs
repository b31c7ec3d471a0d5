use crate::authenticator::{AuthSession, Authenticator};
use crate::error::AuthError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use playstate_bridge_core::AccessToken;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SUCCESS_PAGE: &str = r#"<!doctype html>
<html>
<head><title>playstate-bridge</title></head>
<body><h1>Authorization complete</h1><p>You can close this window.</p></body>
</html>
"#;

/// Lifecycle of the callback endpoint. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Listening,
    Delivered,
    ShutDown,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type ClientFactory<C> = Box<dyn Fn(AccessToken) -> C + Send + Sync>;

struct Shared<C> {
    authenticator: Authenticator,
    session: AuthSession,
    make_client: ClientFactory<C>,
    state: Arc<Mutex<ListenerState>>,
    handoff: Mutex<Option<oneshot::Sender<C>>>,
}

impl<C> Shared<C> {
    fn current_state(&self) -> ListenerState {
        *lock(&self.state)
    }

    async fn exchange(&self, params: CallbackParams) -> Result<AccessToken, AuthError> {
        if let Some(reason) = params.error {
            return Err(AuthError::Denied(reason));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;
        let received_state = params.state.unwrap_or_default();
        self.authenticator
            .exchange_code(&self.session, &received_state, &code)
            .await
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Local endpoint that turns exactly one authorization redirect into a
/// client capability.
///
/// The capability is delivered on the receiver returned by [`bind`]; the
/// owner calls [`shutdown`] once it has it. Dropping the listener also stops
/// the server.
///
/// [`bind`]: CallbackListener::bind
/// [`shutdown`]: CallbackListener::shutdown
pub struct CallbackListener {
    local_addr: SocketAddr,
    state: Arc<Mutex<ListenerState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CallbackListener {
    pub async fn bind<C, F>(
        addr: &str,
        authenticator: Authenticator,
        session: AuthSession,
        make_client: F,
    ) -> Result<(Self, oneshot::Receiver<C>), AuthError>
    where
        C: Send + 'static,
        F: Fn(AccessToken) -> C + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(addr).await.map_err(|err| AuthError::Bind {
            addr: addr.to_string(),
            reason: err.to_string(),
        })?;
        let local_addr = listener.local_addr().map_err(|err| AuthError::Bind {
            addr: addr.to_string(),
            reason: err.to_string(),
        })?;

        let (handoff_tx, handoff_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = Arc::new(Mutex::new(ListenerState::Listening));

        let shared = Arc::new(Shared {
            authenticator,
            session,
            make_client: Box::new(make_client),
            state: state.clone(),
            handoff: Mutex::new(Some(handoff_tx)),
        });
        let router = Router::new()
            .route("/", get(handle_callback::<C>))
            .with_state(shared);

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(err) = served {
                warn!(error = %err, "callback listener stopped with error");
            }
            debug!("callback listener task finished");
        });

        info!(addr = %local_addr, "callback listener up");

        Ok((
            Self {
                local_addr,
                state,
                shutdown_tx: Some(shutdown_tx),
                task: Some(task),
            },
            handoff_rx,
        ))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ListenerState {
        *lock(&self.state)
    }

    /// Graceful shutdown; in-flight requests complete. Safe to call again.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "callback listener task panicked");
            }
            info!(addr = %self.local_addr, "callback listener shut down");
        }
        *lock(&self.state) = ListenerState::ShutDown;
    }
}

async fn handle_callback<C: Send + 'static>(
    State(shared): State<Arc<Shared<C>>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    debug!("authorization callback received");

    if shared.current_state() != ListenerState::Listening {
        return (StatusCode::GONE, "authorization already completed").into_response();
    }

    let token = match shared.exchange(params).await {
        Ok(token) => token,
        Err(err) => {
            warn!(error = %err, "authorization callback rejected");
            return (StatusCode::NOT_FOUND, format!("Couldn't get token: {err}")).into_response();
        }
    };

    let Some(tx) = lock(&shared.handoff).take() else {
        return (StatusCode::GONE, "authorization already completed").into_response();
    };

    let client = (shared.make_client)(token);
    if tx.send(client).is_err() {
        warn!("client capability receiver dropped before handoff");
    }
    *lock(&shared.state) = ListenerState::Delivered;
    info!("client capability delivered");

    (StatusCode::OK, Html(SUCCESS_PAGE)).into_response()
}
