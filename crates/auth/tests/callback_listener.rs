use playstate_bridge_auth::{AuthSession, Authenticator, CallbackListener, ListenerState};
use playstate_bridge_core::ClientCredentials;
use serde_json::json;
use std::time::Duration;
use tokio::sync::oneshot;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn token_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("code=bad-code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;
    server
}

async fn start(
    server: &MockServer,
) -> (CallbackListener, oneshot::Receiver<String>, AuthSession) {
    let auth = Authenticator::new(ClientCredentials::new("client-1", "secret-1").unwrap())
        .with_token_url(format!("{}/api/token", server.uri()));
    let session = auth.new_session().unwrap();
    let (listener, rx) = CallbackListener::bind("127.0.0.1:0", auth, session.clone(), |token| {
        token.access_token
    })
    .await
    .expect("bind listener");
    (listener, rx, session)
}

async fn hit(listener: &CallbackListener, query: &str) -> (u16, String) {
    let url = format!("http://{}/?{}", listener.local_addr(), query);
    let resp = reqwest::get(url).await.expect("request");
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap_or_default())
}

#[tokio::test]
async fn delivers_capability_on_valid_callback() {
    let server = token_server().await;
    let (mut listener, mut rx, session) = start(&server).await;
    assert_eq!(listener.state(), ListenerState::Listening);

    let (status, body) = hit(&listener, &format!("code=good-code&state={}", session.state)).await;
    assert_eq!(status, 200);
    assert!(body.contains("Authorization complete"));

    let client = rx.try_recv().expect("capability delivered");
    assert_eq!(client, "access-1");
    assert_eq!(listener.state(), ListenerState::Delivered);

    listener.shutdown().await;
    assert_eq!(listener.state(), ListenerState::ShutDown);
}

#[tokio::test]
async fn failed_exchange_keeps_endpoint_open_for_retry() {
    let server = token_server().await;
    let (mut listener, mut rx, session) = start(&server).await;

    let (status, body) = hit(&listener, "code=good-code&state=forged").await;
    assert_eq!(status, 404);
    assert!(body.contains("Couldn't get token"));

    let (status, _) = hit(&listener, &format!("code=bad-code&state={}", session.state)).await;
    assert_eq!(status, 404);

    let (status, _) = hit(&listener, "error=access_denied").await;
    assert_eq!(status, 404);

    assert!(rx.try_recv().is_err());
    assert_eq!(listener.state(), ListenerState::Listening);

    let (status, _) = hit(&listener, &format!("code=good-code&state={}", session.state)).await;
    assert_eq!(status, 200);
    assert_eq!(rx.try_recv().expect("delivered after retry"), "access-1");

    listener.shutdown().await;
}

#[tokio::test]
async fn second_callback_after_delivery_is_gone() {
    let server = token_server().await;
    let (mut listener, _rx, session) = start(&server).await;
    let query = format!("code=good-code&state={}", session.state);

    assert_eq!(hit(&listener, &query).await.0, 200);
    assert_eq!(hit(&listener, &query).await.0, 410);

    listener.shutdown().await;
}

#[tokio::test]
async fn shutdown_is_idempotent_and_closes_the_port() {
    let server = token_server().await;
    let (mut listener, _rx, _session) = start(&server).await;
    let addr = listener.local_addr();

    listener.shutdown().await;
    listener.shutdown().await;
    assert_eq!(listener.state(), ListenerState::ShutDown);

    let refused = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
        .get(format!("http://{addr}/?code=good-code&state=x"))
        .send()
        .await;
    assert!(refused.is_err());
}
