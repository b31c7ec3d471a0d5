use url::Url;

/// Authorization-code request URL. Deterministic for a given input.
pub fn authorize_url(
    authorize_endpoint: &str,
    client_id: &str,
    redirect_url: &str,
    scopes: &[String],
    state: &str,
) -> Result<Url, url::ParseError> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        authorize_endpoint,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_url),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
}

/// Joins an API base (with or without trailing slash) and an absolute path.
pub fn api_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::{api_url, authorize_url};

    #[test]
    fn authorize_url_encodes_redirect_and_scopes() {
        let scopes = vec![
            "user-read-private".to_string(),
            "user-read-playback-state".to_string(),
        ];
        let url = authorize_url(
            "https://accounts.spotify.com/authorize",
            "client-1",
            "http://localhost:8188",
            &scopes,
            "abc123",
        )
        .expect("valid url");

        let s = url.as_str();
        assert!(s.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(s.contains("client_id=client-1"));
        assert!(s.contains("response_type=code"));
        assert!(s.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8188"));
        assert!(s.contains("scope=user-read-private+user-read-playback-state"));
        assert!(s.contains("state=abc123"));
    }

    #[test]
    fn api_url_tolerates_slashes() {
        assert_eq!(
            api_url("https://api.spotify.com/", "/v1/me/player"),
            "https://api.spotify.com/v1/me/player"
        );
        assert_eq!(
            api_url("http://127.0.0.1:9000", "v1/me/player"),
            "http://127.0.0.1:9000/v1/me/player"
        );
    }
}
