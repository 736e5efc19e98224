use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::spotify_rs::types::{OAuthSession, SpotifyAuthResponse, SpotifyTokenResponse};

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Scopes needed to read and rewrite the user's playlists
pub const SPOTIFY_SCOPES: [&str; 4] = [
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// Generate a cryptographically secure random string for PKCE
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// PKCE code verifier (43-128 characters)
fn generate_code_verifier() -> String {
    generate_random_string(128)
}

/// PKCE code challenge from verifier using S256 method
fn generate_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Build the authorize url the user has to open, together with the session
/// whose verifier completes the code exchange.
pub fn initiate_oauth(client_id: &str, redirect_uri: &str) -> (SpotifyAuthResponse, OAuthSession) {
    let code_verifier = generate_code_verifier();
    let state = generate_random_string(16);

    let auth_url = format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&state={}&scope={}&code_challenge_method=S256&code_challenge={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&state),
        urlencoding::encode(&SPOTIFY_SCOPES.join(" ")),
        generate_code_challenge(&code_verifier)
    );

    let session = OAuthSession {
        code_verifier,
        created_at: chrono::Utc::now().timestamp(),
    };

    (SpotifyAuthResponse { auth_url, state }, session)
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Spotify rejected the token request: {reason}")]
    Rejected { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Client credentials for the token endpoint
#[derive(Debug, Clone)]
pub struct SpotifyApiCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SpotifyApiCredentials {
    fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret))
        )
    }
}

async fn request_token(
    credentials: &SpotifyApiCredentials,
    params: &[(&str, &str)],
) -> Result<SpotifyTokenResponse, TokenError> {
    let response = reqwest::Client::new()
        .post(SPOTIFY_TOKEN_URL)
        // x-www-form-urlencoded, as the token endpoint requires
        .form(params)
        .header("Authorization", credentials.basic_auth_header())
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(TokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(TokenError::Rejected {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(TokenError::FailedToParseResponse)
}

/// Exchange authorization code for access and refresh tokens
/// https://developer.spotify.com/documentation/web-api/tutorials/code-pkce-flow
pub async fn exchange_code_for_token(
    credentials: &SpotifyApiCredentials,
    code: &str,
    // Must equal the redirect uri the authorize url was built with
    redirect_uri: &str,
    session: &OAuthSession,
) -> Result<SpotifyTokenResponse, TokenError> {
    request_token(
        credentials,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", &session.code_verifier),
        ],
    )
    .await
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    credentials: &SpotifyApiCredentials,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, TokenError> {
    request_token(
        credentials,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &credentials.client_id),
        ],
    )
    .await
}

/// Pull the `code` parameter out of whatever the user pasted: either the bare
/// code or the full redirect url. A mismatching `state` is rejected.
pub fn extract_auth_code(input: &str, expected_state: &str) -> Option<String> {
    let input = input.trim();
    let Ok(url) = url::Url::parse(input) else {
        return (!input.is_empty()).then(|| input.to_string());
    };

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    match state {
        Some(state) if state != expected_state => None,
        _ => code,
    }
}
