//! Spotify OAuth 2.0 Flow
//!
//! Implements the authorization-code flow against Spotify's accounts
//! service:
//!
//! 1. [`SpotifyAuthFlow::authorization_url`] builds the consent URL
//! 2. [`SpotifyAuthFlow::exchange_code`] trades the callback code for tokens
//!    and resolves the user's profile
//! 3. [`SpotifyAuthFlow::refresh`] obtains a new access token from a refresh
//!    token, retrying transient server errors with exponential backoff
//!
//! Both token-endpoint calls authenticate with HTTP Basic auth over the
//! client id and secret, and send a form-encoded body.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{AuthError, Result};
use crate::types::{AuthorizedUser, TokenGrant};

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_PROFILE_URL: &str = "https://api.spotify.com/v1/me";

/// Scopes requested by default.
///
/// Read-only: profile, saved library, top items, and private playlists.
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-email",
    "user-read-private",
    "user-library-read",
    "user-top-read",
    "playlist-read-private",
];

/// Display name used when the profile carries neither a name nor an email.
const FALLBACK_DISPLAY_NAME: &str = "Spotify User";

/// Maximum attempts for a token refresh (initial try plus retries).
const REFRESH_MAX_ATTEMPTS: u32 = 3;
const REFRESH_BASE_DELAY: Duration = Duration::from_millis(100);

/// OAuth 2.0 endpoint and credential configuration.
///
/// The `Debug` implementation redacts the client secret.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Configuration pointing at Spotify's production endpoints with the
    /// default scope set.
    pub fn spotify(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            profile_url: SPOTIFY_PROFILE_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Token endpoint response.
///
/// Spotify omits `refresh_token` on refresh responses unless the token was
/// rotated, and in practice always sends `expires_in`; the default guards
/// against its absence.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Executes the authorization-code flow against Spotify.
#[derive(Clone)]
pub struct SpotifyAuthFlow {
    config: OAuthConfig,
    http: Arc<dyn HttpClient>,
}

impl SpotifyAuthFlow {
    pub fn new(config: OAuthConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    /// Build the URL the browser is redirected to for consent.
    pub fn authorization_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("show_dialog", "false");

        Ok(url.into())
    }

    /// Exchange a callback code for tokens and resolve the user's profile.
    ///
    /// A failed profile fetch is reported as
    /// [`AuthError::ProfileFetchFailed`]; the tokens from the exchange are
    /// still valid in that case, so the caller decides whether to retry or
    /// discard them.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthorizedUser> {
        debug!("Exchanging authorization code for tokens");

        let response = self
            .post_token_form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.config.redirect_uri),
            ])
            .await?;

        if !response.is_success() {
            let status = response.status;
            let details = error_details(&response);
            warn!(status, "Code exchange rejected by token endpoint");
            return Err(AuthError::TokenExchangeFailed { status, details });
        }

        let token_response: TokenResponse = response.json().map_err(AuthError::Network)?;
        let tokens = TokenGrant::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        );

        let profile = self.fetch_profile(&tokens.access_token).await?;
        let display_name = profile
            .display_name
            .filter(|n| !n.is_empty())
            .or(profile.email)
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());

        info!(provider_user_id = %profile.id, "Authorization code exchange succeeded");

        Ok(AuthorizedUser {
            profile_id: profile.id,
            display_name,
            tokens,
        })
    }

    /// Obtain a fresh access token from a refresh token.
    ///
    /// Client errors (a revoked or malformed refresh token) fail
    /// immediately; server errors and transport failures are retried up to
    /// three attempts with exponential backoff.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let result = self.post_token_form(&params).await;
            let retryable = match &result {
                Ok(response) => response.is_server_error(),
                Err(AuthError::Network(_)) => true,
                Err(_) => false,
            };

            if retryable && attempt < REFRESH_MAX_ATTEMPTS {
                let delay = REFRESH_BASE_DELAY * 2u32.pow(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "Token refresh failed, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            let response = result?;
            if !response.is_success() {
                let status = response.status;
                let details = error_details(&response);
                warn!(status, attempt, "Token refresh rejected");
                return Err(AuthError::RefreshFailed { status, details });
            }

            let token_response: TokenResponse = response.json().map_err(AuthError::Network)?;
            debug!(attempt, "Token refresh succeeded");
            return Ok(TokenGrant::new(
                token_response.access_token,
                token_response.refresh_token,
                token_response.expires_in,
            ));
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProfileResponse> {
        let request =
            HttpRequest::new(HttpMethod::Get, &self.config.profile_url).bearer_token(access_token);

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            let status = response.status;
            let details = error_details(&response);
            warn!(status, "Profile fetch failed after code exchange");
            return Err(AuthError::ProfileFetchFailed { status, details });
        }

        response.json().map_err(AuthError::Network)
    }

    async fn post_token_form(&self, params: &[(&str, &str)]) -> Result<HttpResponse> {
        let body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Configuration(format!("Form encoding failed: {}", e)))?;

        let credentials = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let request = HttpRequest::new(HttpMethod::Post, &self.config.token_url)
            .header("Authorization", format!("Basic {}", credentials))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(body));

        Ok(self.http.execute(request).await?)
    }
}

/// Pull a human-readable error out of a token/profile endpoint response.
///
/// Spotify sends `{"error": "...", "error_description": "..."}` from the
/// accounts service; falls back to the raw body text.
fn error_details(response: &HttpResponse) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        error_description: Option<String>,
    }

    if let Ok(body) = response.json::<ErrorBody>() {
        if let Some(description) = body.error_description {
            return description;
        }
        if let Some(error) = body.error {
            return error;
        }
    }
    response.text().unwrap_or_else(|_| "<non-text body>".to_string())
}
