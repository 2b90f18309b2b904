//! Spotify Web API client.
//!
//! All endpoints are read-only GETs authenticated with a bearer token the
//! caller supplies per request; the client itself holds no credentials.
//! Error bodies are mined for Spotify's `error.message`, and a 403 carrying
//! "insufficient client scope" is classified as
//! [`SpotifyError::InsufficientScope`].

use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{Result, SpotifyError};
use crate::types::{
    Album, Artist, CursorPage, Page, PlayHistoryItem, Playlist, PlaylistItem, SavedAlbum,
    TimeRange, Track, UserProfile,
};

const API_BASE: &str = "https://api.spotify.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard cap Spotify enforces on page sizes.
pub const MAX_PAGE_LIMIT: u32 = 50;
/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Playlist track pages are small; the panel shows them ten at a time.
const PLAYLIST_TRACKS_LIMIT: u32 = 10;

/// Typed client over the dashboard's Spotify endpoints.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Arc<dyn HttpClient>,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            api_base: API_BASE.to_string(),
        }
    }

    /// Override the API base URL, for tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// The signed-in user's profile.
    pub async fn current_user_profile(&self, token: &str) -> Result<UserProfile> {
        self.request(token, "/me").await
    }

    /// The user's top tracks over a time window.
    pub async fn top_tracks(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Page<Track>> {
        let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT);
        self.request(
            token,
            &format!(
                "/me/top/tracks?time_range={}&limit={}&offset={}",
                time_range.as_str(),
                limit,
                offset
            ),
        )
        .await
    }

    /// The user's most recent plays (cursor-paged by Spotify).
    pub async fn recently_played(
        &self,
        token: &str,
        limit: Option<u32>,
    ) -> Result<CursorPage<PlayHistoryItem>> {
        let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT);
        self.request(token, &format!("/me/player/recently-played?limit={}", limit))
            .await
    }

    /// The user's playlists, including followed private ones.
    pub async fn playlists(
        &self,
        token: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Page<Playlist>> {
        let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT);
        self.request(
            token,
            &format!("/me/playlists?limit={}&offset={}", limit, offset),
        )
        .await
    }

    /// Albums saved in the user's library.
    pub async fn saved_albums(
        &self,
        token: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Page<SavedAlbum>> {
        let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT);
        self.request(
            token,
            &format!("/me/albums?limit={}&offset={}", limit, offset),
        )
        .await
    }

    /// One page of a playlist's tracks.
    pub async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Page<PlaylistItem>> {
        let limit = clamp_limit(limit, PLAYLIST_TRACKS_LIMIT);
        self.request(
            token,
            &format!(
                "/playlists/{}/tracks?limit={}&offset={}",
                playlist_id, limit, offset
            ),
        )
        .await
    }

    pub async fn track(&self, token: &str, id: &str) -> Result<Track> {
        self.request(token, &format!("/tracks/{}", id)).await
    }

    pub async fn artist(&self, token: &str, id: &str) -> Result<Artist> {
        self.request(token, &format!("/artists/{}", id)).await
    }

    pub async fn album(&self, token: &str, id: &str) -> Result<Album> {
        self.request(token, &format!("/albums/{}", id)).await
    }

    pub async fn playlist(&self, token: &str, id: &str) -> Result<Playlist> {
        self.request(token, &format!("/playlists/{}", id)).await
    }

    /// Follow a `next` link from a previous page.
    pub async fn next_page<T: DeserializeOwned>(
        &self,
        token: &str,
        next_url: &str,
    ) -> Result<Page<T>> {
        self.request(token, next_url).await
    }

    /// Issue a GET and validate the response into `T`.
    ///
    /// `path` is either a path relative to the API base or an absolute
    /// `https://` URL (Spotify's `next` links are absolute).
    #[instrument(skip(self, token), fields(path = %path))]
    async fn request<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T> {
        if token.is_empty() {
            return Err(SpotifyError::MissingToken);
        }

        let url = if path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.api_base, path)
        };

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(token)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self.http.execute(request).await?;

        if !response.is_success() {
            return Err(classify_error(&response));
        }

        debug!(status = response.status, "Spotify API request succeeded");
        serde_json::from_slice(&response.body)
            .map_err(|e| SpotifyError::Parse(format!("{} (at {})", e, path)))
    }
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn clamp_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_LIMIT)
}

/// Classify a non-2xx response.
///
/// Spotify wraps errors as `{"error": {"status": ..., "message": ...}}`;
/// plain-text bodies are passed through. The scope check is
/// case-insensitive because the API has varied its casing over time.
fn classify_error(response: &HttpResponse) -> SpotifyError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        message: Option<String>,
    }

    let details = serde_json::from_slice::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| String::from_utf8_lossy(&response.body).to_string());

    let status = response.status;
    if status == 403 && details.to_lowercase().contains("insufficient client scope") {
        warn!(status, "Request rejected for missing scope");
        return SpotifyError::InsufficientScope { details };
    }

    warn!(status, "Spotify API request failed");
    SpotifyError::Api { status, details }
}
