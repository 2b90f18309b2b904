//! # Spotify Web API Client
//!
//! Read-only, typed access to the Spotify Web API endpoints the dashboard
//! renders: the user's profile, top tracks, recently played, playlists,
//! saved albums, and per-entity details.
//!
//! Responses are validated into typed models at this boundary; malformed
//! payloads surface as [`SpotifyError::Parse`] instead of leaking untyped
//! JSON upward. A 403 whose message names an insufficient scope is
//! classified separately so hosts can tell "re-consent needed" apart from
//! ordinary API failures.

pub mod client;
pub mod error;
pub mod types;

pub use client::{SpotifyClient, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use error::{Result, SpotifyError};
pub use types::{
    Album, AlbumRef, Artist, ArtistRef, CursorPage, Image, Page, PlayHistoryItem, Playlist,
    PlaylistItem, SavedAlbum, TimeRange, Track, UserProfile,
};

/// How long each resource stays fresh before the dashboard should refetch.
///
/// These mirror how quickly the underlying data actually moves: playback
/// history churns constantly, a playlist's track list rarely.
pub mod stale {
    use std::time::Duration;

    pub const TOP_TRACKS: Duration = Duration::from_secs(5 * 60);
    pub const RECENTLY_PLAYED: Duration = Duration::from_secs(60);
    pub const PLAYLISTS: Duration = Duration::from_secs(10 * 60);
    pub const SAVED_ALBUMS: Duration = Duration::from_secs(10 * 60);
    pub const ENTITY_DETAILS: Duration = Duration::from_secs(30 * 60);
    pub const PLAYLIST_TRACKS: Duration = Duration::from_secs(30);
}
