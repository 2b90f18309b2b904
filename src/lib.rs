//! Umbrella crate for the Spotify dashboard core.
//!
//! Hosts depend on `sdc-workspace` and get the whole stack re-exported:
//! configuration and events from [`core_runtime`], the OAuth/session layer
//! from [`core_auth`], the typed Web API client from [`provider_spotify`],
//! and the interaction controllers from [`core_dashboard`]. The default
//! `server-shims` feature wires in the reqwest HTTP client and the
//! in-process session store so a server binary only supplies credentials.
//!
//! ```ignore
//! use sdc_workspace::runtime::config::DashboardConfig;
//! use sdc_workspace::dashboard::DashboardService;
//!
//! let config = DashboardConfig::builder()
//!     .client_id(std::env::var("SPOTIFY_CLIENT_ID")?)
//!     .client_secret(std::env::var("SPOTIFY_CLIENT_SECRET")?)
//!     .redirect_uri("https://dash.example.com/auth/spotify/callback")
//!     .session_secret(std::env::var("SESSION_SECRET")?)
//!     .build()?;
//! let service = DashboardService::new(config)?;
//! ```

pub use bridge_traits as bridge;
pub use core_auth as auth;
pub use core_dashboard as dashboard;
pub use core_runtime as runtime;
pub use provider_spotify as spotify;

#[cfg(feature = "server-shims")]
pub use bridge_server as server;
