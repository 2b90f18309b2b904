//! # Authentication Module
//!
//! Spotify OAuth 2.0 authorization-code flow, session records, and signed
//! session cookies for the dashboard core.
//!
//! ## Overview
//!
//! This module owns the full credential lifecycle:
//!
//! - Building the Spotify authorization URL and exchanging callback codes
//! - Persisting sessions (identity + tokens) via [`SessionStore`]
//! - Resolving an incoming cookie into a live session, refreshing expired
//!   access tokens at most once per request
//! - Encoding and verifying the HTTP-only session cookie
//!
//! ## Features
//!
//! - OAuth 2.0 authorization-code flow with token refresh
//! - Refresh serialized per session so concurrent requests share one refresh
//! - Irrecoverable refresh failures clear the session (user must re-consent)
//! - Auth state event emission

pub mod callback;
pub mod cookie;
pub mod error;
pub mod oauth;
pub mod resolver;
pub mod session;
pub mod types;

pub use callback::{handle_callback, CallbackErrorCode, CallbackOutcome, CallbackParams};
pub use cookie::{CookieCodec, SESSION_COOKIE_NAME};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, SpotifyAuthFlow, DEFAULT_SCOPES};
pub use resolver::SessionResolver;
pub use session::SessionStore;
pub use types::{now_ms, AuthorizedUser, Session, SessionId, TokenGrant};
