//! # Dashboard Configuration Module
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`DashboardConfig`] instance holding the OAuth application settings and
//! the host capabilities the core needs. It enforces fail-fast validation so
//! a misconfigured deployment dies at startup with an actionable message,
//! not at the first sign-in attempt.
//!
//! ## Required settings
//!
//! - `client_id` / `client_secret` - OAuth application credentials
//! - `redirect_uri` - callback URL registered with the provider
//! - `session_secret` - key used to sign session cookies
//!
//! ## Capabilities
//!
//! - `HttpClient` - outbound HTTP (server default: reqwest)
//! - `SessionStateStore` - session record persistence (server default:
//!   in-process map)
//!
//! When the `server-shims` feature is enabled, defaults for both are
//! injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::DashboardConfig;
//!
//! let config = DashboardConfig::builder()
//!     .client_id("my-client-id")
//!     .client_secret(std::env::var("SPOTIFY_CLIENT_SECRET")?)
//!     .redirect_uri("https://dash.example.com/auth/spotify/callback")
//!     .session_secret(std::env::var("SESSION_SECRET")?)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SessionStateStore};
use std::sync::Arc;
use std::time::Duration;

/// Default debounce window before a hover-prefetch fires.
pub const DEFAULT_PREFETCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Default number of entity details kept in the LRU cache.
pub const DEFAULT_DETAIL_CACHE_CAPACITY: usize = 64;

/// Default freshness window for cached entity details.
pub const DEFAULT_DETAIL_FRESH_FOR: Duration = Duration::from_secs(30 * 60);

/// Default session cookie lifetime.
pub const DEFAULT_COOKIE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for the dashboard core.
///
/// Use [`DashboardConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct DashboardConfig {
    /// OAuth client id registered with the provider
    pub client_id: String,

    /// OAuth client secret (secret)
    pub client_secret: String,

    /// Redirect URI the provider sends the authorization code to
    pub redirect_uri: String,

    /// OAuth scopes to request; empty means the standard dashboard set
    pub scopes: Vec<String>,

    /// Secret used to sign the session cookie (secret)
    pub session_secret: String,

    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,

    /// Session cookie max age
    pub cookie_max_age: Duration,

    /// Debounce window before a hover-prefetch fires
    pub prefetch_debounce: Duration,

    /// Capacity of the entity-detail LRU cache
    pub detail_cache_capacity: usize,

    /// How long a cached entity detail counts as fresh
    pub detail_fresh_for: Duration,

    /// HTTP client for token and resource requests
    pub http_client: Arc<dyn HttpClient>,

    /// Session record persistence
    pub session_store: Arc<dyn SessionStateStore>,
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("session_secret", &"[REDACTED]")
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_max_age", &self.cookie_max_age)
            .field("prefetch_debounce", &self.prefetch_debounce)
            .field("detail_cache_capacity", &self.detail_cache_capacity)
            .field("detail_fresh_for", &self.detail_fresh_for)
            .field("http_client", &"HttpClient { ... }")
            .field("session_store", &"SessionStateStore { ... }")
            .finish()
    }
}

impl DashboardConfig {
    /// Creates a new builder for constructing a `DashboardConfig`.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::Config("OAuth client id cannot be empty".to_string()));
        }

        if self.client_secret.is_empty() {
            return Err(Error::Config(
                "OAuth client secret cannot be empty".to_string(),
            ));
        }

        if !self.redirect_uri.starts_with("http://") && !self.redirect_uri.starts_with("https://") {
            return Err(Error::Config(format!(
                "Redirect URI must be an absolute http(s) URL, got '{}'",
                self.redirect_uri
            )));
        }

        if self.session_secret.len() < 16 {
            return Err(Error::Config(
                "Session secret must be at least 16 characters; generate a random value \
                 and supply it via environment"
                    .to_string(),
            ));
        }

        if self.cookie_max_age.is_zero() {
            return Err(Error::Config(
                "Cookie max age must be greater than zero".to_string(),
            ));
        }

        if self.prefetch_debounce > Duration::from_secs(10) {
            return Err(Error::Config(
                "Prefetch debounce exceeds maximum of 10 seconds".to_string(),
            ));
        }

        if self.detail_cache_capacity == 0 {
            return Err(Error::Config(
                "Detail cache capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "server-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_server::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Ok(client)
}

#[cfg(not(feature = "server-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for OAuth and provider requests. \
                 Enable the 'server-shims' feature to use the default reqwest client, \
                 or inject one with .http_client()."
            .to_string(),
    })
}

#[cfg(feature = "server-shims")]
fn provide_default_session_store() -> Result<Arc<dyn SessionStateStore>> {
    use bridge_server::MemorySessionStore;

    let store: Arc<dyn SessionStateStore> = Arc::new(MemorySessionStore::new());
    Ok(store)
}

#[cfg(not(feature = "server-shims"))]
fn provide_default_session_store() -> Result<Arc<dyn SessionStateStore>> {
    Err(Error::CapabilityMissing {
        capability: "SessionStateStore".to_string(),
        message: "SessionStateStore implementation is required for session persistence. \
                 Enable the 'server-shims' feature to use the in-memory store, \
                 or inject one with .session_store()."
            .to_string(),
    })
}

/// Builder for constructing [`DashboardConfig`] instances.
#[derive(Default)]
pub struct DashboardConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
    session_secret: Option<String>,
    cookie_secure: bool,
    cookie_max_age: Option<Duration>,
    prefetch_debounce: Option<Duration>,
    detail_cache_capacity: Option<usize>,
    detail_fresh_for: Option<Duration>,
    http_client: Option<Arc<dyn HttpClient>>,
    session_store: Option<Arc<dyn SessionStateStore>>,
}

impl DashboardConfigBuilder {
    /// Sets the OAuth client id (required).
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the OAuth client secret (required).
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the OAuth redirect URI (required).
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Overrides the requested OAuth scopes.
    ///
    /// When not set, the auth layer requests its standard dashboard scope
    /// set (profile, library, listening history, private playlists).
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the cookie-signing secret (required, at least 16 characters).
    pub fn session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(secret.into());
        self
    }

    /// Marks the session cookie `Secure` (set in production behind TLS).
    ///
    /// Default: false
    pub fn cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Sets the session cookie max age.
    ///
    /// Default: 7 days
    pub fn cookie_max_age(mut self, max_age: Duration) -> Self {
        self.cookie_max_age = Some(max_age);
        self
    }

    /// Sets the hover-prefetch debounce window.
    ///
    /// Default: 200ms
    pub fn prefetch_debounce(mut self, debounce: Duration) -> Self {
        self.prefetch_debounce = Some(debounce);
        self
    }

    /// Sets the entity-detail cache capacity.
    ///
    /// Default: 64 entries
    pub fn detail_cache_capacity(mut self, capacity: usize) -> Self {
        self.detail_cache_capacity = Some(capacity);
        self
    }

    /// Sets how long a cached entity detail counts as fresh.
    ///
    /// Default: 30 minutes
    pub fn detail_fresh_for(mut self, fresh_for: Duration) -> Self {
        self.detail_fresh_for = Some(fresh_for);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the server default (reqwest-based) is used when the
    /// `server-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the session store implementation.
    ///
    /// If not provided, the in-process store is used when the `server-shims`
    /// feature is enabled.
    pub fn session_store(mut self, store: Arc<dyn SessionStateStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Builds the final `DashboardConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required settings are missing (client id/secret, redirect URI,
    ///   session secret)
    /// - Required capabilities are missing and no shim default exists
    /// - Values are out of range
    pub fn build(self) -> Result<DashboardConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config("OAuth client id is required. Use .client_id() to set it.".to_string())
        })?;

        let client_secret = self.client_secret.ok_or_else(|| {
            Error::Config(
                "OAuth client secret is required. Use .client_secret() to set it.".to_string(),
            )
        })?;

        let redirect_uri = self.redirect_uri.ok_or_else(|| {
            Error::Config("Redirect URI is required. Use .redirect_uri() to set it.".to_string())
        })?;

        let session_secret = self.session_secret.ok_or_else(|| {
            Error::Config(
                "Session secret is required. Use .session_secret() to set it.".to_string(),
            )
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let session_store = match self.session_store {
            Some(store) => store,
            None => provide_default_session_store()?,
        };

        let config = DashboardConfig {
            client_id,
            client_secret,
            redirect_uri,
            scopes: self.scopes,
            session_secret,
            cookie_secure: self.cookie_secure,
            cookie_max_age: self.cookie_max_age.unwrap_or(DEFAULT_COOKIE_MAX_AGE),
            prefetch_debounce: self.prefetch_debounce.unwrap_or(DEFAULT_PREFETCH_DEBOUNCE),
            detail_cache_capacity: self
                .detail_cache_capacity
                .unwrap_or(DEFAULT_DETAIL_CACHE_CAPACITY),
            detail_fresh_for: self.detail_fresh_for.unwrap_or(DEFAULT_DETAIL_FRESH_FOR),
            http_client,
            session_store,
        };

        config.validate()?;

        Ok(config)
    }
}
