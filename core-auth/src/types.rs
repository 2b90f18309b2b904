use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current wall-clock time in epoch milliseconds.
///
/// All expiry bookkeeping in this crate uses epoch milliseconds so that
/// session records serialize to a stable integer.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Opaque identifier for a browser session.
///
/// The id is random and carries no user information; the mapping to a user
/// lives server-side in the [`SessionStore`](crate::SessionStore). The cookie
/// sent to the browser contains this id plus a signature.
///
/// # Examples
///
/// ```
/// use core_auth::SessionId;
///
/// let id = SessionId::generate();
/// assert!(!id.as_str().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session id (128 bits, base64url).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an existing id string, e.g. one recovered from a cookie.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tokens returned by the provider's token endpoint.
///
/// On refresh the provider may or may not rotate the refresh token, so it is
/// optional here; [`Session::apply_refresh`] keeps the previous one when the
/// grant omits it.
///
/// The `Debug` implementation redacts token material.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Token used to obtain new access tokens, when the provider issued one.
    pub refresh_token: Option<String>,
    /// Access token expiry, epoch milliseconds.
    pub expires_at: i64,
}

impl TokenGrant {
    /// Build a grant from the provider's `expires_in` seconds field.
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in_secs: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now_ms() + expires_in_secs * 1000,
        }
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A persisted browser session: provider identity plus current tokens.
///
/// Sessions are append-only from the browser's point of view; the server
/// mutates them only to apply a token refresh or delete them outright.
///
/// The `Debug` implementation redacts token material.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    /// The session identifier, also embedded in the cookie.
    pub id: SessionId,
    /// Spotify user id of the authenticated account.
    pub provider_user_id: String,
    /// Display name resolved at sign-in time.
    pub display_name: String,
    /// Current access token.
    pub access_token: String,
    /// Refresh token, absent when the provider never issued one.
    pub refresh_token: Option<String>,
    /// Access token expiry, epoch milliseconds.
    pub expires_at: i64,
    /// When the session was created, epoch milliseconds.
    pub created_at: i64,
}

impl Session {
    /// Create a new session for an authorized user.
    pub fn new(provider_user_id: String, display_name: String, tokens: TokenGrant) -> Self {
        Self {
            id: SessionId::generate(),
            provider_user_id,
            display_name,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            created_at: now_ms(),
        }
    }

    /// Whether the access token has expired at the given instant.
    ///
    /// Expiry is inclusive: a token whose `expires_at` equals `now` is
    /// already expired.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Apply a refresh grant to this session.
    ///
    /// A rotated refresh token replaces the stored one; when the grant omits
    /// a refresh token the existing one is kept.
    pub fn apply_refresh(&mut self, grant: TokenGrant) {
        self.access_token = grant.access_token;
        if grant.refresh_token.is_some() {
            self.refresh_token = grant.refresh_token;
        }
        self.expires_at = grant.expires_at;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("provider_user_id", &self.provider_user_id)
            .field("display_name", &self.display_name)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Identity and tokens produced by a successful code exchange.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    /// Spotify user id.
    pub profile_id: String,
    /// Resolved display name (falls back to email, then a generic label).
    pub display_name: String,
    /// The token grant from the exchange.
    pub tokens: TokenGrant,
}
