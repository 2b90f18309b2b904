//! Signed Session Cookie
//!
//! The browser holds a single HTTP-only cookie whose value is the session id
//! plus a signature over it. The signature proves the id was issued by this
//! server; it carries no user data and no token material.
//!
//! Cookie attributes: `HttpOnly; SameSite=Lax; Path=/; Max-Age=<7 days>`,
//! plus `Secure` when configured for production.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::types::SessionId;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "sdc_session";

/// Encodes and verifies the signed session cookie.
///
/// The cookie value is `<session_id>.<signature>` where the signature is a
/// SHA-256 digest over the server secret and the id, base64url-encoded.
/// Tampered or foreign cookies fail verification and decode to `None`.
#[derive(Clone)]
pub struct CookieCodec {
    secret: String,
    secure: bool,
    max_age: Duration,
}

impl std::fmt::Debug for CookieCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCodec")
            .field("secret", &"[REDACTED]")
            .field("secure", &self.secure)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl CookieCodec {
    pub fn new(secret: impl Into<String>, secure: bool, max_age: Duration) -> Self {
        Self {
            secret: secret.into(),
            secure,
            max_age,
        }
    }

    fn signature(&self, session_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(session_id.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Produce the signed cookie value for a session id.
    pub fn encode(&self, session_id: &SessionId) -> String {
        format!("{}.{}", session_id.as_str(), self.signature(session_id.as_str()))
    }

    /// Verify a cookie value and extract the session id.
    ///
    /// Returns `None` for malformed values and for signature mismatches.
    pub fn decode(&self, value: &str) -> Option<SessionId> {
        let (id, sig) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let expected = self.signature(id);
        if constant_time_eq(sig.as_bytes(), expected.as_bytes()) {
            Some(SessionId::from_string(id))
        } else {
            None
        }
    }

    /// Build the `Set-Cookie` header value that establishes a session.
    pub fn set_cookie_header(&self, session_id: &SessionId) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
            SESSION_COOKIE_NAME,
            self.encode(session_id),
            self.max_age.as_secs(),
            if self.secure { "; Secure" } else { "" }
        )
    }

    /// Build the `Set-Cookie` header value that clears the session cookie.
    pub fn clear_cookie_header(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
            SESSION_COOKIE_NAME,
            if self.secure { "; Secure" } else { "" }
        )
    }

    /// Extract and verify the session id from a `Cookie` request header.
    pub fn session_id_from_header(&self, cookie_header: &str) -> Option<SessionId> {
        cookie_header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == SESSION_COOKIE_NAME {
                self.decode(value)
            } else {
                None
            }
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
