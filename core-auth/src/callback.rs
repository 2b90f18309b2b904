//! OAuth Callback Handling
//!
//! Maps the provider's redirect back to the application into one of two
//! outcomes: the user lands on the dashboard with a session cookie, or back
//! on the landing page with a stable error code the host can surface.
//!
//! Error codes, in precedence order:
//!
//! - `spotify_rejected` - Spotify sent an `error` parameter (consent denied)
//! - `no_code` - the redirect carried neither an error nor a code
//! - `auth_failed` - code exchange or profile fetch failed
//! - `callback_failed` - tokens were obtained but the session could not be
//!   persisted

use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::resolver::SessionResolver;
use crate::types::Session;

/// Query parameters Spotify appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Stable error codes surfaced to the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackErrorCode {
    /// The user denied consent, or Spotify rejected the authorization.
    SpotifyRejected,
    /// The redirect carried no authorization code.
    NoCode,
    /// The session could not be persisted after a successful exchange.
    CallbackFailed,
    /// Code exchange or profile fetch failed.
    AuthFailed,
}

impl CallbackErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackErrorCode::SpotifyRejected => "spotify_rejected",
            CallbackErrorCode::NoCode => "no_code",
            CallbackErrorCode::CallbackFailed => "callback_failed",
            CallbackErrorCode::AuthFailed => "auth_failed",
        }
    }
}

impl fmt::Display for CallbackErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the browser goes after the callback is processed.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// Sign-in succeeded: redirect to the dashboard with a session cookie.
    Dashboard {
        session: Session,
        /// Value for the `Set-Cookie` response header.
        set_cookie: String,
    },
    /// Sign-in failed: redirect to the landing page with an error code.
    Landing { error: CallbackErrorCode },
}

/// Process the OAuth redirect and produce an outcome.
pub async fn handle_callback(
    resolver: &SessionResolver,
    params: CallbackParams,
) -> CallbackOutcome {
    if let Some(error) = &params.error {
        warn!(provider_error = %error, "Authorization rejected by provider");
        return CallbackOutcome::Landing {
            error: CallbackErrorCode::SpotifyRejected,
        };
    }

    let Some(code) = params.code else {
        warn!("Callback carried no authorization code");
        return CallbackOutcome::Landing {
            error: CallbackErrorCode::NoCode,
        };
    };

    let user = match resolver.auth_flow().exchange_code(&code).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Code exchange failed during callback");
            return CallbackOutcome::Landing { error: classify(&e) };
        }
    };

    match resolver.establish(user).await {
        Ok(session) => {
            let set_cookie = resolver.cookie_codec().set_cookie_header(&session.id);
            info!(session_id = %session.id, "Callback completed, session established");
            CallbackOutcome::Dashboard {
                session,
                set_cookie,
            }
        }
        Err(e) => {
            warn!(error = %e, "Session persistence failed after exchange");
            CallbackOutcome::Landing { error: classify(&e) }
        }
    }
}

fn classify(error: &AuthError) -> CallbackErrorCode {
    match error {
        AuthError::SessionStorageUnavailable(_) | AuthError::Serialization(_) => {
            CallbackErrorCode::CallbackFailed
        }
        _ => CallbackErrorCode::AuthFailed,
    }
}
