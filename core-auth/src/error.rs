use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token exchange failed with status {status}: {details}")]
    TokenExchangeFailed { status: u16, details: String },

    #[error("Profile fetch failed with status {status}: {details}")]
    ProfileFetchFailed { status: u16, details: String },

    #[error("Token refresh failed with status {status}: {details}")]
    RefreshFailed { status: u16, details: String },

    #[error("Session storage unavailable: {0}")]
    SessionStorageUnavailable(String),

    #[error("Invalid OAuth configuration: {0}")]
    Configuration(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] bridge_traits::BridgeError),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// Whether the user can recover without going through consent again.
    ///
    /// Storage and network failures are transient; a rejected refresh token
    /// or failed code exchange requires a new authorization.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::SessionStorageUnavailable(_)
                | AuthError::Network(_)
                | AuthError::ProfileFetchFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
