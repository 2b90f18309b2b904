use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpotifyError {
    #[error("No access token available")]
    MissingToken,

    #[error("Spotify API error {status}: {details}")]
    Api { status: u16, details: String },

    #[error("Insufficient scope: {details}")]
    InsufficientScope { details: String },

    #[error("Failed to parse Spotify response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] bridge_traits::BridgeError),
}

impl SpotifyError {
    /// Whether the caller should send the user back through authorization.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            SpotifyError::MissingToken
                | SpotifyError::InsufficientScope { .. }
                | SpotifyError::Api { status: 401, .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpotifyError>;
