use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    #[error(transparent)]
    Provider(#[from] provider_spotify::SpotifyError),

    #[error("Not signed in")]
    NotSignedIn,
}

pub type Result<T> = std::result::Result<T, DashboardError>;
