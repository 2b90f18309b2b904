//! Runtime error type.
//!
//! Covers the two ways assembling the dashboard core can fail: a setting
//! that fails validation, and a host capability (HTTP client, session
//! store) that was neither injected nor available as a shim default. The
//! domain crates carry their own error enums; this one is only for
//! configuration and assembly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing capability '{capability}': {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
