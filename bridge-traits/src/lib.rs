//! # Host Bridge Traits
//!
//! Abstraction traits that the dashboard core requires from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and the
//! environment they run in. Each trait represents a capability that may be
//! implemented differently per deployment (real server process, integration
//! test harness, embedded worker).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with retry policies
//! - [`SessionStateStore`](storage::SessionStateStore) - Opaque session
//!   record persistence
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing, rather than degrading silently:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client provided. Enable the server-shims \
//!                  feature or inject an adapter.".to_string(),
//!     })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across
//! async tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::SessionStateStore;
