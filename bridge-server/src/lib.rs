//! # Server Bridge Implementations
//!
//! Concrete adapters for running the dashboard core in a server process:
//!
//! - [`ReqwestHttpClient`] - HTTP via reqwest with rustls and retry/backoff
//! - [`MemorySessionStore`] - in-process session records, suitable for
//!   single-process deployments and tests
//!
//! Hosts with other needs (shared session storage across replicas, custom
//! TLS handling) implement the `bridge-traits` contracts themselves and
//! skip this crate.

pub mod http;
pub mod session_store;

pub use http::ReqwestHttpClient;
pub use session_store::MemorySessionStore;
