//! Session State Persistence Abstraction
//!
//! The session layer owns the only durable mutable state in the core: the
//! per-browser session record holding provider identity and OAuth tokens.
//! This trait abstracts where those records live (in-process map, Redis,
//! a database table) so the auth crates stay host-agnostic.

use async_trait::async_trait;

use crate::error::Result;

/// Opaque session record storage.
///
/// Keys are namespaced strings chosen by the caller (for example
/// `session:<id>`); values are opaque byte blobs. Implementations must not
/// interpret the value and must never log it, since it contains OAuth
/// tokens.
///
/// # Semantics
///
/// - `put_record` overwrites any existing value for the key.
/// - `get_record` returns `None` for an unknown key.
/// - `delete_record` is idempotent; deleting a missing key is not an error.
#[async_trait]
pub trait SessionStateStore: Send + Sync {
    /// Store a record, replacing any previous value.
    async fn put_record(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a record, or `None` if absent.
    async fn get_record(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a record. No-op when the key does not exist.
    async fn delete_record(&self, key: &str) -> Result<()>;

    /// List all stored keys, for diagnostics and cleanup sweeps.
    async fn list_keys(&self) -> Result<Vec<String>>;
}
