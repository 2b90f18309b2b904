//! In-Memory Session Store
//!
//! Keeps session records in a process-local map. Records do not survive a
//! restart, which matches the original deployment model (sessions are cheap
//! to re-establish through the OAuth flow). Multi-replica deployments need
//! a shared implementation instead.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::storage::SessionStateStore;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local [`SessionStateStore`] backed by a `HashMap`.
#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, for tests and diagnostics.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStateStore for MemorySessionStore {
    async fn put_record(&self, key: &str, value: &[u8]) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_record(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn delete_record(&self, key: &str) -> Result<()> {
        self.records.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.records.lock().await.keys().cloned().collect())
    }
}
