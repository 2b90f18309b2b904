//! Session Persistence
//!
//! Stores [`Session`] records behind the [`SessionStateStore`] abstraction.
//! Records are serialized to JSON under `session:<id>` keys. A record that
//! fails to deserialize is deleted and treated as absent, so a corrupted
//! store never wedges a browser in a half-signed-in state.
//!
//! Token values are never logged; audit lines carry only the session id and
//! booleans.

use bridge_traits::SessionStateStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};
use crate::types::{Session, SessionId};

const KEY_PREFIX: &str = "session:";

/// JSON-backed session storage.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn SessionStateStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn SessionStateStore>) -> Self {
        debug!("Initializing SessionStore");
        Self { store }
    }

    /// Persist a session, overwriting any previous record for its id.
    pub async fn put(&self, session: &Session) -> Result<()> {
        let key = storage_key(&session.id);
        let json = serde_json::to_vec(session)?;

        self.store.put_record(&key, &json).await.map_err(|e| {
            warn!(session_id = %session.id, error = %e, "Failed to persist session");
            AuthError::SessionStorageUnavailable(e.to_string())
        })?;

        info!(
            session_id = %session.id,
            has_refresh_token = session.refresh_token.is_some(),
            "Session persisted"
        );
        Ok(())
    }

    /// Load a session by id.
    ///
    /// Returns `Ok(None)` when no record exists, and also when the record is
    /// corrupted (the corrupted record is deleted first).
    pub async fn get(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let key = storage_key(session_id);

        let data = self.store.get_record(&key).await.map_err(|e| {
            warn!(session_id = %session_id, error = %e, "Failed to read session");
            AuthError::SessionStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(session_id = %session_id, "No session record found");
            return Ok(None);
        };

        match serde_json::from_slice::<Session>(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Session record corrupted, deleting"
                );
                if let Err(delete_err) = self.store.delete_record(&key).await {
                    warn!(
                        session_id = %session_id,
                        error = %delete_err,
                        "Failed to delete corrupted session record"
                    );
                }
                Ok(None)
            }
        }
    }

    /// Delete a session. Idempotent.
    pub async fn delete(&self, session_id: &SessionId) -> Result<()> {
        let key = storage_key(session_id);

        self.store.delete_record(&key).await.map_err(|e| {
            warn!(session_id = %session_id, error = %e, "Failed to delete session");
            AuthError::SessionStorageUnavailable(e.to_string())
        })?;

        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// List ids of all stored sessions, for diagnostics and cleanup sweeps.
    pub async fn list_ids(&self) -> Result<Vec<SessionId>> {
        let keys = self.store.list_keys().await.map_err(|e| {
            warn!(error = %e, "Failed to list session keys");
            AuthError::SessionStorageUnavailable(e.to_string())
        })?;

        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX))
            .map(SessionId::from_string)
            .collect())
    }
}

fn storage_key(session_id: &SessionId) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenGrant;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MockStateStore {
        records: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MockStateStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(HashMap::new()),
            })
        }

        async fn insert_raw(&self, key: &str, value: &[u8]) {
            self.records.lock().await.insert(key.to_string(), value.to_vec());
        }
    }

    #[async_trait::async_trait]
    impl SessionStateStore for MockStateStore {
        async fn put_record(&self, key: &str, value: &[u8]) -> bridge_traits::error::Result<()> {
            self.records.lock().await.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_record(&self, key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            Ok(self.records.lock().await.get(key).cloned())
        }

        async fn delete_record(&self, key: &str) -> bridge_traits::error::Result<()> {
            self.records.lock().await.remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> bridge_traits::error::Result<Vec<String>> {
            Ok(self.records.lock().await.keys().cloned().collect())
        }
    }

    fn sample_session() -> Session {
        Session::new(
            "spotify-user".to_string(),
            "Listener".to_string(),
            TokenGrant {
                access_token: "at".to_string(),
                refresh_token: Some("rt".to_string()),
                expires_at: 1_000,
            },
        )
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let store = SessionStore::new(MockStateStore::new());
        let session = sample_session();

        store.put(&session).await.unwrap();
        let loaded = store.get(&session.id).await.unwrap().unwrap();

        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.provider_user_id, "spotify-user");
        assert_eq!(loaded.access_token, "at");
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = SessionStore::new(MockStateStore::new());
        let result = store.get(&SessionId::generate()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_record_is_deleted_and_treated_as_missing() {
        let backing = MockStateStore::new();
        let store = SessionStore::new(backing.clone());

        let id = SessionId::generate();
        backing
            .insert_raw(&format!("session:{}", id), b"not json")
            .await;

        assert!(store.get(&id).await.unwrap().is_none());
        // The broken record was removed
        assert!(backing.records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SessionStore::new(MockStateStore::new());
        let session = sample_session();

        store.put(&session).await.unwrap();
        store.delete(&session.id).await.unwrap();
        store.delete(&session.id).await.unwrap();

        assert!(store.get(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ids() {
        let store = SessionStore::new(MockStateStore::new());
        let a = sample_session();
        let b = sample_session();

        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();

        let ids = store.list_ids().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_record() {
        let store = SessionStore::new(MockStateStore::new());
        let mut session = sample_session();

        store.put(&session).await.unwrap();
        session.access_token = "at-2".to_string();
        store.put(&session).await.unwrap();

        let loaded = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at-2");
    }
}
