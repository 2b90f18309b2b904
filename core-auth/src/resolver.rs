//! Session Resolution
//!
//! Turns an incoming request cookie into a live [`Session`]:
//!
//! 1. No cookie, or a cookie that fails signature verification: signed out.
//! 2. No stored record for the id: signed out.
//! 3. Access token still valid: return the session as-is.
//! 4. Expired with no refresh token: clear the record, signed out.
//! 5. Expired with a refresh token: refresh, persist the merged session, and
//!    return it. Any refresh failure clears the record so the user is sent
//!    back through consent rather than looping on a dead token.
//!
//! Refreshes are serialized per session id: concurrent requests for the same
//! expired session take a shared lock, and waiters re-read the record after
//! acquiring it so a refresh completed by the winner is reused instead of
//! repeated.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use core_runtime::events::{AuthEvent, CoreEvent};
use core_runtime::EventBus;

use crate::cookie::CookieCodec;
use crate::error::Result;
use crate::oauth::SpotifyAuthFlow;
use crate::session::SessionStore;
use crate::types::{now_ms, AuthorizedUser, Session, SessionId};

pub struct SessionResolver {
    sessions: SessionStore,
    flow: SpotifyAuthFlow,
    codec: CookieCodec,
    events: Option<EventBus>,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionResolver {
    pub fn new(sessions: SessionStore, flow: SpotifyAuthFlow, codec: CookieCodec) -> Self {
        Self {
            sessions,
            flow,
            codec,
            events: None,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Attach an event bus for auth lifecycle events.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// The codec used to read and write the session cookie.
    pub fn cookie_codec(&self) -> &CookieCodec {
        &self.codec
    }

    /// The OAuth flow this resolver refreshes tokens with.
    pub fn auth_flow(&self) -> &SpotifyAuthFlow {
        &self.flow
    }

    /// Resolve a raw `Cookie` request header into a session.
    ///
    /// A missing header or a cookie that fails verification resolves to
    /// signed out without touching storage.
    pub async fn resolve_cookie(&self, cookie_header: Option<&str>) -> Result<Option<Session>> {
        let Some(header) = cookie_header else {
            return Ok(None);
        };
        let Some(session_id) = self.codec.session_id_from_header(header) else {
            debug!("Cookie missing or failed verification");
            return Ok(None);
        };
        self.resolve(&session_id).await
    }

    /// Resolve a verified session id into a session, refreshing if needed.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn resolve(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let Some(session) = self.sessions.get(session_id).await? else {
            return Ok(None);
        };

        if !session.is_expired(now_ms()) {
            return Ok(Some(session));
        }

        if session.refresh_token.is_none() {
            info!("Session expired with no refresh token, clearing");
            self.clear(session_id).await;
            return Ok(None);
        }

        let lock = self.refresh_lock(session_id).await;
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent request may have already
        // completed the refresh while we waited.
        let Some(session) = self.sessions.get(session_id).await? else {
            return Ok(None);
        };
        if !session.is_expired(now_ms()) {
            debug!("Session refreshed by a concurrent request");
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.clone() else {
            self.clear(session_id).await;
            return Ok(None);
        };

        self.emit(AuthEvent::TokenRefreshing {
            session_id: session_id.to_string(),
        });

        match self.flow.refresh(&refresh_token).await {
            Ok(grant) => {
                let mut refreshed = session;
                refreshed.apply_refresh(grant);
                self.sessions.put(&refreshed).await?;

                info!(expires_at = refreshed.expires_at, "Access token refreshed");
                self.emit(AuthEvent::TokenRefreshed {
                    session_id: session_id.to_string(),
                    expires_at: refreshed.expires_at,
                });
                Ok(Some(refreshed))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.emit(AuthEvent::AuthError {
                    session_id: Some(session_id.to_string()),
                    message: e.to_string(),
                    recoverable: e.is_recoverable(),
                });
                self.clear(session_id).await;
                Ok(None)
            }
        }
    }

    /// Create and persist a session for a freshly authorized user.
    pub async fn establish(&self, user: AuthorizedUser) -> Result<Session> {
        let session = Session::new(user.profile_id, user.display_name, user.tokens);
        self.sessions.put(&session).await?;

        self.emit(AuthEvent::SignedIn {
            session_id: session.id.to_string(),
            provider_user_id: session.provider_user_id.clone(),
        });
        Ok(session)
    }

    /// Explicit sign-out: delete the session record.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn logout(&self, session_id: &SessionId) -> Result<()> {
        self.sessions.delete(session_id).await?;
        self.emit(AuthEvent::SignedOut {
            session_id: session_id.to_string(),
        });
        Ok(())
    }

    async fn clear(&self, session_id: &SessionId) {
        if let Err(e) = self.sessions.delete(session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to clear session");
        }
        self.emit(AuthEvent::SignedOut {
            session_id: session_id.to_string(),
        });
    }

    async fn refresh_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(session_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(events) = &self.events {
            events.emit(CoreEvent::Auth(event)).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::OAuthConfig;
    use crate::types::TokenGrant;
    use bridge_traits::{HttpClient, HttpRequest, HttpResponse, SessionStateStore};
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct MockStateStore {
        records: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MockStateStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(HashMap::new()),
            })
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

    struct MockHttpClient {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockHttpClient {
        fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        async fn request_count(&self) -> usize {
            self.requests.lock().await.len()
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            self.requests.lock().await.push(request);
            self.responses.lock().await.pop_front().ok_or_else(|| {
                bridge_traits::BridgeError::OperationFailed("no response queued".to_string())
            })
        }
    }

    fn token_response() -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(r#"{"access_token":"refreshed","expires_in":3600}"#),
        }
    }

    fn failure_response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(r#"{"error":"invalid_grant"}"#),
        }
    }

    fn codec() -> CookieCodec {
        CookieCodec::new("test-secret-16-chars-min", false, Duration::from_secs(604_800))
    }

    fn resolver(http: Arc<MockHttpClient>) -> (SessionResolver, SessionStore) {
        let sessions = SessionStore::new(MockStateStore::new());
        let flow = SpotifyAuthFlow::new(
            OAuthConfig::spotify("id", "secret", "http://localhost/cb"),
            http,
        );
        (
            SessionResolver::new(sessions.clone(), flow, codec()),
            sessions,
        )
    }

    async fn seed_session(
        sessions: &SessionStore,
        expires_at: i64,
        refresh_token: Option<&str>,
    ) -> Session {
        let mut session = Session::new(
            "spotify-user".to_string(),
            "Listener".to_string(),
            TokenGrant {
                access_token: "stale".to_string(),
                refresh_token: refresh_token.map(|s| s.to_string()),
                expires_at,
            },
        );
        session.expires_at = expires_at;
        sessions.put(&session).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_unknown_session_id_resolves_to_none() {
        let (resolver, _) = resolver(MockHttpClient::new(vec![]));
        let result = resolver.resolve(&SessionId::generate()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_valid_session_returned_without_network() {
        let http = MockHttpClient::new(vec![]);
        let (resolver, sessions) = resolver(http.clone());
        let session = seed_session(&sessions, now_ms() + 60_000, Some("rt")).await;

        let resolved = resolver.resolve(&session.id).await.unwrap().unwrap();
        assert_eq!(resolved.access_token, "stale");
        assert_eq!(http.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed_and_persisted() {
        let http = MockHttpClient::new(vec![token_response()]);
        let (resolver, sessions) = resolver(http.clone());
        let session = seed_session(&sessions, now_ms() - 1_000, Some("rt")).await;

        let resolved = resolver.resolve(&session.id).await.unwrap().unwrap();
        assert_eq!(resolved.access_token, "refreshed");
        // Refresh response carried no rotated refresh token, old one kept
        assert_eq!(resolved.refresh_token.as_deref(), Some("rt"));

        let stored = sessions.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "refreshed");
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_token_is_cleared() {
        let http = MockHttpClient::new(vec![]);
        let (resolver, sessions) = resolver(http.clone());
        let session = seed_session(&sessions, now_ms() - 1_000, None).await;

        assert!(resolver.resolve(&session.id).await.unwrap().is_none());
        assert!(sessions.get(&session.id).await.unwrap().is_none());
        assert_eq!(http.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_session() {
        let http = MockHttpClient::new(vec![failure_response(400)]);
        let (resolver, sessions) = resolver(http);
        let session = seed_session(&sessions, now_ms() - 1_000, Some("revoked")).await;

        assert!(resolver.resolve(&session.id).await.unwrap().is_none());
        assert!(sessions.get(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_a_single_refresh() {
        let http = MockHttpClient::new(vec![token_response()]);
        let (resolver, sessions) = resolver(http.clone());
        let session = seed_session(&sessions, now_ms() - 1_000, Some("rt")).await;

        let resolver = Arc::new(resolver);
        let (a, b) = tokio::join!(resolver.resolve(&session.id), resolver.resolve(&session.id));

        assert_eq!(a.unwrap().unwrap().access_token, "refreshed");
        assert_eq!(b.unwrap().unwrap().access_token, "refreshed");
        assert_eq!(http.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_cookie_rejects_tampered_cookie() {
        let http = MockHttpClient::new(vec![]);
        let (resolver, sessions) = resolver(http);
        let session = seed_session(&sessions, now_ms() + 60_000, None).await;

        let good = format!("sdc_session={}", codec().encode(&session.id));
        assert!(resolver
            .resolve_cookie(Some(&good))
            .await
            .unwrap()
            .is_some());

        let bad = format!("sdc_session={}.forged", session.id);
        assert!(resolver.resolve_cookie(Some(&bad)).await.unwrap().is_none());
        assert!(resolver.resolve_cookie(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_establish_persists_and_emits_signed_in() {
        let http = MockHttpClient::new(vec![]);
        let (resolver, sessions) = resolver(http);
        let events = EventBus::new(10);
        let mut sub = events.subscribe();
        let resolver = resolver.with_events(events);

        let session = resolver
            .establish(AuthorizedUser {
                profile_id: "spotify-user".to_string(),
                display_name: "Listener".to_string(),
                tokens: TokenGrant::new("at".to_string(), Some("rt".to_string()), 3600),
            })
            .await
            .unwrap();

        assert!(sessions.get(&session.id).await.unwrap().is_some());
        let event = sub.recv().await.unwrap();
        assert!(matches!(
            event,
            CoreEvent::Auth(AuthEvent::SignedIn { .. })
        ));
    }

    #[tokio::test]
    async fn test_logout_deletes_session_and_emits_signed_out() {
        let http = MockHttpClient::new(vec![]);
        let (resolver, sessions) = resolver(http);
        let events = EventBus::new(10);
        let mut sub = events.subscribe();
        let resolver = resolver.with_events(events);

        let session = seed_session(&sessions, now_ms() + 60_000, None).await;
        resolver.logout(&session.id).await.unwrap();

        assert!(sessions.get(&session.id).await.unwrap().is_none());
        let event = sub.recv().await.unwrap();
        assert!(matches!(
            event,
            CoreEvent::Auth(AuthEvent::SignedOut { .. })
        ));
    }
}
