//! Dashboard service assembly.
//!
//! [`DashboardService`] wires the configured capabilities into the auth
//! resolver, provider client, detail cache, and controller factories. It is
//! the single construction point a host embeds; everything below it takes
//! its dependencies through constructors.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use core_auth::{
    handle_callback, CallbackOutcome, CallbackParams, CookieCodec, OAuthConfig, SessionId,
    SessionResolver, SessionStore, SpotifyAuthFlow,
};
use core_runtime::config::DashboardConfig;
use core_runtime::events::EventBus;
use provider_spotify::SpotifyClient;

use crate::cache::DetailCache;
use crate::fetcher::SpotifyEntityFetcher;
use crate::panel::PanelController;
use crate::prefetch::PrefetchController;

/// Assembled dashboard core.
///
/// Holds the long-lived pieces (resolver, provider client, detail cache,
/// event bus) and hands out per-session or per-view controllers.
pub struct DashboardService {
    resolver: Arc<SessionResolver>,
    client: SpotifyClient,
    cache: Arc<DetailCache>,
    events: EventBus,
    prefetch_debounce: Duration,
}

impl DashboardService {
    /// Build the service from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(config: DashboardConfig) -> core_runtime::Result<Self> {
        config.validate()?;

        let events = EventBus::default();

        let mut oauth = OAuthConfig::spotify(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
        );
        if !config.scopes.is_empty() {
            oauth = oauth.with_scopes(config.scopes.clone());
        }

        let flow = SpotifyAuthFlow::new(oauth, Arc::clone(&config.http_client));
        let sessions = SessionStore::new(Arc::clone(&config.session_store));
        let codec = CookieCodec::new(
            config.session_secret.clone(),
            config.cookie_secure,
            config.cookie_max_age,
        );

        let resolver = Arc::new(
            SessionResolver::new(sessions, flow, codec).with_events(events.clone()),
        );
        let client = SpotifyClient::new(Arc::clone(&config.http_client));
        let cache = Arc::new(DetailCache::new(
            config.detail_cache_capacity,
            config.detail_fresh_for,
        ));

        info!(
            redirect_uri = %config.redirect_uri,
            cookie_secure = config.cookie_secure,
            "Dashboard service initialized"
        );

        Ok(Self {
            resolver,
            client,
            cache,
            events,
            prefetch_debounce: config.prefetch_debounce,
        })
    }

    pub fn resolver(&self) -> &Arc<SessionResolver> {
        &self.resolver
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<DetailCache> {
        &self.cache
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// URL to redirect the user to for Spotify consent.
    pub fn authorization_url(&self) -> core_auth::Result<String> {
        self.resolver.auth_flow().authorization_url()
    }

    /// Handle the OAuth redirect callback.
    pub async fn handle_callback(&self, params: CallbackParams) -> CallbackOutcome {
        handle_callback(&self.resolver, params).await
    }

    /// Clear a session and produce the cookie-clearing header value.
    pub async fn logout(&self, session_id: &SessionId) -> core_auth::Result<String> {
        self.resolver.logout(session_id).await?;
        Ok(self.resolver.cookie_codec().clear_cookie_header())
    }

    /// Prefetch controller bound to one signed-in session.
    ///
    /// Controllers are cheap to clone and share the service-wide detail
    /// cache, so a prefetch from any view warms the panel for all of them.
    pub fn prefetch_controller(&self, session_id: SessionId) -> PrefetchController {
        let fetcher = SpotifyEntityFetcher::new(
            self.client.clone(),
            Arc::clone(&self.resolver),
            session_id,
        );
        PrefetchController::new(Arc::new(fetcher), Arc::clone(&self.cache), self.prefetch_debounce)
    }

    /// Fresh detail-panel controller wired to the service event bus.
    pub fn panel_controller(&self) -> PanelController {
        PanelController::new().with_events(self.events.clone())
    }
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService")
            .field("cache", &self.cache)
            .field("prefetch_debounce", &self.prefetch_debounce)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::{BridgeError, HttpClient, SessionStateStore};

    struct UnreachableHttpClient;

    #[async_trait]
    impl HttpClient for UnreachableHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(BridgeError::OperationFailed("no network in test".to_string()))
        }
    }

    struct EmptySessionStore;

    #[async_trait]
    impl SessionStateStore for EmptySessionStore {
        async fn put_record(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_record(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn delete_record(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn test_config() -> DashboardConfig {
        DashboardConfig::builder()
            .client_id("client-id")
            .client_secret("client-secret")
            .redirect_uri("http://localhost:3000/auth/spotify/callback")
            .session_secret("0123456789abcdef")
            .http_client(Arc::new(UnreachableHttpClient))
            .session_store(Arc::new(EmptySessionStore))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_service_assembles_from_config() {
        let service = DashboardService::new(test_config()).unwrap();

        assert!(service.cache().is_empty());
        assert_eq!(service.events().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_authorization_url_carries_client_id() {
        let service = DashboardService::new(test_config()).unwrap();
        let url = service.authorization_url().unwrap();

        assert!(url.starts_with("https://accounts.spotify.com/authorize"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn test_custom_scopes_reach_authorization_url() {
        let config = DashboardConfig::builder()
            .client_id("client-id")
            .client_secret("client-secret")
            .redirect_uri("http://localhost:3000/auth/spotify/callback")
            .session_secret("0123456789abcdef")
            .scopes(["user-top-read"])
            .http_client(Arc::new(UnreachableHttpClient))
            .session_store(Arc::new(EmptySessionStore))
            .build()
            .unwrap();

        let service = DashboardService::new(config).unwrap();
        let url = service.authorization_url().unwrap();

        assert!(url.contains("scope=user-top-read"));
        assert!(!url.contains("user-read-email"));
    }

    #[tokio::test]
    async fn test_logout_of_unknown_session_still_clears_cookie() {
        let service = DashboardService::new(test_config()).unwrap();
        let header = service
            .logout(&SessionId::from_string("missing"))
            .await
            .unwrap();

        assert!(header.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_controllers_share_the_detail_cache() {
        let service = DashboardService::new(test_config()).unwrap();
        let a = service.prefetch_controller(SessionId::from_string("s1"));
        let b = service.prefetch_controller(SessionId::from_string("s2"));

        // Both bound to the same cache instance
        drop((a, b));
        assert!(service.cache().is_empty());
    }
}
