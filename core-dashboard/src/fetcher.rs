//! Entity detail fetching.
//!
//! [`EntityFetcher`] is the seam between the prefetch/panel machinery and
//! the provider: controllers depend on the trait, production code injects
//! [`SpotifyEntityFetcher`], tests inject counting or gated fakes.

use async_trait::async_trait;
use core_auth::{SessionId, SessionResolver};
use provider_spotify::{Album, Artist, Playlist, SpotifyClient, Track};
use std::sync::Arc;

use crate::entity::{EntityTarget, EntityType};
use crate::error::{DashboardError, Result};

/// Fully-loaded detail for one entity.
#[derive(Debug, Clone)]
pub enum EntityDetail {
    Track(Track),
    Artist(Artist),
    Album(Album),
    Playlist(Playlist),
}

impl EntityDetail {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityDetail::Track(_) => EntityType::Track,
            EntityDetail::Artist(_) => EntityType::Artist,
            EntityDetail::Album(_) => EntityType::Album,
            EntityDetail::Playlist(_) => EntityType::Playlist,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityDetail::Track(t) => &t.id,
            EntityDetail::Artist(a) => &a.id,
            EntityDetail::Album(a) => &a.id,
            EntityDetail::Playlist(p) => &p.id,
        }
    }
}

/// Loads the detail for a target entity.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch(&self, target: &EntityTarget) -> Result<EntityDetail>;
}

/// Production fetcher: resolves the session for a token, then hits the
/// matching detail endpoint.
pub struct SpotifyEntityFetcher {
    client: SpotifyClient,
    resolver: Arc<SessionResolver>,
    session_id: SessionId,
}

impl SpotifyEntityFetcher {
    pub fn new(client: SpotifyClient, resolver: Arc<SessionResolver>, session_id: SessionId) -> Self {
        Self {
            client,
            resolver,
            session_id,
        }
    }
}

#[async_trait]
impl EntityFetcher for SpotifyEntityFetcher {
    async fn fetch(&self, target: &EntityTarget) -> Result<EntityDetail> {
        let session = self
            .resolver
            .resolve(&self.session_id)
            .await?
            .ok_or(DashboardError::NotSignedIn)?;
        let token = session.access_token;

        let detail = match target.entity {
            EntityType::Track => EntityDetail::Track(self.client.track(&token, &target.id).await?),
            EntityType::Artist => {
                EntityDetail::Artist(self.client.artist(&token, &target.id).await?)
            }
            EntityType::Album => EntityDetail::Album(self.client.album(&token, &target.id).await?),
            EntityType::Playlist => {
                EntityDetail::Playlist(self.client.playlist(&token, &target.id).await?)
            }
        };
        Ok(detail)
    }
}
