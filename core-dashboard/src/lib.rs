//! # Dashboard Core
//!
//! Interaction layer of the Spotify dashboard: hover-prefetch with
//! debounce and cancellation, the detail-panel state machine with focus
//! management, append-only list pagination, and the service assembly that
//! wires them to the auth and provider layers.
//!
//! ## Architecture
//!
//! - [`DashboardService`] - composition root built from a `DashboardConfig`
//! - [`PrefetchController`] - debounced, cancellable hover prefetch into a
//!   shared detail cache
//! - [`PanelController`] - Closed/Open panel state, focus trap, playlist
//!   track paging with stale-result dropping
//! - [`PaginatedAccumulator`] - append-only, deduplicated page accumulation
//! - [`EntityFetcher`] - seam between the controllers and the provider

pub mod accumulator;
pub mod cache;
pub mod entity;
pub mod error;
pub mod fetcher;
pub mod panel;
pub mod prefetch;
pub mod service;

pub use accumulator::PaginatedAccumulator;
pub use cache::DetailCache;
pub use entity::{EntityTarget, EntityType};
pub use error::{DashboardError, Result};
pub use fetcher::{EntityDetail, EntityFetcher, SpotifyEntityFetcher};
pub use panel::{LoadToken, PanelController, PanelState};
pub use prefetch::{PrefetchController, PrefetchPhase};
pub use service::DashboardService;
