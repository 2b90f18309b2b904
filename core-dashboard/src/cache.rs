//! Entity detail cache.
//!
//! LRU over [`EntityDetail`] keyed by target, with a freshness window. A
//! fresh hit lets the panel open instantly after a hover prefetch; a stale
//! entry is treated as a miss (but not evicted, the next insert overwrites).

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::entity::EntityTarget;
use crate::fetcher::EntityDetail;

struct CacheEntry {
    detail: EntityDetail,
    fetched_at: Instant,
}

/// Shared, thread-safe detail cache.
pub struct DetailCache {
    entries: Mutex<LruCache<EntityTarget, CacheEntry>>,
    fresh_for: Duration,
}

impl DetailCache {
    /// # Panics
    ///
    /// Panics if `capacity` is zero; `DashboardConfig` validation rejects
    /// that before construction.
    pub fn new(capacity: usize, fresh_for: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("cache capacity must be non-zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            fresh_for,
        }
    }

    /// Look up a target, returning the detail only if still fresh.
    pub fn get_fresh(&self, target: &EntityTarget) -> Option<EntityDetail> {
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get(target)?;
        if entry.fetched_at.elapsed() < self.fresh_for {
            Some(entry.detail.clone())
        } else {
            None
        }
    }

    /// Insert or overwrite the detail for a target.
    pub fn insert(&self, target: EntityTarget, detail: EntityDetail) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                target,
                CacheEntry {
                    detail,
                    fetched_at: Instant::now(),
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for DetailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailCache")
            .field("len", &self.len())
            .field("fresh_for", &self.fresh_for)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_spotify::Track;

    fn track_detail(id: &str) -> EntityDetail {
        EntityDetail::Track(Track {
            id: id.to_string(),
            name: format!("Track {}", id),
            artists: Vec::new(),
            album: None,
            duration_ms: None,
            popularity: None,
            explicit: false,
            preview_url: None,
        })
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = DetailCache::new(4, Duration::from_secs(60));
        let target = EntityTarget::track("t1");

        cache.insert(target.clone(), track_detail("t1"));
        let hit = cache.get_fresh(&target).unwrap();
        assert_eq!(hit.id(), "t1");
    }

    #[test]
    fn test_stale_entry_is_a_miss() {
        let cache = DetailCache::new(4, Duration::ZERO);
        let target = EntityTarget::track("t1");

        cache.insert(target.clone(), track_detail("t1"));
        assert!(cache.get_fresh(&target).is_none());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = DetailCache::new(2, Duration::from_secs(60));
        cache.insert(EntityTarget::track("t1"), track_detail("t1"));
        cache.insert(EntityTarget::track("t2"), track_detail("t2"));
        cache.insert(EntityTarget::track("t3"), track_detail("t3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get_fresh(&EntityTarget::track("t1")).is_none());
        assert!(cache.get_fresh(&EntityTarget::track("t3")).is_some());
    }

    #[test]
    fn test_same_id_different_entity_kind_are_distinct_keys() {
        let cache = DetailCache::new(4, Duration::from_secs(60));
        cache.insert(EntityTarget::track("x"), track_detail("x"));

        assert!(cache.get_fresh(&EntityTarget::album("x")).is_none());
        assert!(cache.get_fresh(&EntityTarget::track("x")).is_some());
    }
}
