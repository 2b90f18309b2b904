//! Hover Prefetch
//!
//! Hovering a card schedules a detail fetch behind a debounce window, so a
//! pointer sweeping across the grid costs nothing. The controller is an
//! explicit three-phase machine:
//!
//! ```text
//! Idle --schedule--> Pending --debounce elapsed--> InFlight --done--> Idle
//!        ^                |                            |
//!        +---- cancel ----+----------- cancel ---------+
//! ```
//!
//! `schedule` on a new target cancels whatever was pending or in flight;
//! `cancel` (pointer left, panel closed) is always safe to call. A fetch
//! that loses its cancellation race never writes to the cache. Results land
//! in the shared [`DetailCache`]; failures are logged and dropped, since
//! opening the panel will fetch on demand anyway.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::DetailCache;
use crate::entity::EntityTarget;
use crate::fetcher::EntityFetcher;

/// Observable controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchPhase {
    /// Nothing scheduled.
    Idle,
    /// A fetch is waiting out the debounce window.
    Pending,
    /// The fetch request is running.
    InFlight,
}

struct PrefetchState {
    phase: PrefetchPhase,
    target: Option<EntityTarget>,
    cancel: Option<CancellationToken>,
    generation: u64,
}

struct Inner {
    fetcher: Arc<dyn EntityFetcher>,
    cache: Arc<DetailCache>,
    debounce: Duration,
    state: Mutex<PrefetchState>,
}

/// Debounced, cancellable hover prefetcher.
///
/// Cheap to clone; clones share state. Must be used inside a tokio runtime.
#[derive(Clone)]
pub struct PrefetchController {
    inner: Arc<Inner>,
}

impl PrefetchController {
    pub fn new(
        fetcher: Arc<dyn EntityFetcher>,
        cache: Arc<DetailCache>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                cache,
                debounce,
                state: Mutex::new(PrefetchState {
                    phase: PrefetchPhase::Idle,
                    target: None,
                    cancel: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Schedule a prefetch for `target`, displacing any previous schedule.
    ///
    /// A target whose detail is already fresh in the cache is not scheduled
    /// at all.
    pub fn schedule(&self, target: EntityTarget) {
        if self.inner.cache.get_fresh(&target).is_some() {
            debug!(target = %target, "Detail already cached, prefetch skipped");
            self.cancel();
            return;
        }

        let token = CancellationToken::new();
        let generation = {
            let Ok(mut state) = self.inner.state.lock() else {
                return;
            };
            if let Some(previous) = state.cancel.take() {
                previous.cancel();
            }
            state.generation += 1;
            state.phase = PrefetchPhase::Pending;
            state.target = Some(target.clone());
            state.cancel = Some(token.clone());
            state.generation
        };

        debug!(target = %target, "Prefetch scheduled");
        let inner = self.inner.clone();
        tokio::spawn(async move {
            run_prefetch(inner, target, token, generation).await;
        });
    }

    /// Cancel whatever is pending or in flight. Safe to call in any phase.
    pub fn cancel(&self) {
        let Ok(mut state) = self.inner.state.lock() else {
            return;
        };
        if let Some(previous) = state.cancel.take() {
            previous.cancel();
        }
        state.generation += 1;
        state.phase = PrefetchPhase::Idle;
        state.target = None;
    }

    pub fn phase(&self) -> PrefetchPhase {
        self.inner
            .state
            .lock()
            .map(|s| s.phase)
            .unwrap_or(PrefetchPhase::Idle)
    }

    /// The target currently scheduled or in flight, if any.
    pub fn current_target(&self) -> Option<EntityTarget> {
        self.inner
            .state
            .lock()
            .ok()
            .and_then(|s| s.target.clone())
    }
}

impl std::fmt::Debug for PrefetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchController")
            .field("phase", &self.phase())
            .field("debounce", &self.inner.debounce)
            .finish()
    }
}

async fn run_prefetch(
    inner: Arc<Inner>,
    target: EntityTarget,
    token: CancellationToken,
    generation: u64,
) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(inner.debounce) => {}
    }

    {
        let Ok(mut state) = inner.state.lock() else {
            return;
        };
        if token.is_cancelled() || state.generation != generation {
            return;
        }
        state.phase = PrefetchPhase::InFlight;
    }

    let started = Instant::now();
    let result = tokio::select! {
        _ = token.cancelled() => None,
        result = inner.fetcher.fetch(&target) => Some(result),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Some(Ok(detail)) if !token.is_cancelled() => {
            inner.cache.insert(target.clone(), detail);
            debug!(target = %target, elapsed_ms, "Prefetch completed");
        }
        Some(Err(e)) => {
            // Panel open fetches on demand, so a failed prefetch is not an
            // error the user sees.
            warn!(target = %target, elapsed_ms, error = %e, "Prefetch failed");
        }
        _ => {}
    }

    if let Ok(mut state) = inner.state.lock() {
        if state.generation == generation {
            state.phase = PrefetchPhase::Idle;
            state.target = None;
            state.cancel = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::fetcher::EntityDetail;
    use async_trait::async_trait;
    use provider_spotify::Track;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn detail_for(target: &EntityTarget) -> EntityDetail {
        EntityDetail::Track(Track {
            id: target.id.clone(),
            name: format!("Track {}", target.id),
            artists: Vec::new(),
            album: None,
            duration_ms: None,
            popularity: None,
            explicit: false,
            preview_url: None,
        })
    }

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EntityFetcher for CountingFetcher {
        async fn fetch(&self, target: &EntityTarget) -> Result<EntityDetail> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(detail_for(target))
        }
    }

    /// Fetcher that blocks until released, for observing the InFlight phase.
    struct GatedFetcher {
        calls: AtomicUsize,
        release: Notify,
    }

    impl GatedFetcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl EntityFetcher for GatedFetcher {
        async fn fetch(&self, target: &EntityTarget) -> Result<EntityDetail> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(detail_for(target))
        }
    }

    fn cache() -> Arc<DetailCache> {
        Arc::new(DetailCache::new(8, Duration::from_secs(60)))
    }

    const DEBOUNCE: Duration = Duration::from_millis(200);

    /// Let spawned prefetch tasks make progress.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_fires_after_debounce() {
        let fetcher = CountingFetcher::new();
        let cache = cache();
        let controller = PrefetchController::new(fetcher.clone(), cache.clone(), DEBOUNCE);

        let target = EntityTarget::track("t1");
        controller.schedule(target.clone());
        assert_eq!(controller.phase(), PrefetchPhase::Pending);

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
        settle().await;

        assert_eq!(fetcher.calls(), 1);
        assert!(cache.get_fresh(&target).is_some());
        assert_eq!(controller.phase(), PrefetchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_debounce_fetches_nothing() {
        let fetcher = CountingFetcher::new();
        let cache = cache();
        let controller = PrefetchController::new(fetcher.clone(), cache.clone(), DEBOUNCE);

        controller.schedule(EntityTarget::track("t1"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        settle().await;

        assert_eq!(fetcher.calls(), 0);
        assert!(cache.is_empty());
        assert_eq!(controller.phase(), PrefetchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_within_debounce_fetches_only_latest() {
        let fetcher = CountingFetcher::new();
        let cache = cache();
        let controller = PrefetchController::new(fetcher.clone(), cache.clone(), DEBOUNCE);

        controller.schedule(EntityTarget::track("t1"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.schedule(EntityTarget::track("t2"));

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
        settle().await;

        assert_eq!(fetcher.calls(), 1);
        assert!(cache.get_fresh(&EntityTarget::track("t1")).is_none());
        assert!(cache.get_fresh(&EntityTarget::track("t2")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_short_circuits_scheduling() {
        let fetcher = CountingFetcher::new();
        let cache = cache();
        let controller = PrefetchController::new(fetcher.clone(), cache.clone(), DEBOUNCE);

        let target = EntityTarget::track("t1");
        cache.insert(target.clone(), detail_for(&target));

        controller.schedule(target);
        assert_eq!(controller.phase(), PrefetchPhase::Idle);

        tokio::time::sleep(DEBOUNCE * 2).await;
        settle().await;
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_transitions_through_in_flight() {
        let fetcher = GatedFetcher::new();
        let cache = cache();
        let controller = PrefetchController::new(fetcher.clone(), cache.clone(), DEBOUNCE);

        let target = EntityTarget::track("t1");
        controller.schedule(target.clone());
        assert_eq!(controller.phase(), PrefetchPhase::Pending);

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;
        settle().await;
        assert_eq!(controller.phase(), PrefetchPhase::InFlight);

        fetcher.release.notify_one();
        settle().await;
        assert_eq!(controller.phase(), PrefetchPhase::Idle);
        assert!(cache.get_fresh(&target).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_in_flight_discards_result() {
        let fetcher = GatedFetcher::new();
        let cache = cache();
        let controller = PrefetchController::new(fetcher.clone(), cache.clone(), DEBOUNCE);

        controller.schedule(EntityTarget::track("t1"));
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;
        settle().await;
        assert_eq!(controller.phase(), PrefetchPhase::InFlight);

        controller.cancel();
        fetcher.release.notify_one();
        settle().await;

        assert!(cache.is_empty());
        assert_eq!(controller.phase(), PrefetchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_when_idle_is_a_no_op() {
        let fetcher = CountingFetcher::new();
        let controller = PrefetchController::new(fetcher.clone(), cache(), DEBOUNCE);

        controller.cancel();
        controller.cancel();
        assert_eq!(controller.phase(), PrefetchPhase::Idle);
    }
}
