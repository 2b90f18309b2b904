//! Detail Panel State Machine
//!
//! The slide-over panel is either `Closed` or `Open` on one entity.
//! Selecting another entity while open retargets in place; the panel never
//! passes through `Closed` on the way, so the host can animate the swap
//! instead of a close/open flicker.
//!
//! The controller also owns the two concerns tied to the panel's lifetime:
//!
//! - **Focus**: the id of the element focused before opening is kept and
//!   handed back on close; while open, Tab cycles through the registered
//!   focusable ids in both directions and focus that escaped the panel is
//!   recaptured.
//! - **Playlist paging**: an append-only accumulator for the open
//!   playlist's tracks. Every open/retarget/close bumps a generation
//!   counter; a page load begun under an older generation is dropped when
//!   it arrives, so late results never leak into the wrong entity.

use provider_spotify::PlaylistItem;
use tracing::debug;

use core_runtime::events::{CoreEvent, PanelEvent};
use core_runtime::EventBus;

use crate::accumulator::PaginatedAccumulator;
use crate::entity::{EntityTarget, EntityType};

/// Panel position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open { target: EntityTarget },
}

/// Ticket for an in-flight "load more" request.
///
/// Pass it back to [`PanelController::apply_tracks_page`]; a token issued
/// before the panel moved on is rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken {
    generation: u64,
}

/// State machine for the detail panel.
///
/// Not shared across threads; the host drives it from its UI task.
pub struct PanelController {
    state: PanelState,
    generation: u64,
    restore_focus_id: Option<String>,
    focusables: Vec<String>,
    focused: Option<String>,
    tracks: PaginatedAccumulator<PlaylistItem>,
    events: Option<EventBus>,
}

impl PanelController {
    pub fn new() -> Self {
        Self {
            state: PanelState::Closed,
            generation: 0,
            restore_focus_id: None,
            focusables: Vec::new(),
            focused: None,
            tracks: PaginatedAccumulator::new(),
            events: None,
        }
    }

    /// Attach an event bus for panel lifecycle events.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PanelState::Open { .. })
    }

    pub fn target(&self) -> Option<&EntityTarget> {
        match &self.state {
            PanelState::Open { target } => Some(target),
            PanelState::Closed => None,
        }
    }

    /// Open the panel on `target`.
    ///
    /// `previously_focused` is the id of the element that held focus before
    /// the panel took over; it is returned by [`close`](Self::close) so the
    /// host can restore it. Opening while already open behaves like
    /// [`retarget`](Self::retarget).
    pub fn open(&mut self, target: EntityTarget, previously_focused: Option<String>) {
        if self.is_open() {
            self.retarget(target);
            return;
        }

        self.generation += 1;
        self.restore_focus_id = previously_focused;
        self.tracks.reset();
        debug!(target = %target, "Panel opened");
        self.emit(PanelEvent::Opened {
            entity_type: target.entity.as_str().to_string(),
            entity_id: target.id.clone(),
        });
        self.state = PanelState::Open { target };
    }

    /// Switch the open panel to another entity without closing.
    ///
    /// The saved focus-restore id is kept from the original open. Calling
    /// this while closed opens the panel instead.
    pub fn retarget(&mut self, target: EntityTarget) {
        let PanelState::Open { target: current } = &self.state else {
            self.open(target, None);
            return;
        };

        if *current == target {
            return;
        }

        self.generation += 1;
        self.tracks.reset();
        debug!(target = %target, "Panel retargeted");
        self.emit(PanelEvent::Retargeted {
            entity_type: target.entity.as_str().to_string(),
            entity_id: target.id.clone(),
        });
        self.state = PanelState::Open { target };
    }

    /// Close the panel.
    ///
    /// Returns the id of the element that should regain focus. Closing an
    /// already-closed panel is a no-op returning `None`.
    pub fn close(&mut self) -> Option<String> {
        if !self.is_open() {
            return None;
        }

        self.generation += 1;
        self.state = PanelState::Closed;
        self.tracks.reset();
        self.focusables.clear();
        self.focused = None;
        debug!("Panel closed");
        self.emit(PanelEvent::Closed);
        self.restore_focus_id.take()
    }

    /// Escape key: close.
    pub fn handle_escape(&mut self) -> Option<String> {
        self.close()
    }

    /// Backdrop click: close.
    pub fn handle_backdrop_click(&mut self) -> Option<String> {
        self.close()
    }

    // --- focus trap ---

    /// Register the focusable element ids inside the panel, in DOM order.
    ///
    /// Initial focus goes to the first id unless focus is already on a
    /// registered element.
    pub fn set_focusables(&mut self, ids: Vec<String>) {
        self.focusables = ids;
        let valid = self
            .focused
            .as_ref()
            .is_some_and(|f| self.focusables.contains(f));
        if !valid {
            self.focused = self.focusables.first().cloned();
        }
    }

    pub fn current_focus(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Move focus one step, wrapping at either end.
    ///
    /// `backward` corresponds to Shift+Tab. Focus that escaped the
    /// registered set is recaptured to the first element.
    pub fn focus_next(&mut self, backward: bool) -> Option<&str> {
        if self.focusables.is_empty() {
            self.focused = None;
            return None;
        }

        let position = self
            .focused
            .as_ref()
            .and_then(|f| self.focusables.iter().position(|id| id == f));

        let next = match position {
            None => 0,
            Some(i) if backward => (i + self.focusables.len() - 1) % self.focusables.len(),
            Some(i) => (i + 1) % self.focusables.len(),
        };

        self.focused = Some(self.focusables[next].clone());
        self.focused.as_deref()
    }

    /// Report that focus landed outside the panel; recaptures to the first
    /// focusable.
    pub fn focus_escaped(&mut self) -> Option<&str> {
        self.focused = None;
        self.focus_next(false)
    }

    // --- playlist track paging ---

    /// Accumulated playlist tracks for the open playlist.
    pub fn tracks(&self) -> &[PlaylistItem] {
        self.tracks.items()
    }

    pub fn tracks_next_offset(&self) -> u32 {
        self.tracks.next_offset()
    }

    pub fn tracks_has_more(&self) -> bool {
        self.tracks.has_more()
    }

    /// Begin a "load more" for the open playlist's tracks.
    ///
    /// Returns `None` unless the panel is open on a playlist with more
    /// tracks to load.
    pub fn begin_load_more(&self) -> Option<LoadToken> {
        match &self.state {
            PanelState::Open { target }
                if target.entity == EntityType::Playlist && self.tracks.has_more() =>
            {
                Some(LoadToken {
                    generation: self.generation,
                })
            }
            _ => None,
        }
    }

    /// Apply a fetched page of playlist tracks.
    ///
    /// Returns `false` (and changes nothing) when the token is stale, that
    /// is when the panel closed or retargeted since the load began.
    pub fn apply_tracks_page(
        &mut self,
        token: LoadToken,
        items: Vec<PlaylistItem>,
        total: u32,
    ) -> bool {
        if token.generation != self.generation {
            debug!("Dropping stale playlist page");
            return false;
        }
        self.tracks
            .append_page(items, total, |item| item.track.as_ref().map(|t| t.id.clone()));
        true
    }

    fn emit(&self, event: PanelEvent) {
        if let Some(events) = &self.events {
            events.emit(CoreEvent::Panel(event)).ok();
        }
    }
}

impl Default for PanelController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PanelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelController")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}
