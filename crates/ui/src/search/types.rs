//! State for the search bar: query text, suggestion list, the pending
//! debounce timer, and the coordinates pinned by the last selection.

use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::Task;

use transit::geocode::AddressCandidate;
use transit::isochrone::{SubmitIsochrone, TimeBudget};

/// Quiet period between the last keystroke and the geocode lookup.
pub const DEBOUNCE_SECS: f32 = 0.3;

/// Coordinates pinned by selecting a suggestion. They persist across
/// submits until the next selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// In-flight geocode lookup, tagged with its dispatch sequence number.
#[derive(Component)]
pub struct GeocodeLookup {
    pub id: u64,
    pub task: Task<Result<Vec<AddressCandidate>, String>>,
}

#[derive(Resource, Default)]
pub struct SearchState {
    /// The visible query text.
    pub query: String,
    /// Previous frame's text, to detect edits.
    pub(crate) prev_query: String,
    /// Ranked suggestions for the current query.
    pub candidates: Vec<AddressCandidate>,
    /// Whether the suggestion list is open.
    pub show_suggestions: bool,
    /// A lookup was dispatched and has not resolved yet.
    pub loading: bool,
    /// Origin pinned by the last selection, if any.
    pub selected: Option<PendingCoordinates>,
    /// Travel-time budget for the next submit.
    pub tempo: TimeBudget,
    /// The single pending debounce timer; a new edit replaces it.
    pub(crate) pending_lookup: Option<Timer>,
    /// Sequence number of the newest dispatched lookup. Older completions
    /// are discarded so a slow early response cannot overwrite a fresh one.
    pub(crate) newest_lookup: u64,
}

impl SearchState {
    /// Process an edit of the query text. Empty (after trimming) clears the
    /// suggestions right away and schedules nothing; anything else arms the
    /// debounce timer, cancelling a previously scheduled lookup.
    pub fn on_query_edited(&mut self) {
        if self.query == self.prev_query {
            return;
        }
        self.prev_query = self.query.clone();

        if self.query.trim().is_empty() {
            self.candidates.clear();
            self.loading = false;
            self.show_suggestions = false;
            self.pending_lookup = None;
        } else {
            self.pending_lookup = Some(Timer::from_seconds(DEBOUNCE_SECS, TimerMode::Once));
            self.show_suggestions = true;
        }
    }

    /// Advance the debounce timer. When the quiet period elapses, returns
    /// the query to look up together with its sequence number.
    pub fn tick_debounce(&mut self, delta: Duration) -> Option<(String, u64)> {
        let timer = self.pending_lookup.as_mut()?;
        timer.tick(delta);
        if !timer.finished() {
            return None;
        }
        self.pending_lookup = None;
        self.newest_lookup += 1;
        self.loading = true;
        Some((self.query.clone(), self.newest_lookup))
    }

    /// Whether a completed lookup is still the newest one dispatched.
    pub fn accepts_lookup(&self, id: u64) -> bool {
        id >= self.newest_lookup
    }

    /// Pin a suggestion: its name becomes the query text, the list closes,
    /// and the coordinates wait for the next submit. No lookup is
    /// scheduled — this is a selection, not a keystroke.
    pub fn select_candidate(&mut self, candidate: &AddressCandidate) {
        self.query = candidate.display_name.clone();
        self.prev_query = self.query.clone();
        self.pending_lookup = None;
        self.candidates.clear();
        self.show_suggestions = false;
        self.loading = false;
        self.selected = Some(PendingCoordinates {
            latitude: candidate.lat,
            longitude: candidate.lon,
        });
    }

    /// Reopen the suggestion list when the field regains focus with text.
    pub fn on_focus_gained(&mut self) {
        if !self.query.trim().is_empty() {
            self.show_suggestions = true;
        }
    }

    /// Build the submit event, collapsing the suggestion list either way.
    /// Returns `None` (a silent no-op) when no candidate was selected yet.
    pub fn submission(&mut self) -> Option<SubmitIsochrone> {
        self.show_suggestions = false;
        let selected = self.selected.as_ref()?;
        Some(SubmitIsochrone {
            latitude: selected.latitude,
            longitude: selected.longitude,
            tempo: self.tempo,
        })
    }
}
