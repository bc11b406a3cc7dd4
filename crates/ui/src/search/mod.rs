//! Address search bar.
//!
//! A debounced free-text lookup against the geocoder feeds a ranked
//! suggestion list; picking a suggestion pins the origin coordinates, and
//! submitting with a travel-time budget kicks off the reachability fetch.
//! At most one lookup timer is pending at any moment; each keystroke
//! cancels and replaces it, and stale lookup responses are discarded by
//! sequence number.

mod systems;
mod types;

#[cfg(test)]
mod tests;

pub use systems::{drive_search_debounce, poll_geocode_lookups, search_panel_ui};
pub use types::{PendingCoordinates, SearchState, DEBOUNCE_SECS};

use bevy::prelude::*;

use transit::TransitSet;

pub struct SearchPlugin;

impl Plugin for SearchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SearchState>().add_systems(
            Update,
            (
                systems::search_panel_ui,
                systems::drive_search_debounce,
                systems::poll_geocode_lookups,
            )
                .chain()
                .before(TransitSet::Network),
        );
    }
}
