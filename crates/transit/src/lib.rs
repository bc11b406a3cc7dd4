//! Domain crate for the reachability viewer: the shared focal position,
//! the GeoJSON payload model, the geocoding and isochrone backend clients,
//! and the optional one-shot startup geolocation.
//!
//! All network calls run as `IoTaskPool` tasks owned by marker entities and
//! are polled from `Update` systems; nothing here blocks the frame loop.

use bevy::prelude::*;

pub mod config;
pub mod geocode;
pub mod geojson;
pub mod geolocate;
pub mod isochrone;
pub mod position;

/// System sets for the network-facing half of the app. Rendering and UI
/// order themselves around `Network` so a frame that completes a fetch also
/// sees its result.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TransitSet {
    Network,
}

pub struct TransitPlugin;

impl Plugin for TransitPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::BackendConfig>()
            .init_resource::<position::FocalPosition>()
            .init_resource::<isochrone::IsochroneState>()
            .add_event::<isochrone::SubmitIsochrone>()
            .add_systems(Startup, geolocate::request_initial_fix)
            .add_systems(
                Update,
                (
                    isochrone::handle_submit,
                    isochrone::poll_isochrone_fetches,
                    geolocate::poll_initial_fix,
                )
                    .chain()
                    .in_set(TransitSet::Network),
            );
    }
}
