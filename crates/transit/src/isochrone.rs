//! Isochrone fetch orchestration.
//!
//! A submit synchronously moves the focal position (optimistic recenter,
//! before any network round trip completes) and spawns a single POST task.
//! On success the returned collection replaces the previous one wholesale
//! and the generation counter is bumped so the render layer rebuilds from
//! scratch. On failure the previous collection stays on screen untouched;
//! the warning log is the only indicator. One attempt per submit, no retry.

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};
use serde::Serialize;

use crate::config::BackendConfig;
use crate::geojson::FeatureCollection;
use crate::position::FocalPosition;

/// Travel-time budget in minutes. The backend accepts exactly these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBudget {
    Five,
    Fifteen,
    #[default]
    Thirty,
}

impl TimeBudget {
    pub const ALL: [TimeBudget; 3] = [TimeBudget::Five, TimeBudget::Fifteen, TimeBudget::Thirty];

    pub fn minutes(self) -> u32 {
        match self {
            TimeBudget::Five => 5,
            TimeBudget::Fifteen => 15,
            TimeBudget::Thirty => 30,
        }
    }

    pub fn label(self) -> String {
        format!("{} min", self.minutes())
    }
}

/// Wire body of the reachability request. Field order is the wire contract.
#[derive(Debug, Serialize)]
pub struct IsochroneRequest {
    pub lat: f64,
    pub lon: f64,
    pub tempo: u32,
}

/// Emitted by the search bar when the user confirms a selected address and
/// time budget.
#[derive(Event, Debug, Clone)]
pub struct SubmitIsochrone {
    pub latitude: f64,
    pub longitude: f64,
    pub tempo: TimeBudget,
}

/// Last successfully fetched collection plus a generation marker. Consumers
/// compare generations instead of diffing features: any change means "tear
/// everything down and rebuild".
#[derive(Resource, Debug, Default)]
pub struct IsochroneState {
    pub collection: Option<FeatureCollection>,
    pub generation: u64,
}

impl IsochroneState {
    pub fn replace(&mut self, collection: FeatureCollection) {
        self.collection = Some(collection);
        self.generation += 1;
    }
}

/// In-flight reachability fetch, owned by a transient entity.
#[derive(Component)]
pub struct IsochroneFetch {
    task: Task<Result<FeatureCollection, String>>,
}

/// One blocking POST to the reachability backend.
pub fn fetch_isochrone(
    config: &BackendConfig,
    request: &IsochroneRequest,
) -> Result<FeatureCollection, String> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .post(&config.isochrone_url)
        .json(request)
        .send()
        .map_err(|err| format!("request error: {err}"))?;

    if !response.status().is_success() {
        return Err(format!("backend responded with {}", response.status()));
    }

    response
        .json()
        .map_err(|err| format!("failed to decode reachability response: {err}"))
}

/// Commit the optimistic position update and dispatch the fetch task.
pub fn handle_submit(
    mut submits: EventReader<SubmitIsochrone>,
    mut focal: ResMut<FocalPosition>,
    config: Res<BackendConfig>,
    mut commands: Commands,
) {
    for submit in submits.read() {
        focal.update_position(submit.latitude, submit.longitude);

        let request = IsochroneRequest {
            lat: submit.latitude,
            lon: submit.longitude,
            tempo: submit.tempo.minutes(),
        };
        info!(
            "requesting {} min reachability around ({:.5}, {:.5})",
            request.tempo, request.lat, request.lon
        );

        let config = config.clone();
        let task = IoTaskPool::get().spawn(async move { fetch_isochrone(&config, &request) });
        commands.spawn(IsochroneFetch { task });
    }
}

/// Poll in-flight fetches. Completions replace the collection wholesale; a
/// response that lands after a newer submit is still applied as-is — the
/// wholesale replacement keeps the screen consistent either way.
pub fn poll_isochrone_fetches(
    mut commands: Commands,
    mut fetches: Query<(Entity, &mut IsochroneFetch)>,
    mut state: ResMut<IsochroneState>,
) {
    for (entity, mut fetch) in &mut fetches {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut fetch.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        match result {
            Ok(collection) => {
                info!(
                    "reachability update: {} feature(s)",
                    collection.features.len()
                );
                state.replace(collection);
            }
            Err(err) => {
                // Previous isochrone stays on screen; the log is the only
                // failure indicator.
                warn!("reachability fetch failed: {err}");
            }
        }
    }
}
