//! Systems for the search bar: the egui panel, debounce handling, and
//! lookup task polling.

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool};
use bevy_egui::{egui, EguiContexts};

use transit::config::BackendConfig;
use transit::geocode::{search_addresses, AddressCandidate};
use transit::isochrone::{SubmitIsochrone, TimeBudget};

use super::types::{GeocodeLookup, SearchState};

/// Render the search bar: time-budget dropdown, address field, submit
/// button, and the suggestion list underneath.
pub fn search_panel_ui(
    mut contexts: EguiContexts,
    mut state: ResMut<SearchState>,
    mut submits: EventWriter<SubmitIsochrone>,
) {
    let ctx = contexts.ctx_mut();
    egui::TopBottomPanel::top("search_bar").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.heading("Até Onde Posso Ir?");
            ui.separator();

            egui::ComboBox::from_id_salt("tempo")
                .selected_text(state.tempo.label())
                .show_ui(ui, |ui| {
                    for budget in TimeBudget::ALL {
                        let label = budget.label();
                        ui.selectable_value(&mut state.tempo, budget, label);
                    }
                });

            let response = ui.add(
                egui::TextEdit::singleline(&mut state.query)
                    .hint_text("Digite um endereço ou local...")
                    .desired_width(360.0),
            );
            if response.gained_focus() {
                state.on_focus_gained();
            }

            let submitted = ui.button("Buscar").clicked()
                || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)));
            if submitted {
                if let Some(submit) = state.submission() {
                    submits.send(submit);
                }
            }
        });

        if state.show_suggestions && (state.loading || !state.candidates.is_empty()) {
            ui.add_space(2.0);
            if state.loading {
                ui.label("Carregando...");
            } else {
                let mut chosen: Option<AddressCandidate> = None;
                for candidate in &state.candidates {
                    if ui
                        .selectable_label(false, &candidate.display_name)
                        .clicked()
                    {
                        chosen = Some(candidate.clone());
                    }
                }
                if let Some(candidate) = chosen {
                    state.select_candidate(&candidate);
                }
            }
        }
        ui.add_space(4.0);
    });

    // Clicking anywhere outside the bar closes the suggestion list.
    if state.show_suggestions
        && ctx.input(|i| i.pointer.any_pressed())
        && !ctx.is_pointer_over_area()
    {
        state.show_suggestions = false;
    }
}

/// Detect query edits and dispatch the lookup once the quiet period
/// elapses.
pub fn drive_search_debounce(
    time: Res<Time>,
    config: Res<BackendConfig>,
    mut state: ResMut<SearchState>,
    mut commands: Commands,
) {
    state.on_query_edited();
    if let Some((query, id)) = state.tick_debounce(time.delta()) {
        let config = config.clone();
        let task = IoTaskPool::get().spawn(async move { search_addresses(&config, &query) });
        commands.spawn(GeocodeLookup { id, task });
    }
}

/// Poll in-flight lookups. A completion that is no longer the newest
/// dispatched lookup is dropped; failures clear the list and are logged,
/// never surfaced.
pub fn poll_geocode_lookups(
    mut commands: Commands,
    mut lookups: Query<(Entity, &mut GeocodeLookup)>,
    mut state: ResMut<SearchState>,
) {
    for (entity, mut lookup) in &mut lookups {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut lookup.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !state.accepts_lookup(lookup.id) {
            continue;
        }
        state.loading = false;
        match result {
            Ok(candidates) => state.candidates = candidates,
            Err(err) => {
                warn!("address lookup failed: {err}");
                state.candidates.clear();
            }
        }
    }
}
