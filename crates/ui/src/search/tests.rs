//! Tests for the search bar state machine. The debounce timer is driven
//! with explicit durations so timing is deterministic.

use std::time::Duration;

use transit::geocode::AddressCandidate;
use transit::isochrone::TimeBudget;

use super::types::{SearchState, DEBOUNCE_SECS};

fn edited(state: &mut SearchState, text: &str) {
    state.query = text.to_string();
    state.on_query_edited();
}

fn candidate() -> AddressCandidate {
    AddressCandidate {
        display_name: "Praça da Sé, São Paulo".to_string(),
        lat: -23.55052,
        lon: -46.633308,
    }
}

#[test]
fn default_state_is_idle() {
    let state = SearchState::default();
    assert!(state.query.is_empty());
    assert!(state.candidates.is_empty());
    assert!(!state.show_suggestions);
    assert!(!state.loading);
    assert!(state.selected.is_none());
    assert_eq!(state.tempo, TimeBudget::Thirty);
}

#[test]
fn blank_query_clears_immediately_and_schedules_nothing() {
    let mut state = SearchState::default();
    edited(&mut state, "sé");
    edited(&mut state, "   ");

    assert!(state.candidates.is_empty());
    assert!(!state.show_suggestions);
    // No quiet period ever elapses into a lookup.
    assert!(state.tick_debounce(Duration::from_secs(10)).is_none());
}

#[test]
fn burst_of_keystrokes_dispatches_one_lookup_with_final_text() {
    let mut state = SearchState::default();
    let step = Duration::from_millis(100);

    let mut dispatched = Vec::new();
    for text in ["a", "av", "av paulista"] {
        edited(&mut state, text);
        dispatched.extend(state.tick_debounce(step));
    }
    // Each keystroke replaced the timer; nothing fired during the burst.
    assert!(dispatched.is_empty());

    dispatched.extend(state.tick_debounce(Duration::from_secs_f32(DEBOUNCE_SECS)));
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].0, "av paulista");

    // The timer is spent: quiet time dispatches nothing further.
    assert!(state.tick_debounce(Duration::from_secs(1)).is_none());
}

#[test]
fn stale_lookup_completions_are_discarded() {
    let mut state = SearchState::default();

    edited(&mut state, "lapa");
    let (_, first) = state
        .tick_debounce(Duration::from_secs(1))
        .expect("first lookup fires");

    edited(&mut state, "lapa sp");
    let (_, second) = state
        .tick_debounce(Duration::from_secs(1))
        .expect("second lookup fires");

    assert!(second > first);
    assert!(!state.accepts_lookup(first));
    assert!(state.accepts_lookup(second));
}

#[test]
fn selection_pins_parsed_coordinates_and_closes_the_list() {
    let mut state = SearchState::default();
    edited(&mut state, "se");
    state.candidates = vec![candidate()];
    state.show_suggestions = true;

    state.select_candidate(&candidate());

    assert_eq!(state.query, "Praça da Sé, São Paulo");
    assert!(state.candidates.is_empty());
    assert!(!state.show_suggestions);
    let selected = state.selected.expect("coordinates pinned");
    assert_eq!(selected.latitude, -23.55052);
    assert_eq!(selected.longitude, -46.633308);
    // Selection is not a keystroke: no lookup gets scheduled from it.
    assert!(state.tick_debounce(Duration::from_secs(10)).is_none());
}

#[test]
fn submit_without_selection_is_a_silent_no_op() {
    let mut state = SearchState::default();
    state.show_suggestions = true;

    assert!(state.submission().is_none());
    // The only side effect is collapsing the suggestion list.
    assert!(!state.show_suggestions);
}

#[test]
fn submit_carries_selection_and_budget() {
    let mut state = SearchState::default();
    state.select_candidate(&candidate());
    state.tempo = TimeBudget::Fifteen;

    let submit = state.submission().expect("selection present");
    assert_eq!(submit.latitude, -23.55052);
    assert_eq!(submit.longitude, -46.633308);
    assert_eq!(submit.tempo.minutes(), 15);

    // Coordinates persist: submitting again still works.
    assert!(state.submission().is_some());
}
