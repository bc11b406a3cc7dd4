//! Address search against Nominatim.
//!
//! The search is scoped to Brazil and localized to pt-BR, matching the data
//! the reachability backend covers. Responses carry coordinates as decimal
//! strings; they are parsed to floats here, at the edge, so the rest of the
//! app only ever sees numeric coordinates.

use serde::Deserialize;

use crate::config::BackendConfig;

/// Maximum number of suggestions requested from and kept for the UI.
pub const MAX_CANDIDATES: usize = 5;

/// One ranked geocoding suggestion, ready for display and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressCandidate {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Raw Nominatim entry. `lat`/`lon` arrive as decimal strings.
#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl NominatimPlace {
    /// Parse the string coordinates. Entries that don't parse are dropped by
    /// the caller rather than surfaced as NaN.
    pub fn into_candidate(self) -> Option<AddressCandidate> {
        let lat = self.lat.trim().parse().ok()?;
        let lon = self.lon.trim().parse().ok()?;
        Some(AddressCandidate {
            display_name: self.display_name,
            lat,
            lon,
        })
    }
}

/// Map a Nominatim response to the candidate list: service rank preserved,
/// unparseable entries dropped, capped at `MAX_CANDIDATES`.
pub fn to_candidates(places: Vec<NominatimPlace>) -> Vec<AddressCandidate> {
    places
        .into_iter()
        .filter_map(NominatimPlace::into_candidate)
        .take(MAX_CANDIDATES)
        .collect()
}

/// Issue one blocking address-search call. Runs on an IO-pool task, never on
/// the frame loop. Any failure (transport, status, decode) comes back as a
/// formatted message for the caller to log; this function never panics.
pub fn search_addresses(
    config: &BackendConfig,
    query: &str,
) -> Result<Vec<AddressCandidate>, String> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(&config.nominatim_url)
        .query(&[
            ("format", "json"),
            ("q", query),
            ("limit", "5"),
            ("addressdetails", "1"),
            ("countrycodes", "br"),
            ("accept-language", "pt-BR"),
        ])
        .header("Accept-Language", "pt-BR")
        .header("User-Agent", &config.user_agent)
        .send()
        .map_err(|err| format!("request error: {err}"))?;

    if !response.status().is_success() {
        return Err(format!("geocoder responded with {}", response.status()));
    }

    let places: Vec<NominatimPlace> = response
        .json()
        .map_err(|err| format!("failed to decode geocoder response: {err}"))?;

    Ok(to_candidates(places))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, lat: &str, lon: &str) -> NominatimPlace {
        NominatimPlace {
            display_name: name.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }

    #[test]
    fn coordinates_parse_to_floats() {
        let candidate = place("Praça da Sé, São Paulo", "-23.55052", "-46.633308")
            .into_candidate()
            .expect("valid coordinates");
        assert_eq!(candidate.lat, -23.55052);
        assert_eq!(candidate.lon, -46.633308);
    }

    #[test]
    fn rank_preserved_and_capped_at_five() {
        let places: Vec<NominatimPlace> = (0..8)
            .map(|i| place(&format!("r{i}"), "-23.5", "-46.6"))
            .collect();
        let candidates = to_candidates(places);
        assert_eq!(candidates.len(), MAX_CANDIDATES);
        let names: Vec<&str> = candidates.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, ["r0", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn unparseable_entries_are_dropped() {
        let candidates = to_candidates(vec![
            place("good", "-23.5", "-46.6"),
            place("bad", "not-a-number", "-46.6"),
        ]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "good");
    }

    #[test]
    fn response_decoding_matches_wire_shape() {
        let payload = r#"[
            {"place_id": 1, "display_name": "Avenida Paulista, São Paulo",
             "lat": "-23.5614", "lon": "-46.6559", "importance": 0.8}
        ]"#;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(payload).expect("wire shape decodes");
        let candidates = to_candidates(places);
        assert_eq!(candidates[0].display_name, "Avenida Paulista, São Paulo");
        assert_eq!(candidates[0].lat, -23.5614);
    }
}
