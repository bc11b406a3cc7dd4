//! Shared focal-coordinate state: the origin the map centers on and the
//! isochrones are computed from.

use bevy::prelude::*;

/// Fallback origin when no selection or locate fix has happened yet:
/// Praça da Sé, São Paulo.
pub const FALLBACK_LATITUDE: f64 = -23.55052;
pub const FALLBACK_LONGITUDE: f64 = -46.633308;

/// The single focal coordinate pair shared by the origin marker and the map
/// recenter logic. Fields are private: `update_position` is the only
/// mutator, so every consumer observes one consistent value and no history
/// is kept.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct FocalPosition {
    latitude: f64,
    longitude: f64,
}

impl Default for FocalPosition {
    fn default() -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
        }
    }
}

impl FocalPosition {
    pub fn update_position(&mut self, latitude: f64, longitude: f64) {
        self.latitude = latitude;
        self.longitude = longitude;
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_fallback() {
        let pos = FocalPosition::default();
        assert_eq!(pos.latitude(), FALLBACK_LATITUDE);
        assert_eq!(pos.longitude(), FALLBACK_LONGITUDE);
    }

    #[test]
    fn update_replaces_without_history() {
        let mut pos = FocalPosition::default();
        pos.update_position(-22.9, -43.2);
        pos.update_position(-30.03, -51.23);
        assert_eq!(pos.latitude(), -30.03);
        assert_eq!(pos.longitude(), -51.23);
    }
}
