//! Fits the map view to a fresh reachability payload: every rendered
//! coordinate ends up on screen with a fixed pixel margin.

use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use transit::geojson::{FeatureCollection, Geometry, Position};
use transit::isochrone::IsochroneState;

use crate::camera::MapView;
use crate::projection::project;

/// Margin kept between the fitted envelope and each window edge.
pub const FIT_PADDING_PX: f32 = 20.0;

const MIN_FIT_ZOOM: f64 = 3.0;
const MAX_FIT_ZOOM: f64 = 17.0;

/// Geographic envelope over the coordinates a collection renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    fn of(position: &Position) -> Self {
        Self {
            min_lat: position.lat,
            min_lon: position.lon,
            max_lat: position.lat,
            max_lon: position.lon,
        }
    }

    fn extend(&mut self, position: &Position) {
        self.min_lat = self.min_lat.min(position.lat);
        self.min_lon = self.min_lon.min(position.lon);
        self.max_lat = self.max_lat.max(position.lat);
        self.max_lon = self.max_lon.max(position.lon);
    }
}

/// Envelope over marker centers and every outer-ring vertex. `None` when
/// the collection renders nothing.
pub fn collect_bounds(collection: &FeatureCollection) -> Option<GeoBounds> {
    let mut bounds: Option<GeoBounds> = None;
    let mut include = |position: &Position| match bounds.as_mut() {
        Some(b) => b.extend(position),
        None => bounds = Some(GeoBounds::of(position)),
    };

    for feature in &collection.features {
        match &feature.geometry {
            Some(Geometry::Point(point)) => include(point),
            Some(Geometry::Polygon(rings)) => {
                if let Some(outer) = rings.first() {
                    outer.iter().for_each(&mut include);
                }
            }
            Some(Geometry::MultiPolygon(parts)) => {
                for rings in parts {
                    if let Some(outer) = rings.first() {
                        outer.iter().for_each(&mut include);
                    }
                }
            }
            None => {}
        }
    }
    bounds
}

/// Center and zoom that fit the envelope into the window with
/// `FIT_PADDING_PX` on each side.
pub fn fit_view(bounds: &GeoBounds, window_size: Vec2) -> (DVec2, f64) {
    let a = project(bounds.min_lat, bounds.min_lon);
    let b = project(bounds.max_lat, bounds.max_lon);
    let min = a.min(b);
    let max = a.max(b);
    let span = (max - min).max(DVec2::splat(1e-9));

    let avail_x = f64::from((window_size.x - 2.0 * FIT_PADDING_PX).max(1.0));
    let avail_y = f64::from((window_size.y - 2.0 * FIT_PADDING_PX).max(1.0));
    let zoom = (avail_x / span.x)
        .log2()
        .min((avail_y / span.y).log2())
        .clamp(MIN_FIT_ZOOM, MAX_FIT_ZOOM);

    ((min + max) * 0.5, zoom)
}

/// Refit once per collection generation; empty payloads leave the view
/// alone.
pub fn fit_viewport(
    state: Res<IsochroneState>,
    mut fitted_generation: Local<u64>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut view: ResMut<MapView>,
) {
    if *fitted_generation == state.generation {
        return;
    }
    *fitted_generation = state.generation;

    let Some(collection) = &state.collection else {
        return;
    };
    let Some(bounds) = collect_bounds(collection) else {
        return;
    };
    let Ok(window) = windows.get_single() else {
        return;
    };

    let (center, zoom) = fit_view(&bounds, Vec2::new(window.width(), window.height()));
    view.center = center;
    view.zoom = zoom;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::scale_at;
    use transit::geojson::{Feature, StopProperties};

    fn position(lon: f64, lat: f64) -> Position {
        Position { lon, lat }
    }

    fn feature(geometry: Geometry) -> Feature {
        Feature {
            geometry: Some(geometry),
            properties: StopProperties::default(),
        }
    }

    fn square_plus_point() -> FeatureCollection {
        FeatureCollection {
            features: vec![
                feature(Geometry::Polygon(vec![vec![
                    position(0.0, 0.0),
                    position(0.0, 1.0),
                    position(1.0, 1.0),
                    position(1.0, 0.0),
                ]])),
                feature(Geometry::Point(position(2.0, 2.0))),
            ],
        }
    }

    #[test]
    fn envelope_spans_ring_vertices_and_points() {
        let bounds = collect_bounds(&square_plus_point()).expect("non-empty");
        assert_eq!(bounds.min_lon, 0.0);
        assert_eq!(bounds.min_lat, 0.0);
        assert_eq!(bounds.max_lon, 2.0);
        assert_eq!(bounds.max_lat, 2.0);
    }

    #[test]
    fn empty_collection_has_no_bounds() {
        assert!(collect_bounds(&FeatureCollection::default()).is_none());

        let inert = FeatureCollection {
            features: vec![Feature {
                geometry: None,
                properties: StopProperties::default(),
            }],
        };
        assert!(collect_bounds(&inert).is_none());
    }

    #[test]
    fn fitted_view_keeps_the_padding_margin() {
        let bounds = collect_bounds(&square_plus_point()).expect("non-empty");
        let window = Vec2::new(800.0, 600.0);
        let (center, zoom) = fit_view(&bounds, window);

        let a = project(bounds.min_lat, bounds.min_lon);
        let b = project(bounds.max_lat, bounds.max_lon);
        let span = (a.max(b) - a.min(b)) * scale_at(zoom);

        assert!(span.x <= f64::from(window.x) - 2.0 * f64::from(FIT_PADDING_PX) + 1e-6);
        assert!(span.y <= f64::from(window.y) - 2.0 * f64::from(FIT_PADDING_PX) + 1e-6);
        // The envelope midpoint becomes the view center.
        assert_eq!(center, (a.min(b) + a.max(b)) * 0.5);
    }

    #[test]
    fn single_point_fit_clamps_to_max_zoom() {
        let bounds = GeoBounds::of(&position(-46.63, -23.55));
        let (_, zoom) = fit_view(&bounds, Vec2::new(800.0, 600.0));
        assert_eq!(zoom, MAX_FIT_ZOOM);
    }
}
