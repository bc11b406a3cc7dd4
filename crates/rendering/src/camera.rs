//! 2D map camera: pan, cursor-anchored zoom, and the system that places
//! geo-anchored entities each frame.
//!
//! The `Camera2d` itself never moves. `MapView` holds the mercator center
//! and fractional zoom in f64, and `apply_geo_transforms` recomputes every
//! anchored entity's `Transform` relative to that center, so screen-space
//! precision holds at street-level zoom.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use transit::position::{FocalPosition, FALLBACK_LATITUDE, FALLBACK_LONGITUDE};

use crate::projection::{project, scale_at};

/// Initial zoom over the fallback position.
pub const DEFAULT_ZOOM: f64 = 13.0;

const MIN_ZOOM: f64 = 3.0;
const MAX_ZOOM: f64 = 19.0;
const LINE_ZOOM_STEP: f64 = 0.25;
const PIXEL_ZOOM_STEP: f64 = 0.01;

/// Mercator center plus fractional zoom level; the single source of truth
/// for what the map shows.
#[derive(Resource, Debug, Clone)]
pub struct MapView {
    pub center: DVec2,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: project(FALLBACK_LATITUDE, FALLBACK_LONGITUDE),
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// World-space (z0 mercator) anchor of a rendered entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct GeoAnchor(pub DVec2);

/// How an anchored entity scales with the view zoom.
#[derive(Component, Debug, Clone, Copy)]
pub enum GeoScale {
    /// Fixed pixel size (stop markers, origin dot).
    ScreenConstant,
    /// Vertices baked in z0 world units (reach polygons).
    ZoomScaled,
    /// Raster tile rendered at its native zoom level.
    Tile { native_zoom: u8 },
}

#[derive(Resource, Default)]
pub struct CameraDrag {
    pub dragging: bool,
    pub last_pos: Vec2,
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.init_resource::<CameraDrag>();
}

/// Left-drag pans the map. Drags that start over egui panels are ignored.
pub fn camera_pan(
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut contexts: EguiContexts,
    mut drag: ResMut<CameraDrag>,
    mut view: ResMut<MapView>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(pos) = window.cursor_position() else {
        drag.dragging = false;
        return;
    };

    if buttons.just_pressed(MouseButton::Left) && !contexts.ctx_mut().wants_pointer_input() {
        drag.dragging = true;
        drag.last_pos = pos;
        return;
    }
    if buttons.just_released(MouseButton::Left) {
        drag.dragging = false;
        return;
    }

    if drag.dragging && buttons.pressed(MouseButton::Left) {
        let delta = pos - drag.last_pos;
        drag.last_pos = pos;
        if delta != Vec2::ZERO {
            // Window and mercator axes agree (y down), so the pan is a
            // straight pixel-to-world division.
            let s = scale_at(view.zoom);
            view.center -= DVec2::new(f64::from(delta.x), f64::from(delta.y)) / s;
        }
    }
}

/// Scroll-wheel zoom, anchored so the point under the cursor stays put.
pub fn camera_zoom(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut scroll: EventReader<MouseWheel>,
    mut contexts: EguiContexts,
    mut view: ResMut<MapView>,
) {
    let mut amount = 0.0f64;
    for ev in scroll.read() {
        amount += match ev.unit {
            MouseScrollUnit::Line => f64::from(ev.y) * LINE_ZOOM_STEP,
            MouseScrollUnit::Pixel => f64::from(ev.y) * PIXEL_ZOOM_STEP,
        };
    }
    if amount == 0.0 || contexts.ctx_mut().wants_pointer_input() {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };

    let target = (view.zoom + amount).clamp(MIN_ZOOM, MAX_ZOOM);
    if target == view.zoom {
        return;
    }

    let half = Vec2::new(window.width(), window.height()) * 0.5;
    let rel = window.cursor_position().unwrap_or(half) - half;
    let rel = DVec2::new(f64::from(rel.x), f64::from(rel.y));
    let under_cursor = view.center + rel / scale_at(view.zoom);
    view.center = under_cursor - rel / scale_at(target);
    view.zoom = target;
}

/// Recenter on the shared focal position whenever it moves (candidate
/// submit or the startup locate fix). Zoom is left alone; the viewport
/// fitter adjusts it once reachability data arrives.
pub fn follow_focal_position(focal: Res<FocalPosition>, mut view: ResMut<MapView>) {
    if !focal.is_changed() || focal.is_added() {
        return;
    }
    view.center = project(focal.latitude(), focal.longitude());
}

/// Place every geo-anchored entity relative to the view center.
pub fn apply_geo_transforms(
    view: Res<MapView>,
    mut anchored: Query<(&GeoAnchor, &GeoScale, &mut Transform)>,
) {
    let s = scale_at(view.zoom);
    for (anchor, mode, mut transform) in &mut anchored {
        let rel = (anchor.0 - view.center) * s;
        transform.translation.x = rel.x as f32;
        transform.translation.y = -rel.y as f32;
        let factor = match mode {
            GeoScale::ScreenConstant => 1.0,
            GeoScale::ZoomScaled => s,
            GeoScale::Tile { native_zoom } => (view.zoom - f64::from(*native_zoom)).exp2(),
        };
        transform.scale = Vec3::new(factor as f32, factor as f32, 1.0);
    }
}

/// Screen-space (pixel) position of a mercator point under the current
/// view; the camera sits at the origin, so this is also world space.
pub fn to_screen(view: &MapView, point: DVec2) -> Vec2 {
    let rel = (point - view.center) * scale_at(view.zoom);
    Vec2::new(rel.x as f32, -rel.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_centers_on_fallback() {
        let view = MapView::default();
        assert_eq!(view.center, project(FALLBACK_LATITUDE, FALLBACK_LONGITUDE));
        assert_eq!(view.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn to_screen_is_zero_at_center_and_flips_y() {
        let view = MapView {
            center: DVec2::new(128.0, 128.0),
            zoom: 2.0,
        };
        assert_eq!(to_screen(&view, view.center), Vec2::ZERO);

        // One world unit south of center ends up 2^zoom pixels below.
        let south = to_screen(&view, DVec2::new(128.0, 129.0));
        assert_eq!(south, Vec2::new(0.0, -4.0));
    }
}
