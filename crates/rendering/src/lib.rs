//! Map surface: tile background, 2D map camera, origin marker, and the
//! reachability layer with its viewport fitting.

use bevy::prelude::*;

use transit::TransitSet;

pub mod camera;
pub mod isochrone_layer;
pub mod origin_marker;
pub mod projection;
pub mod tiles;
pub mod viewport;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<camera::MapView>()
            .init_resource::<tiles::TileLayerConfig>()
            .init_resource::<tiles::TileCache>()
            .init_resource::<isochrone_layer::ReachLayerConfig>()
            .add_systems(
                Startup,
                (
                    camera::setup_camera,
                    isochrone_layer::setup_layer_assets,
                    origin_marker::spawn_origin_marker,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_zoom,
                    camera::follow_focal_position,
                    viewport::fit_viewport,
                    origin_marker::sync_origin_marker,
                    tiles::sync_visible_tiles,
                    tiles::poll_tile_fetches,
                    isochrone_layer::sync_isochrone_layer,
                    camera::apply_geo_transforms,
                    isochrone_layer::hover_stop_markers,
                    isochrone_layer::update_stop_visibility,
                    isochrone_layer::draw_reach_outlines,
                )
                    .chain()
                    .after(TransitSet::Network),
            );
    }
}
