//! Red dot at the focal position, the origin the reachability is computed
//! from.

use bevy::prelude::*;

use transit::position::FocalPosition;

use crate::camera::{GeoAnchor, GeoScale};
use crate::isochrone_layer::LayerAssets;
use crate::projection::project;

const ORIGIN_Z: f32 = 6.0;

#[derive(Component)]
pub struct OriginMarker;

pub fn spawn_origin_marker(
    mut commands: Commands,
    assets: Res<LayerAssets>,
    focal: Res<FocalPosition>,
) {
    commands.spawn((
        Mesh2d(assets.origin_mesh.clone()),
        MeshMaterial2d(assets.origin_material.clone()),
        Transform::from_xyz(0.0, 0.0, ORIGIN_Z),
        GeoAnchor(project(focal.latitude(), focal.longitude())),
        GeoScale::ScreenConstant,
        OriginMarker,
    ));
}

/// Re-anchor the marker whenever the focal position moves.
pub fn sync_origin_marker(
    focal: Res<FocalPosition>,
    mut markers: Query<&mut GeoAnchor, With<OriginMarker>>,
) {
    if !focal.is_changed() || focal.is_added() {
        return;
    }
    for mut anchor in &mut markers {
        anchor.0 = project(focal.latitude(), focal.longitude());
    }
}
