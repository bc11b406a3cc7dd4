//! Renders the reachability payload: blue stop markers with zoom/hover
//! gated visibility, and purple reach polygons that are always visible.
//!
//! The layer never diffs features. When the collection generation changes,
//! every shape entity is despawned and the full set is rebuilt, so a failed
//! or partial update can never leave a mix of old and new geometry on
//! screen.

use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContexts};

use transit::geojson::{Geometry, Position, Ring, StopProperties};
use transit::isochrone::IsochroneState;

use crate::camera::{to_screen, GeoAnchor, GeoScale, MapView};
use crate::projection::project;

const FILL_Z: f32 = -5.0;
const MARKER_Z: f32 = 5.0;

/// Stop marker radius on screen.
pub const STOP_RADIUS_PX: f32 = 4.0;

/// Pointer distance that counts as hovering a stop marker.
const HOVER_RADIUS_PX: f32 = 6.0;

const STOP_COLOR: Color = Color::srgba(0.0, 0.25, 0.9, 0.7);
const STOP_HIDDEN_COLOR: Color = Color::srgba(0.0, 0.25, 0.9, 0.0);
const REACH_FILL_COLOR: Color = Color::srgba(0.5, 0.0, 0.5, 0.15);
const REACH_BORDER_COLOR: Color = Color::srgb(0.5, 0.0, 0.5);

#[derive(Resource, Clone)]
pub struct ReachLayerConfig {
    /// Stops are hidden below this zoom level unless hovered.
    pub zoom_threshold: f64,
}

impl Default for ReachLayerConfig {
    fn default() -> Self {
        let zoom_threshold = std::env::var("ALCANCE_ZOOM_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15.0);
        Self { zoom_threshold }
    }
}

/// Shared meshes and materials for the layer. Visibility flips swap between
/// the two stop material handles instead of mutating per-entity materials.
#[derive(Resource)]
pub struct LayerAssets {
    pub stop_mesh: Handle<Mesh>,
    pub stop_visible: Handle<ColorMaterial>,
    pub stop_hidden: Handle<ColorMaterial>,
    pub reach_fill: Handle<ColorMaterial>,
    pub origin_mesh: Handle<Mesh>,
    pub origin_material: Handle<ColorMaterial>,
}

pub fn setup_layer_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.insert_resource(LayerAssets {
        stop_mesh: meshes.add(Circle::new(STOP_RADIUS_PX)),
        stop_visible: materials.add(ColorMaterial::from(STOP_COLOR)),
        stop_hidden: materials.add(ColorMaterial::from(STOP_HIDDEN_COLOR)),
        reach_fill: materials.add(ColorMaterial::from(REACH_FILL_COLOR)),
        origin_mesh: meshes.add(Circle::new(6.0)),
        origin_material: materials.add(ColorMaterial::from(Color::srgb(0.85, 0.12, 0.12))),
    });
}

/// Marker for every entity the layer owns; teardown despawns by this.
#[derive(Component)]
pub struct IsochroneShape;

#[derive(Component)]
pub struct StopMarker {
    pub label: String,
    pub hovered: bool,
}

/// Mercator outer rings drawn as the polygon border each frame.
#[derive(Component)]
pub struct ReachOutline {
    pub ring: Vec<DVec2>,
}

/// Base visibility of a stop marker. Pure on purpose: any interleaving of
/// zoom and hover events resolves to the same answer.
pub fn marker_visible(zoom: f64, zoom_threshold: f64, hovered: bool) -> bool {
    zoom >= zoom_threshold || hovered
}

/// Popup label for a stop feature; missing properties fall back instead of
/// failing.
pub fn stop_label(properties: &StopProperties) -> String {
    let name = properties.stop_name.as_deref().unwrap_or("Parada");
    match properties.tempo_min {
        Some(tempo) => format!("{name} ({tempo} min)"),
        None => name.to_string(),
    }
}

/// Triangle-fan indices for a mesh laid out as `[center, v0, v1, ..]`.
pub fn fan_indices(ring_len: usize) -> Vec<u32> {
    let n = ring_len as u32;
    let mut indices = Vec::with_capacity(ring_len * 3);
    for i in 0..n {
        indices.extend_from_slice(&[0, i + 1, (i + 1) % n + 1]);
    }
    indices
}

/// Twice the signed area of a ring; positive when counter-clockwise.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        area += p.x * q.y - q.x * p.y;
    }
    area
}

/// Fill mesh for one outer ring, fanned from its centroid. Reach areas are
/// near star-shaped around the origin, which is what a fan can represent.
fn reach_fill_mesh(ring: &[DVec2], anchor: DVec2) -> Mesh {
    let mut rel: Vec<Vec2> = ring
        .iter()
        .map(|point| {
            let r = *point - anchor;
            Vec2::new(r.x as f32, -r.y as f32)
        })
        .collect();
    // The screen y-flip mirrors the ring; keep the fan counter-clockwise
    // regardless of the winding the backend emitted.
    if signed_area(&rel) < 0.0 {
        rel.reverse();
    }

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(rel.len() + 1);
    positions.push([0.0, 0.0, 0.0]);
    positions.extend(rel.iter().map(|p| [p.x, p.y, 0.0]));
    let uvs: Vec<[f32; 2]> = vec![[0.0, 0.0]; positions.len()];
    let indices = fan_indices(ring.len());

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(indices))
}

/// Project a GeoJSON ring, dropping the closing duplicate vertex.
fn project_ring(ring: &Ring) -> Vec<DVec2> {
    let mut points: Vec<DVec2> = ring.iter().map(|p| project(p.lat, p.lon)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn spawn_stop(commands: &mut Commands, assets: &LayerAssets, point: Position, label: String) {
    commands.spawn((
        Mesh2d(assets.stop_mesh.clone()),
        MeshMaterial2d(assets.stop_hidden.clone()),
        Transform::from_xyz(0.0, 0.0, MARKER_Z),
        GeoAnchor(project(point.lat, point.lon)),
        GeoScale::ScreenConstant,
        IsochroneShape,
        StopMarker {
            label,
            hovered: false,
        },
    ));
}

fn spawn_reach_part(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    assets: &LayerAssets,
    rings: &[Ring],
) {
    let Some(outer) = rings.first() else {
        return;
    };
    let ring = project_ring(outer);
    if ring.len() < 3 {
        return;
    }
    let anchor = ring.iter().copied().sum::<DVec2>() / ring.len() as f64;

    commands.spawn((
        Mesh2d(meshes.add(reach_fill_mesh(&ring, anchor))),
        MeshMaterial2d(assets.reach_fill.clone()),
        Transform::from_xyz(0.0, 0.0, FILL_Z),
        GeoAnchor(anchor),
        GeoScale::ZoomScaled,
        IsochroneShape,
        ReachOutline { ring },
    ));
}

/// Tear down and rebuild the whole layer whenever the collection generation
/// changes. Geometry types outside Point/Polygon/MultiPolygon are inert.
pub fn sync_isochrone_layer(
    state: Res<IsochroneState>,
    mut rendered_generation: Local<u64>,
    existing: Query<Entity, With<IsochroneShape>>,
    assets: Res<LayerAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut commands: Commands,
) {
    if *rendered_generation == state.generation {
        return;
    }
    *rendered_generation = state.generation;

    for entity in &existing {
        commands.entity(entity).despawn();
    }
    let Some(collection) = &state.collection else {
        return;
    };

    for feature in &collection.features {
        match &feature.geometry {
            Some(Geometry::Point(point)) => {
                spawn_stop(&mut commands, &assets, *point, stop_label(&feature.properties));
            }
            Some(Geometry::Polygon(rings)) => {
                spawn_reach_part(&mut commands, &mut meshes, &assets, rings);
            }
            Some(Geometry::MultiPolygon(parts)) => {
                for rings in parts {
                    spawn_reach_part(&mut commands, &mut meshes, &assets, rings);
                }
            }
            None => {}
        }
    }
}

/// Cursor proximity drives the per-marker hover flag and the popup label.
pub fn hover_stop_markers(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mut contexts: EguiContexts,
    mut markers: Query<(&Transform, &mut StopMarker)>,
) {
    let cursor_world = windows
        .get_single()
        .ok()
        .and_then(|window| {
            let screen = window.cursor_position()?;
            let (camera, camera_transform) = cameras.get_single().ok()?;
            camera.viewport_to_world_2d(camera_transform, screen).ok()
        })
        .filter(|_| !contexts.ctx_mut().wants_pointer_input());

    let mut tooltip: Option<String> = None;
    for (transform, mut marker) in &mut markers {
        let hovered = cursor_world.is_some_and(|cursor| {
            transform.translation.truncate().distance(cursor) <= HOVER_RADIUS_PX
        });
        if marker.hovered != hovered {
            marker.hovered = hovered;
        }
        if hovered && tooltip.is_none() {
            tooltip = Some(marker.label.clone());
        }
    }

    if let Some(label) = tooltip {
        let ctx = contexts.ctx_mut();
        if let Some(pointer) = ctx.pointer_latest_pos() {
            egui::Area::new(egui::Id::new("stop_tooltip"))
                .fixed_pos(pointer + egui::vec2(12.0, 12.0))
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(label);
                    });
                });
        }
    }
}

/// Swap stop materials between the shared visible/hidden handles.
pub fn update_stop_visibility(
    view: Res<MapView>,
    config: Res<ReachLayerConfig>,
    assets: Res<LayerAssets>,
    mut markers: Query<(&StopMarker, &mut MeshMaterial2d<ColorMaterial>)>,
) {
    for (marker, mut material) in &mut markers {
        let target = if marker_visible(view.zoom, config.zoom_threshold, marker.hovered) {
            &assets.stop_visible
        } else {
            &assets.stop_hidden
        };
        if material.0 != *target {
            material.0 = target.clone();
        }
    }
}

/// Polygon borders, drawn in screen space each frame.
pub fn draw_reach_outlines(
    view: Res<MapView>,
    outlines: Query<&ReachOutline>,
    mut gizmos: Gizmos,
) {
    for outline in &outlines {
        if outline.ring.len() < 2 {
            continue;
        }
        let mut points: Vec<Vec2> = outline
            .ring
            .iter()
            .map(|merc| to_screen(&view, *merc))
            .collect();
        points.push(points[0]);
        gizmos.linestrip_2d(points, REACH_BORDER_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit::geojson::FeatureCollection;

    #[test]
    fn visibility_is_pure_in_zoom_and_hover() {
        // Below threshold: hidden until hovered, hidden again on exit.
        assert!(!marker_visible(14.0, 15.0, false));
        assert!(marker_visible(14.0, 15.0, true));
        assert!(!marker_visible(14.0, 15.0, false));
        // At or above threshold: always visible.
        assert!(marker_visible(15.0, 15.0, false));
        assert!(marker_visible(16.2, 15.0, false));
    }

    #[test]
    fn labels_default_missing_properties() {
        let full = StopProperties {
            stop_name: Some("Terminal Lapa".into()),
            tempo_min: Some(15.0),
        };
        assert_eq!(stop_label(&full), "Terminal Lapa (15 min)");

        let bare = StopProperties::default();
        assert_eq!(stop_label(&bare), "Parada");
    }

    #[test]
    fn fan_indices_wrap_around() {
        assert_eq!(fan_indices(3), vec![0, 1, 2, 0, 2, 3, 0, 3, 1]);
    }

    #[test]
    fn signed_area_tracks_winding() {
        let ccw = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ];
        assert!(signed_area(&ccw) > 0.0);
        let cw: Vec<Vec2> = ccw.iter().rev().copied().collect();
        assert!(signed_area(&cw) < 0.0);
    }

    fn layer_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::asset::AssetPlugin::default());
        app.init_asset::<Mesh>();
        app.init_asset::<ColorMaterial>();
        app.init_resource::<IsochroneState>();
        app.add_systems(Startup, setup_layer_assets);
        app.add_systems(Update, sync_isochrone_layer);
        app
    }

    fn shape_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<IsochroneShape>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn rebuilds_the_layer_wholesale() {
        let mut app = layer_app();

        let collection: FeatureCollection = serde_json::from_value(serde_json::json!({
            "features": [
                {
                    "geometry": {"type": "Point", "coordinates": [-46.63, -23.55]},
                    "properties": {"stop_name": "Sé", "tempo_min": 5}
                },
                {
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-46.64, -23.56], [-46.62, -23.56], [-46.62, -23.54],
                                         [-46.64, -23.54], [-46.64, -23.56]]]
                    },
                    "properties": {}
                },
                {
                    "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]},
                    "properties": {}
                }
            ]
        }))
        .expect("payload decodes");

        app.world_mut()
            .resource_mut::<IsochroneState>()
            .replace(collection);
        app.update();
        // One stop, one polygon; the LineString stays inert.
        assert_eq!(shape_count(&mut app), 2);

        app.world_mut()
            .resource_mut::<IsochroneState>()
            .replace(FeatureCollection::default());
        app.update();
        assert_eq!(shape_count(&mut app), 0);
    }
}
