//! Raster tile layer: fetches slippy-map tiles for the visible area and
//! swaps them into placeholder sprites as the downloads finish.
//!
//! Tiles are cached per coordinate while visible and dropped once the view
//! leaves them; a failed download keeps the placeholder and logs once.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::sprite::Anchor;
use bevy::tasks::{block_on, IoTaskPool, Task};
use bevy::window::PrimaryWindow;

use transit::config::BackendConfig;

use crate::camera::{GeoAnchor, GeoScale, MapView};
use crate::projection::{scale_at, tile_count, tile_origin, tile_url, tile_world_size, TileCoord};

/// Z layer for tile sprites, below every other map element.
const TILE_Z: f32 = -10.0;

const MIN_TILE_ZOOM: u8 = 3;
const MAX_TILE_ZOOM: u8 = 19;

/// Extra rings of tiles kept around the visible rect so panning does not
/// flash placeholders immediately.
const PREFETCH_MARGIN: i64 = 1;

#[derive(Resource, Clone)]
pub struct TileLayerConfig {
    pub template: String,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        let template = std::env::var("ALCANCE_TILE_URL")
            .unwrap_or_else(|_| "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into());
        Self { template }
    }
}

#[derive(Resource, Default)]
pub struct TileCache {
    entities: HashMap<TileCoord, Entity>,
}

#[derive(Component)]
pub struct TileSprite {
    pub coord: TileCoord,
}

/// In-flight tile download; removed once the image lands or fails.
#[derive(Component)]
pub struct TileFetch {
    handle: Handle<Image>,
    task: Task<Result<Image, String>>,
}

/// Neutral placeholder shown until the tile arrives.
fn placeholder_image() -> Image {
    Image::new_fill(
        Extent3d {
            width: 2,
            height: 2,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[221, 221, 221, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
}

/// Download and decode one tile into a Bevy texture.
fn fetch_tile(url: &str, user_agent: &str) -> Result<Image, String> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .send()
        .map_err(|err| format!("request error: {err}"))?;
    if !response.status().is_success() {
        return Err(format!("tile server responded with {}", response.status()));
    }
    let bytes = response
        .bytes()
        .map_err(|err| format!("failed to read tile response: {err}"))?
        .to_vec();
    let rgba = image::load_from_memory(&bytes)
        .map_err(|err| format!("failed to decode tile: {err}"))?
        .into_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        rgba.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    ))
}

/// Tile index range (inclusive) covering the visible rect plus the
/// prefetch margin, clamped to the tile grid.
pub fn visible_range(view: &MapView, window_size: Vec2, z: u8) -> (u32, u32, u32, u32) {
    let s = scale_at(view.zoom);
    let half_w = f64::from(window_size.x) * 0.5 / s;
    let half_h = f64::from(window_size.y) * 0.5 / s;
    let size = tile_world_size(z);
    let max_index = i64::from(tile_count(z)) - 1;

    let clamp = |v: i64| v.clamp(0, max_index) as u32;
    let min_x = clamp(((view.center.x - half_w) / size).floor() as i64 - PREFETCH_MARGIN);
    let max_x = clamp(((view.center.x + half_w) / size).floor() as i64 + PREFETCH_MARGIN);
    let min_y = clamp(((view.center.y - half_h) / size).floor() as i64 - PREFETCH_MARGIN);
    let max_y = clamp(((view.center.y + half_h) / size).floor() as i64 + PREFETCH_MARGIN);
    (min_x, max_x, min_y, max_y)
}

/// Spawn sprites for tiles entering the view and drop tiles that left it
/// or belong to another zoom level.
#[allow(clippy::too_many_arguments)]
pub fn sync_visible_tiles(
    view: Res<MapView>,
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<TileLayerConfig>,
    backend: Res<BackendConfig>,
    mut cache: ResMut<TileCache>,
    mut images: ResMut<Assets<Image>>,
    existing: Query<(Entity, &TileSprite)>,
    mut commands: Commands,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let window_size = Vec2::new(window.width(), window.height());
    let z = (view.zoom.round() as i64).clamp(i64::from(MIN_TILE_ZOOM), i64::from(MAX_TILE_ZOOM))
        as u8;
    let (min_x, max_x, min_y, max_y) = visible_range(&view, window_size, z);

    for (entity, tile) in &existing {
        let coord = tile.coord;
        let stale = coord.z != z
            || coord.x < min_x
            || coord.x > max_x
            || coord.y < min_y
            || coord.y > max_y;
        if stale {
            cache.entities.remove(&coord);
            commands.entity(entity).despawn();
        }
    }

    let pool = IoTaskPool::get();
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let coord = TileCoord { z, x, y };
            if cache.entities.contains_key(&coord) {
                continue;
            }

            let handle = images.add(placeholder_image());
            let url = tile_url(&config.template, coord);
            let user_agent = backend.user_agent.clone();
            let task = pool.spawn(async move { fetch_tile(&url, &user_agent) });

            let entity = commands
                .spawn((
                    Sprite {
                        image: handle.clone(),
                        custom_size: Some(Vec2::splat(crate::projection::TILE_SIZE as f32)),
                        anchor: Anchor::TopLeft,
                        ..default()
                    },
                    Transform::from_xyz(0.0, 0.0, TILE_Z),
                    GeoAnchor(tile_origin(coord)),
                    GeoScale::Tile { native_zoom: z },
                    TileSprite { coord },
                    TileFetch { handle, task },
                ))
                .id();
            cache.entities.insert(coord, entity);
        }
    }
}

/// Swap finished downloads into their placeholder textures.
pub fn poll_tile_fetches(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut fetches: Query<(Entity, &TileSprite, &mut TileFetch)>,
) {
    for (entity, tile, mut fetch) in &mut fetches {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut fetch.task)) else {
            continue;
        };

        match result {
            Ok(decoded) => {
                if let Some(existing) = images.get_mut(&fetch.handle) {
                    *existing = decoded;
                }
            }
            Err(err) => {
                let TileCoord { z, x, y } = tile.coord;
                warn!("tile {z}/{x}/{y} unavailable: {err}");
            }
        }
        commands.entity(entity).remove::<TileFetch>();
    }
}
