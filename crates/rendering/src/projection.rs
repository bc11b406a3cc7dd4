//! Web Mercator math shared by the tile layer, the markers, and the
//! viewport fitter.
//!
//! World space is the zoom-0 pixel plane: the whole earth spans
//! `TILE_SIZE` units on each axis, x grows east, y grows south. Screen
//! placement multiplies by `2^zoom` relative to the view center, so all
//! geographic anchors stay in f64 and never lose precision at street zoom.

use bevy::math::DVec2;

/// Side length of one raster tile in pixels, and of the whole world at z0.
pub const TILE_SIZE: f64 = 256.0;

/// Slippy-map tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Project WGS84 to the z0 pixel plane.
pub fn project(lat: f64, lon: f64) -> DVec2 {
    let x = (lon + 180.0) / 360.0 * TILE_SIZE;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * TILE_SIZE;
    DVec2::new(x, y)
}

/// Pixels-per-world-unit multiplier at a fractional zoom level.
pub fn scale_at(zoom: f64) -> f64 {
    zoom.exp2()
}

/// Side length of one tile in world units at the tile's native zoom.
pub fn tile_world_size(z: u8) -> f64 {
    TILE_SIZE / f64::from(1u32 << z)
}

/// World-space top-left corner of a tile.
pub fn tile_origin(coord: TileCoord) -> DVec2 {
    let size = tile_world_size(coord.z);
    DVec2::new(f64::from(coord.x) * size, f64::from(coord.y) * size)
}

/// Number of tiles per axis at a zoom level.
pub fn tile_count(z: u8) -> u32 {
    1u32 << z
}

/// Interpolate a `{s}/{z}/{x}/{y}` tile URL template. The subdomain rotates
/// across a/b/c by tile index so neighboring fetches spread over hosts.
pub fn tile_url(template: &str, coord: TileCoord) -> String {
    const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];
    let sub = SUBDOMAINS[((coord.x + coord.y) % SUBDOMAINS.len() as u32) as usize];
    template
        .replace("{s}", sub)
        .replace("{z}", &coord.z.to_string())
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
}
