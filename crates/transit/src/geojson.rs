//! Minimal GeoJSON model for the reachability payload.
//!
//! The backend returns a FeatureCollection mixing `Point` stops and
//! `Polygon`/`MultiPolygon` reach areas. Geometry decoding is tolerant by
//! contract: a feature whose geometry has an unknown `type` (or malformed
//! coordinates) decodes to `None` and stays inert — it is never rendered and
//! never fails the whole payload.

use serde::Deserialize;
use serde_json::Value;

/// A single WGS84 position. GeoJSON stores these as `[lon, lat, ...]`;
/// decoding keeps only the first two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

/// A closed ring of positions. `rings[0]` of a polygon is the outer ring.
pub type Ring = Vec<Position>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Decode a raw GeoJSON geometry object. Unknown `type` strings and
    /// coordinate arrays that don't match the declared type yield `None`.
    pub fn from_value(value: &Value) -> Option<Geometry> {
        let kind = value.get("type")?.as_str()?;
        let coordinates = value.get("coordinates")?;
        match kind {
            "Point" => parse_position(coordinates).map(Geometry::Point),
            "Polygon" => parse_rings(coordinates).map(Geometry::Polygon),
            "MultiPolygon" => {
                let parts = coordinates
                    .as_array()?
                    .iter()
                    .map(parse_rings)
                    .collect::<Option<Vec<_>>>()?;
                Some(Geometry::MultiPolygon(parts))
            }
            _ => None,
        }
    }
}

fn parse_position(value: &Value) -> Option<Position> {
    let raw = value.as_array()?;
    if raw.len() < 2 {
        return None;
    }
    Some(Position {
        lon: raw[0].as_f64()?,
        lat: raw[1].as_f64()?,
    })
}

fn parse_rings(value: &Value) -> Option<Vec<Ring>> {
    value
        .as_array()?
        .iter()
        .map(|ring| ring.as_array()?.iter().map(parse_position).collect())
        .collect()
}

/// Properties attached to stop features. Both fields are optional on the
/// wire; rendering defaults missing values instead of failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopProperties {
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub tempo_min: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "tolerant_geometry")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: StopProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn tolerant_geometry<'de, D>(deserializer: D) -> Result<Option<Geometry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Geometry::from_value))
}
