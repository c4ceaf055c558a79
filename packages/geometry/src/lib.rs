#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geometry conversion for the crime grid map.
//!
//! Turns raw incident rows into a `GeoJSON` point collection and raw Esri
//! boundary features into a [`GangDataset`] of closed rings. Both
//! conversions are pure: invalid input rows are skipped, never reported.
//! [`territory`] holds the shape operations used when highlighting a
//! single territory (ring grouping, bounding box, flattening, centroid).

pub mod territory;

use crime_grid_crime_models::IncidentRecord;
use crime_grid_gang_models::{GangDataset, GangTerritory, Position, RawBoundaryFeature, Ring};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// Attribute added to every territory holding its extracted name.
pub const GANG_NAME_ATTRIBUTE: &str = "gangName";

/// Converts incident rows into a point collection.
///
/// Rows whose longitude or latitude is missing or non-numeric are dropped.
/// Every surviving row yields one `Point` feature, in input order, carrying
/// `date` and `primary_type` properties.
#[must_use]
pub fn to_point_collection(records: &[IncidentRecord]) -> FeatureCollection {
    let features: Vec<Feature> = records.iter().filter_map(point_feature).collect();

    let dropped = records.len() - features.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} incident rows without usable coordinates");
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn point_feature(record: &IncidentRecord) -> Option<Feature> {
    let (lng, lat) = record.coordinates()?;

    let mut properties = JsonObject::new();
    properties.insert(
        "date".to_string(),
        record
            .date
            .clone()
            .map_or(serde_json::Value::Null, serde_json::Value::String),
    );
    properties.insert(
        "primary_type".to_string(),
        serde_json::Value::String(record.primary_type.clone()),
    );

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Converts raw Esri boundary features into a [`GangDataset`].
///
/// Features without rings or without a non-empty string under `name_field`
/// are skipped. Every ring is explicitly closed; rings with fewer than
/// three usable positions are dropped. All source attributes are copied and
/// the name is added under [`GANG_NAME_ATTRIBUTE`].
#[must_use]
pub fn to_polygon_collection(features: &[RawBoundaryFeature], name_field: &str) -> GangDataset {
    let territories: Vec<GangTerritory> = features
        .iter()
        .filter_map(|feature| to_territory(feature, name_field))
        .collect();

    if territories.len() < features.len() {
        log::warn!(
            "Skipped {} of {} boundary features without a name or geometry",
            features.len() - territories.len(),
            features.len()
        );
    }

    GangDataset::from_territories(territories)
}

fn to_territory(feature: &RawBoundaryFeature, name_field: &str) -> Option<GangTerritory> {
    let name = feature
        .attributes
        .get(name_field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let raw_rings = feature.geometry.as_ref()?.rings.as_ref()?;
    let rings: Vec<Ring> = raw_rings.iter().filter_map(|r| close_ring(r)).collect();
    if rings.is_empty() {
        return None;
    }

    let mut attributes = feature.attributes.clone();
    attributes.insert(
        GANG_NAME_ATTRIBUTE.to_string(),
        serde_json::Value::String(name.clone()),
    );

    Some(GangTerritory {
        name,
        attributes,
        rings,
    })
}

/// Builds a closed ring from raw Esri positions.
///
/// Only the first two ordinates of each position are kept; positions with
/// fewer ordinates or non-finite values are skipped. If the last position
/// differs from the first, the first is appended. Returns `None` when fewer
/// than three usable positions remain.
#[must_use]
pub fn close_ring(raw: &[Vec<f64>]) -> Option<Ring> {
    let mut ring: Ring = raw
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some([*x, *y]),
            _ => None,
        })
        .collect();

    if ring.first() == ring.last() && ring.len() > 1 {
        ring.pop();
    }
    if ring.len() < 3 {
        return None;
    }

    let first: Position = ring[0];
    ring.push(first);
    Some(ring)
}
