//! Shape operations on a single [`GangTerritory`].
//!
//! Esri rings carry no explicit polygon grouping: exterior rings wind
//! clockwise and holes counter-clockwise. [`polygons`] recovers the
//! grouping so a multi-part territory decomposes into one simple polygon
//! per exterior, each with its own holes, rewound to the `GeoJSON` order
//! (counter-clockwise exteriors, clockwise holes).

use crime_grid_gang_models::GangTerritory;
use geo::orient::Direction;
use geo::{
    BoundingRect, Centroid, Coord, Intersects, LineString, MultiPolygon, Orient, Point, Polygon,
    Rect, Winding,
};
use geojson::{Feature, Geometry, JsonObject, Value};

/// Groups a territory's rings into simple polygons.
///
/// Clockwise rings are exteriors. Each counter-clockwise ring becomes a
/// hole of the first exterior containing its first vertex, or an exterior
/// of its own when no exterior contains it. When no ring is clockwise,
/// every ring is treated as an exterior. Output rings follow RFC 7946
/// winding.
#[must_use]
pub fn polygons(territory: &GangTerritory) -> Vec<Polygon<f64>> {
    let rings: Vec<LineString<f64>> = territory
        .rings
        .iter()
        .map(|ring| LineString::from(ring.clone()))
        .collect();

    let (exteriors, holes): (Vec<_>, Vec<_>) = rings.into_iter().partition(|ring| ring.is_cw());

    if exteriors.is_empty() {
        return holes
            .into_iter()
            .map(|ring| Polygon::new(ring, vec![]).orient(Direction::Default))
            .collect();
    }

    let mut groups: Vec<(LineString<f64>, Vec<LineString<f64>>)> =
        exteriors.into_iter().map(|ring| (ring, vec![])).collect();

    for hole in holes {
        let Some(vertex) = hole.0.first().copied() else {
            continue;
        };
        let owner = groups
            .iter_mut()
            .find(|(exterior, _)| contains_coord(exterior, vertex));
        match owner {
            Some((_, interiors)) => interiors.push(hole),
            None => groups.push((hole, vec![])),
        }
    }

    groups
        .into_iter()
        .map(|(exterior, interiors)| {
            Polygon::new(exterior, interiors).orient(Direction::Default)
        })
        .collect()
}

fn contains_coord(exterior: &LineString<f64>, coord: Coord<f64>) -> bool {
    Polygon::new(exterior.clone(), vec![]).intersects(&coord)
}

/// All of a territory's simple polygons as one [`MultiPolygon`].
#[must_use]
pub fn multi_polygon(territory: &GangTerritory) -> MultiPolygon<f64> {
    MultiPolygon(polygons(territory))
}

/// Bounding box of the whole territory, or `None` if it has no rings.
#[must_use]
pub fn bounding_box(territory: &GangTerritory) -> Option<Rect<f64>> {
    multi_polygon(territory).bounding_rect()
}

/// Centroid of one simple polygon, used to anchor its label.
#[must_use]
pub fn label_anchor(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.centroid()
}

/// Wraps a geometry and the territory's attributes as a `GeoJSON` feature.
#[must_use]
pub fn to_feature(value: Value, territory: &GangTerritory) -> Feature {
    let properties: JsonObject = territory.attributes.clone();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
