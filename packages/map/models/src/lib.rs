#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map surface vocabulary.
//!
//! Layer, source, bounds, and viewport types exchanged with the rendering
//! surface. Layers serialize to the `MapLibre` style-spec layer shape
//! (`id`, `type`, `source`, `paint`, `layout`, `minzoom`, `maxzoom`) so a
//! surface can be dumped as a style document and handed to a browser map.

use std::f64::consts::PI;

use geojson::{GeoJson, JsonObject};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Highest zoom level the surface supports.
pub const MAX_ZOOM: f64 = 22.0;

/// Pixel size of one world tile at zoom 0.
const TILE_SIZE: f64 = 512.0;

/// Rendering type of a layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LayerKind {
    /// Point density heatmap.
    Heatmap,
    /// One circle per point.
    Circle,
    /// Filled polygon.
    Fill,
    /// Polygon outline.
    Line,
    /// Text label.
    Symbol,
}

/// Layout `visibility` value.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Drawn.
    #[default]
    Visible,
    /// Not drawn.
    None,
}

impl Visibility {
    /// Maps a boolean to [`Visibility::Visible`] or [`Visibility::None`].
    #[must_use]
    pub const fn from_visible(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::None }
    }

    /// The opposite visibility.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Visible => Self::None,
            Self::None => Self::Visible,
        }
    }
}

/// Source type tag; only `GeoJSON` sources are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Inline `GeoJSON` data.
    Geojson,
}

/// A `GeoJSON` data source, registered by name or embedded in a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonSource {
    /// Always [`SourceKind::Geojson`].
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// The data itself.
    pub data: GeoJson,
}

impl GeoJsonSource {
    /// Wraps `data` as a `GeoJSON` source.
    #[must_use]
    pub const fn new(data: GeoJson) -> Self {
        Self {
            kind: SourceKind::Geojson,
            data,
        }
    }

    /// Number of features if the data is a collection, 1 for a single
    /// feature or geometry.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        match &self.data {
            GeoJson::FeatureCollection(fc) => fc.features.len(),
            GeoJson::Feature(_) | GeoJson::Geometry(_) => 1,
        }
    }
}

/// Where a layer reads its data from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerSource {
    /// A source registered on the surface under this name.
    Named(String),
    /// Data embedded in the layer itself.
    Inline(GeoJsonSource),
}

/// A named, typed rendering unit registered against the map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Unique layer identifier.
    pub id: String,
    /// Rendering type.
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Data source.
    pub source: LayerSource,
    /// Paint properties (colors, opacity, widths).
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub paint: JsonObject,
    /// Layout properties (visibility, text fields).
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub layout: JsonObject,
    /// Layer is hidden below this zoom.
    #[serde(default, rename = "minzoom", skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    /// Layer is hidden at and above this zoom.
    #[serde(default, rename = "maxzoom", skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
}

impl LayerSpec {
    /// Creates a layer with no paint or layout properties.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: LayerKind, source: LayerSource) -> Self {
        Self {
            id: id.into(),
            kind,
            source,
            paint: JsonObject::new(),
            layout: JsonObject::new(),
            min_zoom: None,
            max_zoom: None,
        }
    }

    /// Sets a paint property.
    #[must_use]
    pub fn paint(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.paint.insert(key.to_string(), value.into());
        self
    }

    /// Sets a layout property.
    #[must_use]
    pub fn layout(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.layout.insert(key.to_string(), value.into());
        self
    }

    /// Restricts the layer to the zoom band `[min, max)`.
    #[must_use]
    pub const fn zoom_range(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = Some(min);
        self.max_zoom = Some(max);
        self
    }

    /// Sets the initial layout visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.set_visibility(visibility);
        self
    }

    /// Current layout visibility; layers without the property are visible.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.layout
            .get("visibility")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Sets the layout visibility.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.layout.insert(
            "visibility".to_string(),
            serde_json::Value::String(visibility.to_string()),
        );
    }

    /// Whether the zoom band admits `zoom`.
    #[must_use]
    pub fn in_zoom_range(&self, zoom: f64) -> bool {
        self.min_zoom.is_none_or(|min| zoom >= min) && self.max_zoom.is_none_or(|max| zoom < max)
    }

    /// Whether the layer would actually be drawn at `zoom`.
    #[must_use]
    pub fn is_rendered_at(&self, zoom: f64) -> bool {
        self.visibility() == Visibility::Visible && self.in_zoom_range(zoom)
    }
}

/// An axis-aligned geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    /// Minimum longitude.
    pub west: f64,
    /// Minimum latitude.
    pub south: f64,
    /// Maximum longitude.
    pub east: f64,
    /// Maximum latitude.
    pub north: f64,
}

impl LngLatBounds {
    /// Creates bounds from `[min_lng, min_lat]` and `[max_lng, max_lat]`.
    #[must_use]
    pub const fn from_corners(min: [f64; 2], max: [f64; 2]) -> Self {
        Self {
            west: min[0],
            south: min[1],
            east: max[0],
            north: max[1],
        }
    }
}

/// Camera position of the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Centre as `[lng, lat]`.
    pub center: [f64; 2],
    /// Zoom level.
    pub zoom: f64,
}

impl Viewport {
    /// Returns the viewport that fits `bounds` inside a `width`×`height`
    /// pixel canvas with `padding` pixels on every side, using Web
    /// Mercator. Zoom is clamped to `[0, MAX_ZOOM]`.
    #[must_use]
    pub fn fit(bounds: &LngLatBounds, padding: f64, width: f64, height: f64) -> Self {
        let (x0, y0) = project(bounds.west, bounds.north);
        let (x1, y1) = project(bounds.east, bounds.south);
        let center = unproject(f64::midpoint(x0, x1), f64::midpoint(y0, y1));

        let span_x = (x1 - x0).abs() * TILE_SIZE;
        let span_y = (y1 - y0).abs() * TILE_SIZE;
        let avail_x = (2.0f64.mul_add(-padding, width)).max(1.0);
        let avail_y = (2.0f64.mul_add(-padding, height)).max(1.0);

        let zoom = if span_x <= 0.0 && span_y <= 0.0 {
            MAX_ZOOM
        } else {
            let scale_x = if span_x > 0.0 { avail_x / span_x } else { f64::INFINITY };
            let scale_y = if span_y > 0.0 { avail_y / span_y } else { f64::INFINITY };
            scale_x.min(scale_y).log2()
        };

        Self {
            center,
            zoom: zoom.clamp(0.0, MAX_ZOOM),
        }
    }
}

/// Projects `(lng, lat)` to normalized Web Mercator `[0, 1]` space.
fn project(lng: f64, lat: f64) -> (f64, f64) {
    let x = (lng + 180.0) / 360.0;
    let lat = lat.clamp(-85.051_128_78, 85.051_128_78).to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn unproject(x: f64, y: f64) -> [f64; 2] {
    let lng = x.mul_add(360.0, -180.0);
    let lat = (PI * 2.0f64.mul_add(-y, 1.0)).sinh().atan().to_degrees();
    [lng, lat]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> LayerSpec {
        LayerSpec::new("border", LayerKind::Line, LayerSource::Named("src".to_string()))
    }

    #[test]
    fn serializes_in_style_spec_shape() {
        let spec = layer()
            .paint("line-color", "#FF0000")
            .zoom_range(10.5, 20.0)
            .with_visibility(Visibility::None);

        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["type"], "line");
        assert_eq!(json["source"], "src");
        assert_eq!(json["minzoom"], 10.5);
        assert_eq!(json["maxzoom"], 20.0);
        assert_eq!(json["layout"]["visibility"], "none");
        assert_eq!(json["paint"]["line-color"], "#FF0000");
    }

    #[test]
    fn omits_empty_paint_and_zoom() {
        let json = serde_json::to_value(layer()).unwrap();
        assert!(json.get("paint").is_none());
        assert!(json.get("minzoom").is_none());
    }

    #[test]
    fn layers_default_to_visible() {
        let mut spec = layer();
        assert_eq!(spec.visibility(), Visibility::Visible);
        spec.set_visibility(Visibility::None);
        assert_eq!(spec.visibility(), Visibility::None);
        assert_eq!(spec.visibility().toggled(), Visibility::Visible);
    }

    #[test]
    fn zoom_band_excludes_far_and_extreme_close_views() {
        let spec = layer().zoom_range(10.5, 20.0);

        assert!(!spec.is_rendered_at(9.0));
        assert!(spec.is_rendered_at(10.5));
        assert!(spec.is_rendered_at(15.0));
        assert!(!spec.is_rendered_at(20.0));
        assert!(!spec.is_rendered_at(21.5));
    }

    #[test]
    fn fit_centres_on_bounds() {
        let bounds = LngLatBounds::from_corners([-87.7, 41.8], [-87.6, 41.9]);

        let viewport = Viewport::fit(&bounds, 20.0, 1024.0, 768.0);

        assert!((viewport.center[0] - -87.65).abs() < 1e-9);
        assert!((viewport.center[1] - 41.85).abs() < 0.01);
        assert!(viewport.zoom > 10.0 && viewport.zoom < 14.0);
    }

    #[test]
    fn smaller_bounds_zoom_further_in() {
        let wide = LngLatBounds::from_corners([-88.0, 41.5], [-87.0, 42.5]);
        let narrow = LngLatBounds::from_corners([-87.61, 41.87], [-87.60, 41.88]);

        let wide_zoom = Viewport::fit(&wide, 20.0, 1024.0, 768.0).zoom;
        let narrow_zoom = Viewport::fit(&narrow, 20.0, 1024.0, 768.0).zoom;

        assert!(narrow_zoom > wide_zoom);
    }

    #[test]
    fn point_bounds_zoom_to_max() {
        let point = LngLatBounds::from_corners([-87.6, 41.8], [-87.6, 41.8]);
        assert!((Viewport::fit(&point, 20.0, 800.0, 600.0).zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }
}
