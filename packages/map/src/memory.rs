//! A [`MapSurface`] that keeps its style in memory.
//!
//! Used as the headless surface for the CLI and as the test double for the
//! controllers. [`InMemorySurface::to_style`] dumps the current state as a
//! MapLibre style document that a browser map can load directly.

use std::collections::BTreeMap;

use crime_grid_map_models::{
    GeoJsonSource, LayerSource, LayerSpec, LngLatBounds, MAX_ZOOM, Viewport, Visibility,
};
use serde_json::json;

use crate::surface::{MapSurface, SurfaceError};

/// Default canvas size used for fit-to-bounds.
const DEFAULT_CANVAS: (f64, f64) = (1024.0, 768.0);

/// Headless map surface.
#[derive(Debug, Clone)]
pub struct InMemorySurface {
    sources: BTreeMap<String, GeoJsonSource>,
    layers: Vec<LayerSpec>,
    viewport: Viewport,
    canvas: (f64, f64),
}

impl InMemorySurface {
    /// Creates an empty surface looking at `viewport`.
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self {
            sources: BTreeMap::new(),
            layers: Vec::new(),
            viewport,
            canvas: DEFAULT_CANVAS,
        }
    }

    /// Sets the pixel size used when fitting bounds.
    #[must_use]
    pub const fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas = (width, height);
        self
    }

    /// Layers in draw order.
    #[must_use]
    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Layer ids in draw order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    /// Looks up a layer.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Looks up a source.
    #[must_use]
    pub fn source(&self, id: &str) -> Option<&GeoJsonSource> {
        self.sources.get(id)
    }

    /// Current camera.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Simulates the user zooming; clamps to the supported range.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.viewport.zoom = zoom.clamp(0.0, MAX_ZOOM);
        self.viewport.zoom
    }

    /// Serializes sources, layers, and camera as a MapLibre style document.
    #[must_use]
    pub fn to_style(&self) -> serde_json::Value {
        json!({
            "version": 8,
            "center": self.viewport.center,
            "zoom": self.viewport.zoom,
            "sources": self.sources,
            "layers": self.layers,
        })
    }
}

impl MapSurface for InMemorySurface {
    fn set_source(&mut self, id: &str, source: GeoJsonSource) {
        log::debug!(
            "Source '{id}' set with {} features",
            source.feature_count()
        );
        self.sources.insert(id.to_string(), source);
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError> {
        if self.has_layer(&layer.id) {
            return Err(SurfaceError::DuplicateLayer { id: layer.id });
        }
        if let LayerSource::Named(source) = &layer.source {
            if !self.sources.contains_key(source) {
                return Err(SurfaceError::UnknownSource { id: source.clone() });
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<LayerSpec, SurfaceError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SurfaceError::UnknownLayer { id: id.to_string() })?;
        Ok(self.layers.remove(index))
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn set_visibility(&mut self, id: &str, visibility: Visibility) -> Result<(), SurfaceError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| SurfaceError::UnknownLayer { id: id.to_string() })?;
        layer.set_visibility(visibility);
        Ok(())
    }

    fn visibility(&self, id: &str) -> Option<Visibility> {
        self.layer(id).map(LayerSpec::visibility)
    }

    fn fit_bounds(&mut self, bounds: LngLatBounds, padding: f64) {
        let (width, height) = self.canvas;
        self.viewport = Viewport::fit(&bounds, padding, width, height);
        log::debug!(
            "Viewport fit to {bounds:?}: center={:?} zoom={:.2}",
            self.viewport.center,
            self.viewport.zoom
        );
    }

    fn zoom(&self) -> f64 {
        self.viewport.zoom
    }
}

#[cfg(test)]
mod tests {
    use crime_grid_map_models::LayerKind;
    use geojson::{FeatureCollection, GeoJson};

    use super::*;

    fn surface() -> InMemorySurface {
        InMemorySurface::new(Viewport {
            center: [-87.6298, 41.8781],
            zoom: 10.5,
        })
    }

    fn empty_source() -> GeoJsonSource {
        GeoJsonSource::new(GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        }))
    }

    fn named(id: &str) -> LayerSpec {
        LayerSpec::new(id, LayerKind::Circle, LayerSource::Named("data".to_string()))
    }

    #[test]
    fn rejects_duplicate_layer_ids() {
        let mut map = surface();
        map.set_source("data", empty_source());
        map.add_layer(named("pins")).unwrap();

        assert_eq!(
            map.add_layer(named("pins")),
            Err(SurfaceError::DuplicateLayer {
                id: "pins".to_string()
            })
        );
        assert_eq!(map.layer_ids(), vec!["pins"]);
    }

    #[test]
    fn rejects_layers_on_missing_sources() {
        let mut map = surface();
        assert!(matches!(
            map.add_layer(named("pins")),
            Err(SurfaceError::UnknownSource { .. })
        ));
    }

    #[test]
    fn removing_unknown_layer_fails() {
        let mut map = surface();
        assert!(matches!(
            map.remove_layer("nope"),
            Err(SurfaceError::UnknownLayer { .. })
        ));
        assert!(map.set_visibility("nope", Visibility::None).is_err());
        assert_eq!(map.visibility("nope"), None);
    }

    #[test]
    fn style_lists_sources_and_layers() {
        let mut map = surface();
        map.set_source("data", empty_source());
        map.add_layer(named("pins").with_visibility(Visibility::None))
            .unwrap();

        let style = map.to_style();

        assert_eq!(style["version"], 8);
        assert_eq!(style["sources"]["data"]["type"], "geojson");
        assert_eq!(style["layers"][0]["id"], "pins");
        assert_eq!(style["layers"][0]["layout"]["visibility"], "none");
        assert_eq!(style["zoom"], 10.5);
    }

    #[test]
    fn set_zoom_clamps() {
        let mut map = surface();
        assert!((map.set_zoom(30.0) - MAX_ZOOM).abs() < f64::EPSILON);
        assert!(map.set_zoom(-1.0).abs() < f64::EPSILON);
    }
}
