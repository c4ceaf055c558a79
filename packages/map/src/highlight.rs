//! Gang territory highlighting.
//!
//! A highlight fits the viewport to one territory and draws a fill, a
//! border, and a centroid label for each of its simple polygons. Every
//! layer id drawn is recorded in an [`ActiveLayerSet`]; the next highlight
//! removes exactly those ids before drawing, so two selections never share
//! the map.

use crime_grid_gang_models::GangTerritory;
use crime_grid_geometry::GANG_NAME_ATTRIBUTE;
use crime_grid_geometry::territory::{bounding_box, label_anchor, polygons, to_feature};
use crime_grid_map_models::{GeoJsonSource, LayerKind, LayerSource, LayerSpec, LngLatBounds};
use geo::Polygon;
use geojson::{Feature, GeoJson};
use serde_json::json;

use crate::cache::{CacheError, DatasetCache};
use crate::surface::{MapSurface, SurfaceError};

/// Paint, zoom band, and padding for highlight layers.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub border_color: String,
    pub border_width: f64,
    /// Borders are hidden below this zoom.
    pub border_min_zoom: f64,
    /// Borders are hidden at and above this zoom.
    pub border_max_zoom: f64,
    pub label_size: f64,
    pub label_color: String,
    /// Pixels left around the territory when fitting the viewport.
    pub fit_padding: f64,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            fill_color: "#888".to_string(),
            fill_opacity: 0.4,
            border_color: "#FF0000".to_string(),
            border_width: 3.0,
            border_min_zoom: 10.5,
            border_max_zoom: 20.0,
            label_size: 16.0,
            label_color: "#000".to_string(),
            fit_padding: 20.0,
        }
    }
}

/// Layer ids currently drawn for a highlight, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLayerSet {
    ids: Vec<String>,
}

impl ActiveLayerSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Tracks `id`. Returns `false` if it was already tracked.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|tracked| tracked == id)
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Removes every tracked layer from `surface` and empties the set.
    /// Layers that have already disappeared from the surface are skipped.
    pub fn remove_all<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        for id in self.ids.drain(..) {
            if let Err(e) = surface.remove_layer(&id) {
                log::debug!("Highlight layer already gone: {e}");
            }
        }
    }
}

/// Draws at most one gang territory at a time.
pub struct GangHighlighter {
    cache: DatasetCache,
    active: ActiveLayerSet,
    style: HighlightStyle,
    selected: Option<String>,
}

impl GangHighlighter {
    #[must_use]
    pub fn new(cache: DatasetCache) -> Self {
        Self::with_style(cache, HighlightStyle::default())
    }

    #[must_use]
    pub fn with_style(cache: DatasetCache, style: HighlightStyle) -> Self {
        Self {
            cache,
            active: ActiveLayerSet::new(),
            style,
            selected: None,
        }
    }

    /// Layers drawn for the current highlight.
    #[must_use]
    pub const fn active(&self) -> &ActiveLayerSet {
        &self.active
    }

    /// Name of the territory currently drawn.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Territory names for the gang selector, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::DataUnavailable`] if the dataset cannot be
    /// fetched.
    pub async fn gang_names(&self) -> Result<Vec<String>, CacheError> {
        let dataset = self.cache.get().await?;
        Ok(dataset.names().into_iter().map(str::to_string).collect())
    }

    /// Highlights the territory called `name`, replacing any previous
    /// highlight. An unknown name, or a dataset that cannot be fetched,
    /// leaves the map with no highlight. Returns whether anything was
    /// drawn.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface rejects a layer. Layers
    /// added before the failure stay tracked and are removed by the next
    /// call.
    #[allow(clippy::future_not_send)]
    pub async fn highlight<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        name: &str,
    ) -> Result<bool, SurfaceError> {
        let dataset = match self.cache.get().await {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                log::warn!("No territories to highlight: {e}");
                None
            }
        };

        self.active.remove_all(surface);
        self.selected = None;

        let Some(territory) = dataset.and_then(|d| d.get(name)) else {
            if !name.is_empty() {
                log::info!("No gang territory named '{name}'");
            }
            return Ok(false);
        };

        if let Some(rect) = bounding_box(territory) {
            surface.fit_bounds(
                LngLatBounds::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
                self.style.fit_padding,
            );
        }

        let prefix = format!("gang-{}", territory.sanitized_name());
        for (index, polygon) in polygons(territory).iter().enumerate() {
            let group = format!("{prefix}-{index}");
            for layer in polygon_layers(&self.style, territory, polygon, &group) {
                let id = layer.id.clone();
                surface.add_layer(layer)?;
                self.active.insert(id);
            }
        }

        log::info!(
            "Highlighted '{}' with {} layers",
            territory.name,
            self.active.len()
        );
        self.selected = Some(territory.name.clone());
        Ok(true)
    }

    /// Removes the current highlight.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        self.active.remove_all(surface);
        self.selected = None;
    }
}

/// Fill, border, and label layers for one simple polygon.
fn polygon_layers(
    style: &HighlightStyle,
    territory: &GangTerritory,
    polygon: &Polygon<f64>,
    prefix: &str,
) -> Vec<LayerSpec> {
    let shape = inline(to_feature(geojson::Value::from(polygon), territory));

    let mut layers = vec![
        LayerSpec::new(format!("{prefix}-fill"), LayerKind::Fill, shape.clone())
            .paint("fill-color", style.fill_color.as_str())
            .paint("fill-opacity", style.fill_opacity),
        LayerSpec::new(format!("{prefix}-border"), LayerKind::Line, shape)
            .paint("line-color", style.border_color.as_str())
            .paint("line-width", style.border_width)
            .zoom_range(style.border_min_zoom, style.border_max_zoom),
    ];

    if let Some(anchor) = label_anchor(polygon) {
        let point = inline(to_feature(geojson::Value::from(&anchor), territory));
        layers.push(
            LayerSpec::new(format!("{prefix}-label"), LayerKind::Symbol, point)
                .layout("text-field", json!(["get", GANG_NAME_ATTRIBUTE]))
                .layout("text-font", json!(["Open Sans Bold", "Arial Unicode MS Bold"]))
                .layout("text-size", style.label_size)
                .layout("text-allow-overlap", true)
                .paint("text-color", style.label_color.as_str()),
        );
    }

    layers
}

fn inline(feature: Feature) -> LayerSource {
    LayerSource::Inline(GeoJsonSource::new(GeoJson::Feature(feature)))
}

#[cfg(test)]
mod tests {
    use crime_grid_map_models::Visibility;

    use crate::memory::InMemorySurface;
    use crate::testing::{FakeBoundaries, gang_boundaries, surface};

    use super::*;

    fn highlighter() -> GangHighlighter {
        GangHighlighter::new(DatasetCache::new(FakeBoundaries::new(gang_boundaries())))
    }

    fn gang_layers(map: &InMemorySurface) -> Vec<&str> {
        map.layer_ids()
            .into_iter()
            .filter(|id| id.starts_with("gang-"))
            .collect()
    }

    #[tokio::test]
    async fn draws_fill_border_and_label_per_polygon() {
        let mut map = surface();
        let mut gangs = highlighter();

        assert!(gangs.highlight(&mut map, "Gang B").await.unwrap());

        assert_eq!(
            gangs.active().ids(),
            [
                "gang-Gang_B-0-fill",
                "gang-Gang_B-0-border",
                "gang-Gang_B-0-label",
                "gang-Gang_B-1-fill",
                "gang-Gang_B-1-border",
                "gang-Gang_B-1-label",
            ]
        );
        assert_eq!(gangs.selected(), Some("Gang B"));

        let border = map.layer("gang-Gang_B-0-border").unwrap();
        assert_eq!(border.min_zoom, Some(10.5));
        assert_eq!(border.max_zoom, Some(20.0));
        assert_eq!(border.paint["line-color"], "#FF0000");

        let fill = map.layer("gang-Gang_B-0-fill").unwrap();
        assert_eq!(fill.paint["fill-opacity"], 0.4);
        assert_eq!(fill.visibility(), Visibility::Visible);

        let label = map.layer("gang-Gang_B-1-label").unwrap();
        assert_eq!(label.layout["text-field"], json!(["get", "gangName"]));
    }

    #[tokio::test]
    async fn fits_viewport_to_territory() {
        let mut map = surface();
        let mut gangs = highlighter();

        gangs.highlight(&mut map, "Gang A").await.unwrap();

        let viewport = map.viewport();
        assert!((viewport.center[0] - -87.69).abs() < 1e-6);
        assert!((viewport.center[1] - 41.81).abs() < 1e-3);
        assert!(viewport.zoom > 12.0);
    }

    #[tokio::test]
    async fn second_highlight_replaces_first() {
        let mut map = surface();
        let mut gangs = highlighter();

        gangs.highlight(&mut map, "Gang A").await.unwrap();
        gangs.highlight(&mut map, "Gang B").await.unwrap();

        assert_eq!(gangs.active().len(), 6);
        assert!(gangs.active().ids().iter().all(|id| id.contains("Gang_B")));
        assert_eq!(gang_layers(&map), gangs.active().ids());
    }

    #[tokio::test]
    async fn repeating_a_highlight_is_idempotent() {
        let mut once = surface();
        let mut gangs = highlighter();
        gangs.highlight(&mut once, "Gang A").await.unwrap();
        let expected = gangs.active().clone();

        let mut twice = surface();
        let mut gangs = highlighter();
        gangs.highlight(&mut twice, "Gang A").await.unwrap();
        gangs.highlight(&mut twice, "Gang A").await.unwrap();

        assert_eq!(gangs.active(), &expected);
        assert_eq!(gang_layers(&twice), gang_layers(&once));
    }

    #[tokio::test]
    async fn unknown_name_clears_previous_highlight() {
        let mut map = surface();
        let mut gangs = highlighter();

        gangs.highlight(&mut map, "Gang A").await.unwrap();
        assert!(!gangs.highlight(&mut map, "Gang Z").await.unwrap());

        assert!(gangs.active().is_empty());
        assert!(gang_layers(&map).is_empty());
        assert_eq!(gangs.selected(), None);
    }

    #[tokio::test]
    async fn unavailable_dataset_is_a_no_op() {
        let mut map = surface();
        let before = map.viewport();
        let mut gangs = GangHighlighter::new(DatasetCache::new(FakeBoundaries::failing(5)));

        assert!(!gangs.highlight(&mut map, "Gang A").await.unwrap());

        assert!(gangs.active().is_empty());
        assert!(map.layers().is_empty());
        assert_eq!(map.viewport(), before);
        assert!(gangs.gang_names().await.is_err());
    }

    #[tokio::test]
    async fn does_not_touch_untracked_layers() {
        let mut map = surface();
        map.set_source(
            "other",
            GeoJsonSource::new(GeoJson::FeatureCollection(geojson::FeatureCollection {
                bbox: None,
                features: vec![],
                foreign_members: None,
            })),
        );
        map.add_layer(LayerSpec::new(
            "gang-manual",
            LayerKind::Fill,
            LayerSource::Named("other".to_string()),
        ))
        .unwrap();
        let mut gangs = highlighter();

        gangs.highlight(&mut map, "Gang A").await.unwrap();
        gangs.clear(&mut map);

        assert_eq!(map.layer_ids(), vec!["gang-manual"]);
    }

    #[tokio::test]
    async fn lists_gang_names() {
        assert_eq!(
            highlighter().gang_names().await.unwrap(),
            vec!["Gang A".to_string(), "Gang B".to_string()]
        );
    }

    #[test]
    fn active_set_rejects_duplicates() {
        let mut set = ActiveLayerSet::new();
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert_eq!(set.len(), 1);
    }
}
