//! The rendering surface seam.

use crime_grid_map_models::{GeoJsonSource, LayerSpec, LngLatBounds, Visibility};

/// Errors returned by [`MapSurface`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// A layer with this id is already registered.
    #[error("Layer '{id}' already exists")]
    DuplicateLayer {
        /// Offending layer id.
        id: String,
    },

    /// No layer with this id is registered.
    #[error("Layer '{id}' does not exist")]
    UnknownLayer {
        /// Missing layer id.
        id: String,
    },

    /// A layer referenced a named source that is not registered.
    #[error("Source '{id}' does not exist")]
    UnknownSource {
        /// Missing source id.
        id: String,
    },
}

/// A map that accepts named sources and layers and owns the viewport.
///
/// Implementations are driven from a single thread. Adding a layer whose id
/// is already registered is an error; callers remove before they add.
pub trait MapSurface {
    /// Registers `source` under `id`, replacing any existing data in one
    /// step. Layers reading from `id` redraw with the new data.
    fn set_source(&mut self, id: &str, source: GeoJsonSource);

    /// Whether a source named `id` is registered.
    fn has_source(&self, id: &str) -> bool;

    /// Registers a layer.
    ///
    /// # Errors
    ///
    /// * [`SurfaceError::DuplicateLayer`] if the id is taken
    /// * [`SurfaceError::UnknownSource`] if the layer names a missing source
    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError>;

    /// Removes a layer and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::UnknownLayer`] if no such layer exists.
    fn remove_layer(&mut self, id: &str) -> Result<LayerSpec, SurfaceError>;

    /// Whether a layer with `id` is registered.
    fn has_layer(&self, id: &str) -> bool;

    /// Sets a layer's layout visibility.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::UnknownLayer`] if no such layer exists.
    fn set_visibility(&mut self, id: &str, visibility: Visibility) -> Result<(), SurfaceError>;

    /// A layer's layout visibility, or `None` if it does not exist.
    fn visibility(&self, id: &str) -> Option<Visibility>;

    /// Moves the viewport so `bounds` fills the view inset by `padding`
    /// pixels.
    fn fit_bounds(&mut self, bounds: LngLatBounds, padding: f64);

    /// Current zoom level.
    fn zoom(&self) -> f64;
}
