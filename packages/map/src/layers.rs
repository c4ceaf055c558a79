//! Incident layers: loading, supersession, and display mode.
//!
//! Every year or crime type change starts a new load. Loads are numbered;
//! when a fetch resolves, its result is applied only if no newer load was
//! started in the meantime, so a slow response can never overwrite a newer
//! one. A failed load leaves whatever was on the map untouched.
//!
//! Applying a load swaps the whole point collection in with a single
//! [`MapSurface::set_source`] call. The heatmap and pin layers are created
//! on the first load and reused afterwards.

use crime_grid_crime_models::{DisplayMode, IncidentQuery, IncidentRecord, LoadSummary};
use crime_grid_geometry::to_point_collection;
use crime_grid_map_models::{GeoJsonSource, LayerKind, LayerSource, LayerSpec, Visibility};
use crime_grid_source::parsing::matches_query;
use crime_grid_source::{IncidentSource, SourceError};
use geojson::GeoJson;

use crate::surface::{MapSurface, SurfaceError};

/// Source id the incident point collection is registered under.
pub const INCIDENT_SOURCE_ID: &str = "crime-data";

/// Id of the incident heatmap layer.
pub const HEATMAP_LAYER_ID: &str = "heatmap";

/// Id of the incident pin layer.
pub const PINS_LAYER_ID: &str = "pins";

/// Where the controller is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No load has succeeded and none is in flight.
    Uninitialized,
    /// A load is in flight.
    Loading,
    /// The incident layers show a completed load.
    Ready,
}

/// Handle for one in-flight load, returned by
/// [`LayerController::begin_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    query: IncidentQuery,
}

impl LoadTicket {
    /// The query this load fetches.
    #[must_use]
    pub const fn query(&self) -> &IncidentQuery {
        &self.query
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`LayerController::complete_load`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result was drawn.
    Applied(LoadSummary),
    /// A newer load was started; the result was discarded.
    Stale,
    /// The fetch failed; the map was left as it was.
    Failed,
}

/// Keeps the incident source and layers in sync with the filter.
#[derive(Debug)]
pub struct LayerController {
    state: LoadState,
    generation: u64,
    display_mode: DisplayMode,
    summary: Option<LoadSummary>,
    zoom_readout: String,
}

impl LayerController {
    #[must_use]
    pub const fn new(display_mode: DisplayMode) -> Self {
        Self {
            state: LoadState::Uninitialized,
            generation: 0,
            display_mode,
            summary: None,
            zoom_readout: String::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> LoadState {
        self.state
    }

    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Counts readout for the last applied load.
    #[must_use]
    pub const fn summary(&self) -> Option<&LoadSummary> {
        self.summary.as_ref()
    }

    /// Zoom readout, two decimals; empty until the first zoom event.
    #[must_use]
    pub fn zoom_readout(&self) -> &str {
        &self.zoom_readout
    }

    /// Starts a load for `query`, superseding any load still in flight.
    pub fn begin_load(&mut self, query: IncidentQuery) -> LoadTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        log::debug!(
            "Load #{}: {} {}",
            self.generation,
            query.year,
            query.crime_type
        );
        LoadTicket {
            generation: self.generation,
            query,
        }
    }

    /// Applies the result of a load started with [`begin_load`].
    ///
    /// Rows that do not match the ticket's year and crime type are dropped
    /// before conversion, as are rows without coordinates.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface rejects a layer.
    ///
    /// [`begin_load`]: Self::begin_load
    pub fn complete_load<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        ticket: LoadTicket,
        result: Result<Vec<IncidentRecord>, SourceError>,
    ) -> Result<LoadOutcome, SurfaceError> {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding load #{} superseded by #{}",
                ticket.generation,
                self.generation
            );
            return Ok(LoadOutcome::Stale);
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                log::error!(
                    "Error loading {} incidents for {}: {e}",
                    ticket.query.crime_type,
                    ticket.query.year
                );
                self.state = if self.summary.is_some() {
                    LoadState::Ready
                } else {
                    LoadState::Uninitialized
                };
                return Ok(LoadOutcome::Failed);
            }
        };

        let fetched = records.len();
        let records: Vec<IncidentRecord> = records
            .into_iter()
            .filter(|r| matches_query(r, &ticket.query))
            .collect();
        if records.len() < fetched {
            log::debug!(
                "Dropped {} rows outside {} {}",
                fetched - records.len(),
                ticket.query.year,
                ticket.query.crime_type
            );
        }

        let collection = to_point_collection(&records);
        let count = collection.features.len();

        surface.set_source(
            INCIDENT_SOURCE_ID,
            GeoJsonSource::new(GeoJson::FeatureCollection(collection)),
        );
        self.ensure_layers(surface)?;
        self.apply_display_mode(surface, self.display_mode)?;

        let summary = LoadSummary {
            year: ticket.query.year,
            crime_type: ticket.query.crime_type,
            count,
        };
        log::info!(
            "Showing {} {} incidents for {}",
            summary.count,
            summary.crime_type,
            summary.year
        );
        self.summary = Some(summary.clone());
        self.state = LoadState::Ready;

        Ok(LoadOutcome::Applied(summary))
    }

    /// Fetches `query` from `source` and applies the result.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface rejects a layer. Fetch
    /// failures are logged and reported as [`LoadOutcome::Failed`].
    #[allow(clippy::future_not_send)]
    pub async fn load<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        source: &dyn IncidentSource,
        query: IncidentQuery,
    ) -> Result<LoadOutcome, SurfaceError> {
        let ticket = self.begin_load(query);
        let result = source.fetch_incidents(ticket.query()).await;
        self.complete_load(surface, ticket, result)
    }

    fn ensure_layers<M: MapSurface + ?Sized>(&self, surface: &mut M) -> Result<(), SurfaceError> {
        if !surface.has_layer(HEATMAP_LAYER_ID) {
            surface.add_layer(
                LayerSpec::new(
                    HEATMAP_LAYER_ID,
                    LayerKind::Heatmap,
                    LayerSource::Named(INCIDENT_SOURCE_ID.to_string()),
                )
                .with_visibility(visibility_for(self.display_mode, DisplayMode::Heatmap)),
            )?;
        }
        if !surface.has_layer(PINS_LAYER_ID) {
            surface.add_layer(
                LayerSpec::new(
                    PINS_LAYER_ID,
                    LayerKind::Circle,
                    LayerSource::Named(INCIDENT_SOURCE_ID.to_string()),
                )
                .paint("circle-radius", 4)
                .paint("circle-color", "#B42222")
                .with_visibility(visibility_for(self.display_mode, DisplayMode::Pins)),
            )?;
        }
        Ok(())
    }

    /// Shows the layer for `mode` and hides the other; `none` hides both.
    /// Layers that do not exist yet pick the mode up when created.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface rejects the change.
    pub fn apply_display_mode<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        mode: DisplayMode,
    ) -> Result<(), SurfaceError> {
        self.display_mode = mode;
        for (layer, owner) in [
            (HEATMAP_LAYER_ID, DisplayMode::Heatmap),
            (PINS_LAYER_ID, DisplayMode::Pins),
        ] {
            if surface.has_layer(layer) {
                surface.set_visibility(layer, visibility_for(mode, owner))?;
            }
        }
        Ok(())
    }

    /// Flips the visibility of the layer belonging to the current display
    /// mode. Returns the new visibility, or `None` if that layer does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface rejects the change.
    pub fn toggle_display<M: MapSurface + ?Sized>(
        &self,
        surface: &mut M,
    ) -> Result<Option<Visibility>, SurfaceError> {
        let id = self.display_mode.as_ref();
        let Some(current) = surface.visibility(id) else {
            log::info!("Layer {id} does not exist");
            return Ok(None);
        };
        let next = current.toggled();
        surface.set_visibility(id, next)?;
        Ok(Some(next))
    }

    /// Mirrors a viewport zoom change into the readout.
    pub fn on_zoom(&mut self, zoom: f64) -> &str {
        self.zoom_readout = format!("{zoom:.2}");
        &self.zoom_readout
    }
}

fn visibility_for(mode: DisplayMode, owner: DisplayMode) -> Visibility {
    Visibility::from_visible(mode == owner)
}
