//! UI binding: selector events in, controller calls out.

use crime_grid_crime_models::{DisplayMode, FilterOptions, LoadSummary};
use crime_grid_source::IncidentSource;
use crime_grid_source::socrata::discover_options;

use crate::MapError;
use crate::filter::{FilterState, Refresh};
use crate::highlight::GangHighlighter;
use crate::layers::LayerController;
use crate::surface::MapSurface;

/// A change made on the UI surface.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    YearSelected(i32),
    CrimeTypeSelected(String),
    DisplayModeSelected(DisplayMode),
    /// `None` clears the gang selection.
    GangSelected(Option<String>),
    /// The viewport zoom changed.
    ZoomChanged(f64),
    /// Flip the layer for the current display mode on or off.
    ToggleDisplay,
}

/// Owns the surface and every controller for one map session.
pub struct MapSession<M: MapSurface> {
    surface: M,
    incidents: Box<dyn IncidentSource>,
    filter: FilterState,
    layers: LayerController,
    gangs: GangHighlighter,
    options: FilterOptions,
    gang_names: Vec<String>,
}

impl<M: MapSurface> MapSession<M> {
    /// Creates a session. `filter` carries the preferred initial selection,
    /// which [`initialize`](Self::initialize) adjusts to what the data
    /// offers.
    #[must_use]
    pub fn new(
        surface: M,
        incidents: impl IncidentSource + 'static,
        gangs: GangHighlighter,
        filter: FilterState,
    ) -> Self {
        let layers = LayerController::new(filter.display_mode());
        Self {
            surface,
            incidents: Box::new(incidents),
            filter,
            layers,
            gangs,
            options: FilterOptions::default(),
            gang_names: Vec::new(),
        }
    }

    /// Discovers the selectable years and crime types, settles on the
    /// initial selection, draws it, and loads the gang names.
    ///
    /// A failed option sample is logged and leaves the selectors empty;
    /// the preferred year and crime type are then drawn as-is. A failed
    /// gang dataset fetch is logged and leaves the gang list empty.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Surface`] if the surface rejects a layer.
    #[allow(clippy::future_not_send)]
    pub async fn initialize(&mut self) -> Result<(), MapError> {
        self.options = match self.incidents.fetch_sample().await {
            Ok(sample) => discover_options(&sample),
            Err(e) => {
                log::warn!("{}: filter selectors left empty: {e}", self.incidents.id());
                FilterOptions::default()
            }
        };
        log::info!(
            "{}: {} years, {} crime types available",
            self.incidents.id(),
            self.options.years.len(),
            self.options.crime_types.len()
        );

        let year = self
            .options
            .default_year(self.filter.year())
            .unwrap_or_else(|| self.filter.year());
        let crime_type = self
            .options
            .default_crime_type(self.filter.crime_type())
            .unwrap_or_else(|| self.filter.crime_type())
            .to_string();
        self.filter = FilterState::new(year, crime_type, self.filter.display_mode());

        self.layers.on_zoom(self.surface.zoom());
        self.refresh(Refresh::Refetch(self.filter.query())).await?;

        self.gang_names = match self.gangs.gang_names().await {
            Ok(names) => names,
            Err(e) => {
                log::warn!("Gang selector left empty: {e}");
                Vec::new()
            }
        };

        Ok(())
    }

    /// Applies one UI event.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Surface`] if the surface rejects a layer change.
    /// Fetch failures are logged and leave the map unchanged.
    #[allow(clippy::future_not_send)]
    pub async fn handle(&mut self, event: UiEvent) -> Result<(), MapError> {
        log::debug!("UI event: {event:?}");
        match event {
            UiEvent::YearSelected(year) => {
                let refresh = self.filter.set_year(year);
                self.refresh(refresh).await?;
            }
            UiEvent::CrimeTypeSelected(crime_type) => {
                let refresh = self.filter.set_crime_type(crime_type);
                self.refresh(refresh).await?;
            }
            UiEvent::DisplayModeSelected(mode) => {
                let refresh = self.filter.set_display_mode(mode);
                self.refresh(refresh).await?;
            }
            UiEvent::GangSelected(Some(name)) => {
                self.gangs.highlight(&mut self.surface, &name).await?;
                self.layers.on_zoom(self.surface.zoom());
            }
            UiEvent::GangSelected(None) => self.gangs.clear(&mut self.surface),
            UiEvent::ZoomChanged(zoom) => {
                self.layers.on_zoom(zoom);
            }
            UiEvent::ToggleDisplay => {
                self.layers.toggle_display(&mut self.surface)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::future_not_send)]
    async fn refresh(&mut self, refresh: Refresh) -> Result<(), MapError> {
        match refresh {
            Refresh::Refetch(query) => {
                self.layers
                    .load(&mut self.surface, self.incidents.as_ref(), query)
                    .await?;
            }
            Refresh::Visibility(mode) => {
                self.layers.apply_display_mode(&mut self.surface, mode)?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn surface(&self) -> &M {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    #[must_use]
    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Years and crime types offered by the selectors.
    #[must_use]
    pub const fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Names offered by the gang selector.
    #[must_use]
    pub fn gang_names(&self) -> &[String] {
        &self.gang_names
    }

    #[must_use]
    pub const fn layers(&self) -> &LayerController {
        &self.layers
    }

    #[must_use]
    pub const fn highlighter(&self) -> &GangHighlighter {
        &self.gangs
    }

    /// Counts readout for what the map currently shows.
    #[must_use]
    pub const fn summary(&self) -> Option<&LoadSummary> {
        self.layers.summary()
    }
}
