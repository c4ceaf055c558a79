//! Wiring a city definition into a live map session.

use std::time::Duration;

use crime_grid_crime_models::DisplayMode;
use crime_grid_map::{DatasetCache, FilterState, GangHighlighter, InMemorySurface, MapSession};
use crime_grid_map_models::Viewport;
use crime_grid_source::city_def::CityDefinition;

const USER_AGENT: &str = concat!("crime_grid/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every fetcher.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(120))
        .build()
}

/// Gang dataset cache for `city`; unavailable when the city publishes no
/// gang boundaries.
pub fn gang_cache(city: &CityDefinition, client: reqwest::Client) -> DatasetCache {
    match city.boundary_source(client) {
        Ok(source) => DatasetCache::new(source),
        Err(e) => {
            log::info!("{e}");
            DatasetCache::unavailable()
        }
    }
}

/// Builds an uninitialized session for `city` on a headless surface.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_session(
    city: &CityDefinition,
    mode: DisplayMode,
) -> Result<MapSession<InMemorySurface>, reqwest::Error> {
    let client = http_client()?;
    let surface = InMemorySurface::new(Viewport {
        center: city.center,
        zoom: city.zoom,
    });
    let filter = FilterState::new(city.defaults.year, city.defaults.crime_type.clone(), mode);

    Ok(MapSession::new(
        surface,
        city.incident_source(client.clone()),
        GangHighlighter::new(gang_cache(city, client)),
        filter,
    ))
}
