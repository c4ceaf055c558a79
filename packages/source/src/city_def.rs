//! Config-driven city definition.
//!
//! [`CityDefinition`] captures everything unique about a city's map: where
//! the viewport starts, which filter selection is shown first, where
//! incident rows come from, and (optionally) where gang territories come
//! from. A single generic Socrata/`ArcGIS` implementation serves every city.

use crime_grid_gang_models::BoundarySourceConfig;
use serde::Deserialize;

use crate::SourceError;
use crate::arcgis::ArcGisBoundarySource;
use crate::socrata::SocrataIncidentSource;

/// A complete, config-driven city definition.
///
/// Loaded from TOML files at compile time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityDefinition {
    /// Unique identifier (e.g., `"chicago"`).
    pub id: String,
    /// Human-readable name (e.g., `"Chicago, IL"`).
    pub name: String,
    /// Initial map centre as `[lng, lat]`.
    pub center: [f64; 2],
    /// Initial map zoom.
    pub zoom: f64,
    /// Filter selection shown before the user picks anything.
    pub defaults: CityDefaults,
    /// Socrata incident endpoint.
    pub incidents: IncidentApiConfig,
    /// Gang boundary endpoint, for cities that publish one.
    #[serde(default)]
    pub gang_boundaries: Option<BoundarySourceConfig>,
}

/// Initial filter selection for a city.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CityDefaults {
    /// Preferred initial year.
    pub year: i32,
    /// Preferred initial crime type.
    pub crime_type: String,
}

/// Socrata SODA endpoint for incident rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncidentApiConfig {
    /// Resource URL (e.g., `"https://data.cityofchicago.org/resource/ijzp-q8t2.json"`).
    pub api_url: String,
    /// Maximum rows per request (`$limit`).
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Column names in the source dataset.
    #[serde(default)]
    pub columns: IncidentColumns,
}

const fn default_limit() -> u64 {
    50_000
}

/// Source column names mapped onto [`crime_grid_crime_models::IncidentRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IncidentColumns {
    /// Crime type column.
    pub primary_type: String,
    /// Timestamp column.
    pub date: String,
    /// Longitude column.
    pub longitude: String,
    /// Latitude column.
    pub latitude: String,
    /// Pre-computed year column. When absent the year is extracted from
    /// the timestamp column with `date_extract_y`.
    pub year: Option<String>,
}

impl Default for IncidentColumns {
    fn default() -> Self {
        Self {
            primary_type: "primary_type".to_string(),
            date: "date".to_string(),
            longitude: "longitude".to_string(),
            latitude: "latitude".to_string(),
            year: None,
        }
    }
}

impl CityDefinition {
    /// Returns the city identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable city name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the incident fetcher for this city.
    #[must_use]
    pub fn incident_source(&self, client: reqwest::Client) -> SocrataIncidentSource {
        SocrataIncidentSource::new(client, self.id.clone(), self.incidents.clone())
    }

    /// Builds the gang boundary fetcher for this city.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the city publishes no gang
    /// boundaries.
    pub fn boundary_source(
        &self,
        client: reqwest::Client,
    ) -> Result<ArcGisBoundarySource, SourceError> {
        let config = self
            .gang_boundaries
            .clone()
            .ok_or_else(|| SourceError::Config {
                message: format!("City '{}' has no gang boundary source", self.id),
            })?;
        Ok(ArcGisBoundarySource::new(client, config))
    }
}

/// Parses a city definition from TOML.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or missing
/// required fields.
pub fn parse_city_toml(toml_str: &str) -> Result<CityDefinition, SourceError> {
    toml::from_str(toml_str).map_err(|e| SourceError::Config {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
id = "testville"
name = "Testville, ZZ"
center = [-80.0, 40.0]
zoom = 11.0

[defaults]
year = 2020
crime_type = "THEFT"

[incidents]
api_url = "https://data.example.com/resource/abcd-1234.json"
"#;

    #[test]
    fn applies_column_and_limit_defaults() {
        let city = parse_city_toml(MINIMAL).unwrap();

        assert_eq!(city.incidents.limit, 50_000);
        assert_eq!(city.incidents.columns, IncidentColumns::default());
        assert!(city.gang_boundaries.is_none());
    }

    #[test]
    fn city_without_boundaries_has_no_boundary_source() {
        let city = parse_city_toml(MINIMAL).unwrap();
        let err = city.boundary_source(reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, SourceError::Config { .. }));
    }

    #[test]
    fn city_with_boundaries_builds_boundary_source() {
        use crate::BoundarySource as _;

        let chicago = crate::registry::find_city("chicago").unwrap();
        let source = chicago.boundary_source(reqwest::Client::new()).unwrap();

        assert_eq!(source.name_field(), "GANG_NAME");
        assert!(format!("{source:?}").contains("GANG_NAME"));
    }

    #[test]
    fn rejects_missing_incidents_block() {
        let err = parse_city_toml("id = \"x\"\nname = \"X\"").unwrap_err();
        assert!(matches!(err, SourceError::Config { .. }));
    }
}
