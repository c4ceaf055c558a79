//! City registry: loads all city definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/cities/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a city means creating a
//! TOML file and adding it to the list below.

use crate::SourceError;
use crate::city_def::{CityDefinition, parse_city_toml};

/// City used when neither the CLI nor the environment selects one.
pub const DEFAULT_CITY_ID: &str = "chicago";

/// Environment variable consulted when no `--city` flag is given.
pub const CITY_ENV_VAR: &str = "CRIME_GRID_CITY";

/// Number of registered cities. Enforced by a test.
#[cfg(test)]
const EXPECTED_CITY_COUNT: usize = 3;

/// TOML configs embedded at compile time.
const CITY_TOMLS: &[(&str, &str)] = &[
    ("chicago", include_str!("../cities/chicago.toml")),
    ("los_angeles", include_str!("../cities/los_angeles.toml")),
    ("new_york", include_str!("../cities/new_york.toml")),
];

/// Returns all registered cities.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are compile-time
/// constants, so a parse failure is a development error caught by tests.
#[must_use]
pub fn all_cities() -> Vec<CityDefinition> {
    CITY_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            parse_city_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse city config '{name}': {e}"))
        })
        .collect()
}

/// Looks up a city by identifier.
#[must_use]
pub fn find_city(id: &str) -> Option<CityDefinition> {
    all_cities().into_iter().find(|c| c.id == id)
}

/// Resolves the city to show: the CLI value if given, otherwise the
/// [`CITY_ENV_VAR`] environment variable, otherwise [`DEFAULT_CITY_ID`].
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the selected id is not registered.
pub fn selected_city(cli_city: Option<String>) -> Result<CityDefinition, SourceError> {
    resolve_city(cli_city, std::env::var(CITY_ENV_VAR).ok())
}

fn resolve_city(
    cli_city: Option<String>,
    env_city: Option<String>,
) -> Result<CityDefinition, SourceError> {
    let id = [cli_city, env_city]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CITY_ID.to_string());

    find_city(&id).ok_or_else(|| SourceError::Config {
        message: format!(
            "Unknown city '{id}'. Available: {}",
            all_cities()
                .iter()
                .map(CityDefinition::id)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_cities() {
        let cities = all_cities();
        assert_eq!(
            cities.len(),
            EXPECTED_CITY_COUNT,
            "Expected {EXPECTED_CITY_COUNT} cities, found {}. \
             Update EXPECTED_CITY_COUNT after adding/removing cities.",
            cities.len()
        );
    }

    #[test]
    fn city_ids_are_unique_and_match_keys() {
        let mut seen = BTreeSet::new();
        for ((key, _), city) in CITY_TOMLS.iter().zip(all_cities()) {
            assert_eq!(*key, city.id, "Registry key does not match TOML id");
            assert!(seen.insert(city.id.clone()), "Duplicate city ID: {}", city.id);
        }
    }

    #[test]
    fn all_cities_have_required_fields() {
        for city in &all_cities() {
            assert!(!city.name.is_empty(), "City {} has empty name", city.id);
            assert!(
                city.incidents.api_url.starts_with("https://"),
                "City {} has non-https incident URL",
                city.id
            );
            assert!(city.incidents.limit > 0, "City {} has zero limit", city.id);
            assert!(
                (-180.0..=180.0).contains(&city.center[0])
                    && (-90.0..=90.0).contains(&city.center[1]),
                "City {} has invalid center",
                city.id
            );
            assert!(
                !city.defaults.crime_type.is_empty(),
                "City {} has empty default crime type",
                city.id
            );
        }
    }

    #[test]
    fn chicago_has_gang_boundaries() {
        let chicago = find_city("chicago").unwrap();
        let boundaries = chicago.gang_boundaries.unwrap();
        assert_eq!(boundaries.name_field, "GANG_NAME");
        assert_eq!(chicago.defaults.year, 2023);
        assert_eq!(chicago.defaults.crime_type, "HOMICIDE");
        assert_eq!(chicago.incidents.columns.year.as_deref(), Some("year"));
    }

    #[test]
    fn explicit_city_wins_and_unknown_is_rejected() {
        assert_eq!(
            selected_city(Some("new_york".to_string())).unwrap().id,
            "new_york"
        );
        assert!(selected_city(Some("atlantis".to_string())).is_err());
    }

    #[test]
    fn environment_city_applies_without_flag() {
        let city = resolve_city(None, Some("los_angeles".to_string())).unwrap();
        assert_eq!(city.id, "los_angeles");

        let city = resolve_city(Some("new_york".to_string()), Some("los_angeles".to_string()))
            .unwrap();
        assert_eq!(city.id, "new_york");
    }

    #[test]
    fn defaults_to_chicago() {
        assert_eq!(resolve_city(None, None).unwrap().id, DEFAULT_CITY_ID);
        assert_eq!(
            resolve_city(Some("  ".to_string()), Some(String::new())).unwrap().id,
            DEFAULT_CITY_ID
        );
    }

    #[test]
    fn blank_flag_falls_through_to_environment() {
        let city = resolve_city(Some(" ".to_string()), Some("new_york".to_string())).unwrap();
        assert_eq!(city.id, "new_york");
    }
}
