#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident record, filter, and display mode types.
//!
//! These are the plain data types shared by the incident fetchers, the
//! geometry converter, and the map layer controller. Raw rows arrive from
//! the city open-data portal with loosely typed coordinates, so
//! [`IncidentRecord`] keeps them as [`CoordinateValue`] until conversion.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A coordinate as it appears in a raw incident row.
///
/// Socrata serializes numbers as strings, but other portals emit real JSON
/// numbers, so both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    /// A JSON number.
    Number(f64),
    /// A numeric string (e.g. `"-87.62"`).
    Text(String),
}

impl CoordinateValue {
    /// Returns the numeric value, or `None` if the text is not a finite
    /// number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CoordinateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A single raw incident row as fetched from the incident data source.
///
/// Created per fetch response and discarded on the next fetch. Rows with a
/// missing or non-numeric coordinate are kept here and dropped later by the
/// geometry converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Source crime type (e.g. `"THEFT"`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_type: String,
    /// Raw timestamp string as provided by the source.
    #[serde(default)]
    pub date: Option<String>,
    /// Longitude, possibly missing or malformed.
    #[serde(default)]
    pub longitude: Option<CoordinateValue>,
    /// Latitude, possibly missing or malformed.
    #[serde(default)]
    pub latitude: Option<CoordinateValue>,
}

impl IncidentRecord {
    /// Returns `(longitude, latitude)` when both are present and numeric.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lng = self.longitude.as_ref()?.as_f64()?;
        let lat = self.latitude.as_ref()?.as_f64()?;
        Some((lng, lat))
    }

    /// Whether this record survives geometry conversion.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which incident layer is shown on the map.
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
pub enum DisplayMode {
    /// Density heatmap of all incidents.
    #[default]
    Heatmap,
    /// One circle per incident.
    Pins,
    /// Both incident layers hidden.
    None,
}

impl DisplayMode {
    /// All selectable modes, in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Heatmap, Self::Pins, Self::None]
    }
}

/// The `(year, crime type)` pair an incident fetch is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQuery {
    /// Calendar year.
    pub year: i32,
    /// Source crime type, matched exactly.
    pub crime_type: String,
}

/// Counts readout produced after each successful incident load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// Year that was loaded.
    pub year: i32,
    /// Crime type that was loaded.
    pub crime_type: String,
    /// Number of incidents drawn on the map.
    pub count: usize,
}

/// The distinct years and crime types available for selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Distinct years, ascending.
    pub years: Vec<i32>,
    /// Distinct crime types, ascending.
    pub crime_types: Vec<String>,
}

impl FilterOptions {
    /// Collects distinct, sorted years and crime types from
    /// `(year, crime_type)` pairs. Missing years and empty types are
    /// skipped.
    pub fn collect<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<i32>, &'a str)>,
    {
        let mut years = BTreeSet::new();
        let mut crime_types = BTreeSet::new();

        for (year, crime_type) in pairs {
            if let Some(year) = year {
                years.insert(year);
            }
            if !crime_type.is_empty() {
                crime_types.insert(crime_type.to_string());
            }
        }

        Self {
            years: years.into_iter().collect(),
            crime_types: crime_types.into_iter().collect(),
        }
    }

    /// Returns `preferred` if it is an available year, otherwise the latest
    /// available year.
    #[must_use]
    pub fn default_year(&self, preferred: i32) -> Option<i32> {
        if self.years.contains(&preferred) {
            Some(preferred)
        } else {
            self.years.last().copied()
        }
    }

    /// Returns `preferred` if it is an available crime type, otherwise the
    /// first one alphabetically.
    #[must_use]
    pub fn default_crime_type(&self, preferred: &str) -> Option<&str> {
        self.crime_types
            .iter()
            .find(|t| t.as_str() == preferred)
            .or_else(|| self.crime_types.first())
            .map(String::as_str)
    }
}
