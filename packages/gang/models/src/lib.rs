#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gang territory boundary types.
//!
//! Defines the TOML schema for the boundary data source, the raw Esri
//! feature shape returned by `ArcGIS` query endpoints, and the normalized
//! [`GangTerritory`] / [`GangDataset`] produced after conversion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single `[lng, lat]` coordinate pair.
pub type Position = [f64; 2];

/// A linear ring. Closed rings repeat their first position at the end.
pub type Ring = Vec<Position>;

/// Where gang boundary polygons are fetched from, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySourceConfig {
    /// `ArcGIS` `FeatureServer`/`MapServer` query URL (up to `.../query`).
    pub query_url: String,
    /// Attribute key holding the gang name (e.g. `"GANG_NAME"`).
    pub name_field: String,
    /// Maximum records to request per page (default: 1000).
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl BoundarySourceConfig {
    /// Page size used when none is configured.
    pub const DEFAULT_PAGE_SIZE: u32 = 1000;

    /// Returns the configured page size or [`Self::DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE)
    }
}

/// Esri JSON polygon geometry (`{ "rings": [[[x, y], ...], ...] }`).
///
/// Positions may carry extra ordinates (z/m); only the first two are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsriGeometry {
    /// Ring coordinate lists, not guaranteed to be closed.
    #[serde(default)]
    pub rings: Option<Vec<Vec<Vec<f64>>>>,
}

/// One feature from an `ArcGIS` `f=json` query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBoundaryFeature {
    /// Source attributes, including the gang-name field.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Polygon geometry, absent for features without a shape.
    #[serde(default)]
    pub geometry: Option<EsriGeometry>,
}

/// A named polygonal region attributed to a gang.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GangTerritory {
    /// Gang name taken from the configured name field.
    pub name: String,
    /// All source attributes plus a derived `gangName` entry.
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Explicitly closed rings (first position equals last).
    pub rings: Vec<Ring>,
}

impl GangTerritory {
    /// Returns the name with every non-alphanumeric character replaced by
    /// `_`, suitable for use inside layer identifiers.
    #[must_use]
    pub fn sanitized_name(&self) -> String {
        sanitize_name(&self.name)
    }
}

/// Replaces every non-ASCII-alphanumeric character with `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// All territories of one boundary fetch, keyed by gang name.
///
/// Fetched at most once per session and cached by the map layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GangDataset {
    territories: BTreeMap<String, GangTerritory>,
}

impl GangDataset {
    /// Builds a dataset, merging the rings of territories that share a
    /// name. The first territory's attributes win.
    #[must_use]
    pub fn from_territories(territories: impl IntoIterator<Item = GangTerritory>) -> Self {
        let mut map: BTreeMap<String, GangTerritory> = BTreeMap::new();

        for territory in territories {
            match map.get_mut(&territory.name) {
                Some(existing) => existing.rings.extend(territory.rings),
                None => {
                    map.insert(territory.name.clone(), territory);
                }
            }
        }

        Self { territories: map }
    }

    /// Looks up a territory by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GangTerritory> {
        self.territories.get(name)
    }

    /// Gang names in ascending order, for populating a selector.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.territories.keys().map(String::as_str).collect()
    }

    /// Iterates territories in name order.
    pub fn iter(&self) -> impl Iterator<Item = &GangTerritory> {
        self.territories.values()
    }

    /// Number of distinct territories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    /// Whether the dataset holds no territories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }
}
