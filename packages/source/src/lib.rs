#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident and gang boundary data sources.
//!
//! Incident rows come from a Socrata SODA endpoint scoped to a
//! `(year, crime type)` pair; gang territories come from an `ArcGIS`
//! `FeatureServer`. Each city is described by a TOML [`city_def`] embedded
//! at compile time, and the map layer talks to both providers through the
//! [`IncidentSource`] and [`BoundarySource`] traits so tests can swap in
//! fakes.

pub mod arcgis;
pub mod city_def;
pub mod parsing;
pub mod registry;
pub mod retry;
pub mod socrata;

use async_trait::async_trait;
use crime_grid_crime_models::{IncidentQuery, IncidentRecord};
use crime_grid_gang_models::RawBoundaryFeature;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// City configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// The upstream API answered with an error status or error body.
    #[error("Upstream error: {message}")]
    Upstream {
        /// Description of what went wrong.
        message: String,
    },
}

/// Provider of raw incident rows.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"chicago"`).
    fn id(&self) -> &str;

    /// Fetches incident rows scoped to `query`.
    ///
    /// Rows are returned as the source provides them; rows without
    /// coordinates are not filtered here.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the body cannot be
    /// decoded.
    async fn fetch_incidents(
        &self,
        query: &IncidentQuery,
    ) -> Result<Vec<IncidentRecord>, SourceError>;

    /// Fetches an unfiltered sample of rows, used to discover which years
    /// and crime types can be selected.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the body cannot be
    /// decoded.
    async fn fetch_sample(&self) -> Result<Vec<IncidentRecord>, SourceError>;
}

/// Provider of raw gang boundary features.
#[async_trait]
pub trait BoundarySource: Send + Sync {
    /// Attribute key holding the gang name in each feature.
    fn name_field(&self) -> &str;

    /// Fetches every boundary feature.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the API reports an
    /// error, or the body cannot be decoded.
    async fn fetch_boundaries(&self) -> Result<Vec<RawBoundaryFeature>, SourceError>;
}
