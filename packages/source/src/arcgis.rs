//! `ArcGIS` `FeatureServer` / `MapServer` boundary fetcher.
//!
//! Queries an `ArcGIS` REST endpoint with `f=json` so geometries come back
//! as Esri rings in WGS84 (`outSR=4326`). Paginates via `resultOffset`
//! while the server reports `exceededTransferLimit`.

use async_trait::async_trait;
use crime_grid_gang_models::{BoundarySourceConfig, RawBoundaryFeature};

use crate::retry::{self, RetryPolicy};
use crate::{BoundarySource, SourceError};

/// Gang boundary fetcher for one `ArcGIS` layer.
#[derive(Debug)]
pub struct ArcGisBoundarySource {
    client: reqwest::Client,
    config: BoundarySourceConfig,
    retry: RetryPolicy,
}

impl ArcGisBoundarySource {
    /// Creates a fetcher with the default [`RetryPolicy`].
    #[must_use]
    pub fn new(client: reqwest::Client, config: BoundarySourceConfig) -> Self {
        Self {
            client,
            config,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builds the query request for the page starting at `offset`.
    #[must_use]
    pub fn page_request(&self, offset: u32) -> reqwest::RequestBuilder {
        self.client.get(&self.config.query_url).query(&[
            ("where", "1=1".to_string()),
            ("outFields", "*".to_string()),
            ("outSR", "4326".to_string()),
            ("f", "json".to_string()),
            ("returnGeometry", "true".to_string()),
            ("resultRecordCount", self.config.page_size().to_string()),
            ("resultOffset", offset.to_string()),
        ])
    }
}

#[async_trait]
impl BoundarySource for ArcGisBoundarySource {
    fn name_field(&self) -> &str {
        &self.config.name_field
    }

    async fn fetch_boundaries(&self) -> Result<Vec<RawBoundaryFeature>, SourceError> {
        let mut all_features = Vec::new();
        let mut offset = 0u32;

        loop {
            log::info!("Gang boundaries: offset={offset}");
            let body = retry::send_json(&self.retry, || self.page_request(offset)).await?;
            let page = parse_page(&body)?;

            if page.features.is_empty() {
                break;
            }

            #[allow(clippy::cast_possible_truncation)]
            {
                offset += page.features.len() as u32;
            }
            all_features.extend(page.features);

            if !page.exceeded_transfer_limit {
                break;
            }
        }

        log::info!("Gang boundaries: {} features fetched", all_features.len());
        Ok(all_features)
    }
}

/// One decoded page of an `ArcGIS` query response.
#[derive(Debug)]
pub struct BoundaryPage {
    /// Features on this page.
    pub features: Vec<RawBoundaryFeature>,
    /// Whether more records exist beyond this page.
    pub exceeded_transfer_limit: bool,
}

/// Decodes an `ArcGIS` query response body.
///
/// # Errors
///
/// Returns [`SourceError::Upstream`] if the body carries an `error` object
/// or has no `features` array, and [`SourceError::Json`] if a feature does
/// not match the expected shape.
pub fn parse_page(body: &serde_json::Value) -> Result<BoundaryPage, SourceError> {
    if let Some(error) = body.get("error") {
        return Err(SourceError::Upstream {
            message: format!(
                "ArcGIS API error: {}",
                error
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown error")
            ),
        });
    }

    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| SourceError::Upstream {
            message: "No features array in ArcGIS response".to_string(),
        })?
        .iter()
        .cloned()
        .map(serde_json::from_value)
        .collect::<Result<Vec<RawBoundaryFeature>, _>>()?;

    let exceeded_transfer_limit = body
        .get("exceededTransferLimit")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    Ok(BoundaryPage {
        features,
        exceeded_transfer_limit,
    })
}
