//! Fetch-once holder for the gang territory dataset.

use crime_grid_gang_models::GangDataset;
use crime_grid_geometry::to_polygon_collection;
use crime_grid_source::BoundarySource;
use tokio::sync::OnceCell;

/// Errors returned by [`DatasetCache::get`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The dataset could not be fetched. The cache is still empty, so the
    /// next call tries again.
    #[error("Gang dataset unavailable: {reason}")]
    DataUnavailable {
        /// Why the fetch failed.
        reason: String,
    },
}

/// Session-scoped cache of the gang dataset.
///
/// The first successful [`get`](Self::get) fetches and converts the
/// boundaries; every later call returns the same dataset without touching
/// the network. Concurrent first calls share one fetch.
pub struct DatasetCache {
    source: Option<Box<dyn BoundarySource>>,
    dataset: OnceCell<GangDataset>,
}

impl DatasetCache {
    /// Creates an empty cache backed by `source`.
    #[must_use]
    pub fn new(source: impl BoundarySource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            dataset: OnceCell::new(),
        }
    }

    /// Creates a cache for a city without gang boundaries; every
    /// [`get`](Self::get) fails with [`CacheError::DataUnavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            source: None,
            dataset: OnceCell::new(),
        }
    }

    /// Returns the dataset, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::DataUnavailable`] if no boundary source is
    /// configured or the fetch fails.
    pub async fn get(&self) -> Result<&GangDataset, CacheError> {
        self.dataset
            .get_or_try_init(|| async {
                let source = self
                    .source
                    .as_deref()
                    .ok_or_else(|| CacheError::DataUnavailable {
                        reason: "no gang boundary source configured".to_string(),
                    })?;

                let features = source.fetch_boundaries().await.map_err(|e| {
                    log::error!("Failed to load gang boundaries: {e}");
                    CacheError::DataUnavailable {
                        reason: e.to_string(),
                    }
                })?;

                let dataset = to_polygon_collection(&features, source.name_field());
                log::info!("Cached {} gang territories", dataset.len());
                Ok(dataset)
            })
            .await
    }

    /// The dataset if it has already been fetched.
    #[must_use]
    pub fn cached(&self) -> Option<&GangDataset> {
        self.dataset.get()
    }
}
