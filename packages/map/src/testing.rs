//! Fakes shared by the controller tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crime_grid_crime_models::{CoordinateValue, IncidentQuery, IncidentRecord};
use crime_grid_gang_models::{EsriGeometry, RawBoundaryFeature};
use crime_grid_map_models::Viewport;
use crime_grid_source::{BoundarySource, IncidentSource, SourceError};

use crate::memory::InMemorySurface;

pub fn surface() -> InMemorySurface {
    InMemorySurface::new(Viewport {
        center: [-87.6298, 41.8781],
        zoom: 10.5,
    })
}

pub fn record(crime_type: &str, date: &str) -> IncidentRecord {
    IncidentRecord {
        primary_type: crime_type.to_string(),
        date: Some(date.to_string()),
        longitude: Some(CoordinateValue::from("-87.62")),
        latitude: Some(CoordinateValue::from("41.88")),
    }
}

/// Open clockwise square ring with its lower-left corner at `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> Vec<Vec<f64>> {
    vec![
        vec![x, y],
        vec![x, y + size],
        vec![x + size, y + size],
        vec![x + size, y],
    ]
}

pub fn boundary(name: &str, rings: Vec<Vec<Vec<f64>>>) -> RawBoundaryFeature {
    let mut attributes = serde_json::Map::new();
    attributes.insert("GANG_NAME".to_string(), name.into());
    RawBoundaryFeature {
        attributes,
        geometry: Some(EsriGeometry { rings: Some(rings) }),
    }
}

/// "Gang A" is a single square; "Gang B" has two separate parts.
pub fn gang_boundaries() -> Vec<RawBoundaryFeature> {
    vec![
        boundary("Gang A", vec![square(-87.70, 41.80, 0.02)]),
        boundary(
            "Gang B",
            vec![square(-87.60, 41.90, 0.01), square(-87.55, 41.95, 0.01)],
        ),
    ]
}

pub struct FakeBoundaries {
    pub calls: Arc<AtomicUsize>,
    pub failures_left: AtomicUsize,
    pub features: Vec<RawBoundaryFeature>,
}

impl FakeBoundaries {
    pub fn new(features: Vec<RawBoundaryFeature>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            failures_left: AtomicUsize::new(0),
            features,
        }
    }

    pub fn failing(times: usize) -> Self {
        let fake = Self::new(gang_boundaries());
        fake.failures_left.store(times, Ordering::SeqCst);
        fake
    }
}

#[async_trait]
impl BoundarySource for FakeBoundaries {
    fn name_field(&self) -> &str {
        "GANG_NAME"
    }

    async fn fetch_boundaries(&self) -> Result<Vec<RawBoundaryFeature>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(SourceError::Upstream {
                message: "service down".to_string(),
            });
        }
        Ok(self.features.clone())
    }
}

/// Serves `sample` for option discovery and filters it per query.
pub struct FakeIncidents {
    pub sample: Vec<IncidentRecord>,
    pub queries: Arc<Mutex<Vec<IncidentQuery>>>,
    pub fail: bool,
}

impl FakeIncidents {
    pub fn new(sample: Vec<IncidentRecord>) -> Self {
        Self {
            sample,
            queries: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }
}

#[async_trait]
impl IncidentSource for FakeIncidents {
    fn id(&self) -> &str {
        "fake"
    }

    async fn fetch_incidents(
        &self,
        query: &IncidentQuery,
    ) -> Result<Vec<IncidentRecord>, SourceError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(SourceError::Upstream {
                message: "service down".to_string(),
            });
        }
        Ok(self
            .sample
            .iter()
            .filter(|r| r.primary_type == query.crime_type)
            .filter(|r| {
                r.date
                    .as_deref()
                    .is_some_and(|d| d.starts_with(&query.year.to_string()))
            })
            .cloned()
            .collect())
    }

    async fn fetch_sample(&self) -> Result<Vec<IncidentRecord>, SourceError> {
        if self.fail {
            return Err(SourceError::Upstream {
                message: "service down".to_string(),
            });
        }
        Ok(self.sample.clone())
    }
}
