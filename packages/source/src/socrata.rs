//! Socrata SODA incident fetcher.
//!
//! Builds a SoQL request selecting the type, date, and coordinate columns,
//! scoped with `$where` to one year and one crime type, and capped with
//! `$limit`. The same request without `$where` serves as the sample used
//! to discover which filters can be selected.

use async_trait::async_trait;
use crime_grid_crime_models::{FilterOptions, IncidentQuery, IncidentRecord};

use crate::city_def::{IncidentApiConfig, IncidentColumns};
use crate::parsing::{coordinate_from_json, record_year};
use crate::retry::{self, RetryPolicy};
use crate::{IncidentSource, SourceError};

/// Incident fetcher for one Socrata dataset.
#[derive(Debug)]
pub struct SocrataIncidentSource {
    client: reqwest::Client,
    id: String,
    config: IncidentApiConfig,
    retry: RetryPolicy,
}

impl SocrataIncidentSource {
    /// Creates a fetcher with the default [`RetryPolicy`].
    #[must_use]
    pub fn new(client: reqwest::Client, id: String, config: IncidentApiConfig) -> Self {
        Self {
            client,
            id,
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

    /// The `$select` clause listing the four mapped columns.
    #[must_use]
    pub fn select_clause(&self) -> String {
        let c = &self.config.columns;
        format!("{},{},{},{}", c.primary_type, c.date, c.longitude, c.latitude)
    }

    /// The `$where` clause restricting rows to `query`.
    #[must_use]
    pub fn where_clause(&self, query: &IncidentQuery) -> String {
        let c = &self.config.columns;
        let year = c.year.as_ref().map_or_else(
            || format!("date_extract_y({})={}", c.date, query.year),
            |column| format!("{column}={}", query.year),
        );
        format!(
            "{year} AND {}='{}'",
            c.primary_type,
            escape_soql_string(&query.crime_type)
        )
    }

    /// Builds the request for `query`, or the unfiltered sample request
    /// when `query` is `None`.
    #[must_use]
    pub fn request(&self, query: Option<&IncidentQuery>) -> reqwest::RequestBuilder {
        let mut params = vec![
            ("$select", self.select_clause()),
            ("$limit", self.config.limit.to_string()),
        ];
        if let Some(query) = query {
            params.push(("$where", self.where_clause(query)));
        }
        self.client.get(&self.config.api_url).query(&params)
    }

    async fn fetch_rows(
        &self,
        query: Option<&IncidentQuery>,
    ) -> Result<Vec<IncidentRecord>, SourceError> {
        let body = retry::send_json(&self.retry, || self.request(query)).await?;
        let records = records_from_body(&body, &self.config.columns)?;
        log::info!("{}: fetched {} incident rows", self.id, records.len());
        Ok(records)
    }
}

#[async_trait]
impl IncidentSource for SocrataIncidentSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_incidents(
        &self,
        query: &IncidentQuery,
    ) -> Result<Vec<IncidentRecord>, SourceError> {
        log::info!(
            "{}: fetching {} incidents for {}",
            self.id,
            query.crime_type,
            query.year
        );
        self.fetch_rows(Some(query)).await
    }

    async fn fetch_sample(&self) -> Result<Vec<IncidentRecord>, SourceError> {
        log::info!("{}: fetching filter option sample", self.id);
        self.fetch_rows(None).await
    }
}

/// Maps a Socrata response body (a JSON array of row objects) to records.
///
/// # Errors
///
/// Returns [`SourceError::Upstream`] if the body is not an array, which is
/// how Socrata reports query errors.
pub fn records_from_body(
    body: &serde_json::Value,
    columns: &IncidentColumns,
) -> Result<Vec<IncidentRecord>, SourceError> {
    let rows = body.as_array().ok_or_else(|| SourceError::Upstream {
        message: body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Socrata response is not an array")
            .to_string(),
    })?;

    Ok(rows.iter().map(|row| record_from_row(row, columns)).collect())
}

/// Maps one Socrata row onto an [`IncidentRecord`] using the configured
/// column names. Missing columns become `None`/empty.
#[must_use]
pub fn record_from_row(row: &serde_json::Value, columns: &IncidentColumns) -> IncidentRecord {
    IncidentRecord {
        primary_type: row
            .get(&columns.primary_type)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string(),
        date: row
            .get(&columns.date)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        longitude: row.get(&columns.longitude).and_then(coordinate_from_json),
        latitude: row.get(&columns.latitude).and_then(coordinate_from_json),
    }
}

/// Derives the selectable years and crime types from a sample, ignoring
/// rows that could not be drawn.
#[must_use]
pub fn discover_options(records: &[IncidentRecord]) -> FilterOptions {
    FilterOptions::collect(
        records
            .iter()
            .filter(|r| r.has_coordinates())
            .map(|r| (record_year(r), r.primary_type.as_str())),
    )
}

/// Escapes a value for use inside a single-quoted SoQL string literal.
#[must_use]
pub fn escape_soql_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(year_column: Option<&str>) -> SocrataIncidentSource {
        SocrataIncidentSource::new(
            reqwest::Client::new(),
            "chicago".to_string(),
            IncidentApiConfig {
                api_url: "https://data.cityofchicago.org/resource/ijzp-q8t2.json".to_string(),
                limit: 50_000,
                columns: IncidentColumns {
                    year: year_column.map(str::to_string),
                    ..IncidentColumns::default()
                },
            },
        )
    }

    fn query() -> IncidentQuery {
        IncidentQuery {
            year: 2023,
            crime_type: "HOMICIDE".to_string(),
        }
    }

    fn param(request: &reqwest::Request, key: &str) -> Option<String> {
        request
            .url()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn builds_scoped_request() {
        let request = source(Some("year"))
            .request(Some(&query()))
            .build()
            .unwrap();

        assert_eq!(
            param(&request, "$select").as_deref(),
            Some("primary_type,date,longitude,latitude")
        );
        assert_eq!(
            param(&request, "$where").as_deref(),
            Some("year=2023 AND primary_type='HOMICIDE'")
        );
        assert_eq!(param(&request, "$limit").as_deref(), Some("50000"));
    }

    #[test]
    fn extracts_year_from_date_without_year_column() {
        assert_eq!(
            source(None).where_clause(&query()),
            "date_extract_y(date)=2023 AND primary_type='HOMICIDE'"
        );
    }

    #[test]
    fn sample_request_has_no_where() {
        let request = source(None).request(None).build().unwrap();
        assert!(param(&request, "$where").is_none());
        assert!(param(&request, "$select").is_some());
    }

    #[test]
    fn escapes_quotes_in_crime_type() {
        let q = IncidentQuery {
            year: 2020,
            crime_type: "O'HARE THEFT".to_string(),
        };
        assert!(source(Some("year")).where_clause(&q).ends_with("'O''HARE THEFT'"));
    }

    #[test]
    fn maps_rows_with_custom_columns() {
        let columns = IncidentColumns {
            primary_type: "crm_cd_desc".to_string(),
            date: "date_occ".to_string(),
            longitude: "lon".to_string(),
            latitude: "lat".to_string(),
            year: None,
        };
        let body = serde_json::json!([
            { "crm_cd_desc": "ROBBERY", "date_occ": "2023-01-02T00:00:00.000", "lon": "-118.2", "lat": "34.0" },
            { "crm_cd_desc": "ROBBERY" },
        ]);

        let records = records_from_body(&body, &columns).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].coordinates(), Some((-118.2, 34.0)));
        assert!(records[1].date.is_none());
        assert!(!records[1].has_coordinates());
    }

    #[test]
    fn reports_socrata_error_objects() {
        let body = serde_json::json!({ "error": true, "message": "Unrecognized arguments [$foo]" });
        let err = records_from_body(&body, &IncidentColumns::default()).unwrap_err();
        assert!(err.to_string().contains("Unrecognized arguments"));
    }

    #[test]
    fn discovers_options_from_drawable_rows() {
        let body = serde_json::json!([
            { "primary_type": "THEFT", "date": "2024-03-01T00:00:00.000", "longitude": "-87.6", "latitude": "41.8" },
            { "primary_type": "ARSON", "date": "2022-03-01T00:00:00.000", "longitude": "-87.6", "latitude": "41.8" },
            { "primary_type": "BATTERY", "date": "2019-03-01T00:00:00.000", "longitude": null, "latitude": "41.8" },
        ]);
        let records = records_from_body(&body, &IncidentColumns::default()).unwrap();

        let options = discover_options(&records);

        assert_eq!(options.years, vec![2022, 2024]);
        assert_eq!(options.crime_types, vec!["ARSON", "THEFT"]);
    }
}
