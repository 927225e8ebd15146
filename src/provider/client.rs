//! The async HTTP client for the forecast provider.
//!
//! Catalog and download calls fail fast with a [`ProviderError`]; the
//! station-measurement call alone follows this I/O layer's documented
//! convention of returning an empty result set on any failure.

use crate::epoch::{FIVE_DAYS_IN_MS, HOUR_IN_MS};
use crate::provider::config::ProviderConfig;
use crate::provider::error::ProviderError;
use crate::provider::types::{
    extract_absolute_sum, ForecastModel, ForecastRegion, ForecastSample, RawRegion, StationMeasure,
};
use bon::bon;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Every provider response wraps its payload in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct MeasureSet {
    results: Option<Vec<RawMeasure>>,
}

#[derive(Debug, Deserialize)]
struct RawMeasure {
    datetime: Option<i64>,
    precipitation: Option<Value>,
}

/// Target frequency of forecast downloads: hourly, in epoch ms.
const DOWNLOAD_FREQUENCY_MS: i64 = HOUR_IN_MS;

/// Variable id of precipitation in the station-measure API.
const PRECIPITATION_VARIABLE_ID: i64 = 34;

/// Client for the forecast provider's catalog, download and measurement
/// endpoints.
///
/// # Example
///
/// ```no_run
/// # use blendcast::{ForecastApi, ProviderError};
/// # async fn run() -> Result<(), ProviderError> {
/// let api = ForecastApi::from_env()?;
/// let models = api.models().call().await?;
/// for model in &models {
///     let runs = api.run_datetimes(model.id).await?;
///     println!("{}: {} runs available", model.name, runs.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ForecastApi {
    http: Client,
    config: ProviderConfig,
}

#[bon]
impl ForecastApi {
    /// Builds a client around an explicit configuration.
    ///
    /// # Errors
    ///
    /// [`ProviderError::ClientBuild`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ProviderError::ClientBuild)?;
        Ok(Self { http, config })
    }

    /// Builds a client from the environment (see
    /// [`ProviderConfig::from_env`]).
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(ProviderConfig::from_env()?)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ProviderError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .header("authorization", &self.config.authorization)
            .header("api_key", &self.config.api_key)
            .query(query)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                url: url.clone(),
                source,
            })?;
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(source) => {
                return Err(match source.status() {
                    Some(status) => ProviderError::HttpStatus {
                        url,
                        status,
                        source,
                    },
                    None => ProviderError::Request { url, source },
                })
            }
        };
        let envelope: Envelope<T> =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Decode { url, source })?;
        Ok(envelope.data)
    }

    /// Downloads the model catalog, optionally keeping only the models
    /// whose alias appears in `alias_filter`.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures surface as
    /// [`ProviderError`]; a catalog without a payload is
    /// [`ProviderError::EmptyPayload`].
    #[builder]
    pub async fn models(
        &self,
        alias_filter: Option<Vec<String>>,
    ) -> Result<Vec<ForecastModel>, ProviderError> {
        let path = "/forecast-models";
        let all: Vec<ForecastModel> =
            self.get_data(path, &[])
                .await?
                .ok_or_else(|| ProviderError::EmptyPayload {
                    url: format!("{}{}", self.config.base_url, path),
                })?;
        let models = match alias_filter {
            Some(aliases) => all
                .into_iter()
                .filter(|model| aliases.iter().any(|alias| alias == &model.alias))
                .collect(),
            None => all,
        };
        info!("model catalog holds {} models", models.len());
        Ok(models)
    }

    /// Downloads the region catalog, keeping only active regions that
    /// carry a measuring station, sorted by name.
    pub async fn regions(&self) -> Result<Vec<ForecastRegion>, ProviderError> {
        let path = "/manage/forecast-regions";
        let raw: Vec<RawRegion> =
            self.get_data(path, &[])
                .await?
                .ok_or_else(|| ProviderError::EmptyPayload {
                    url: format!("{}{}", self.config.base_url, path),
                })?;
        let mut regions: Vec<ForecastRegion> = raw
            .into_iter()
            .filter(|region| !region.inactive)
            .filter_map(|region| {
                region.station_id.map(|station_id| ForecastRegion {
                    id: region.id,
                    name: region.name,
                    station_id,
                })
            })
            .collect();
        regions.sort_by(|a, b| a.name.cmp(&b.name));
        info!("region catalog holds {} usable regions", regions.len());
        Ok(regions)
    }

    /// Lists the run timestamps (epoch ms) available for a model. A
    /// missing payload means no runs.
    pub async fn run_datetimes(&self, model_id: i64) -> Result<Vec<i64>, ProviderError> {
        let runs: Option<Vec<i64>> = self
            .get_data(
                "/forecasts/run-datetimes",
                &[("model_id", model_id.to_string())],
            )
            .await?;
        Ok(runs.unwrap_or_default())
    }

    /// Downloads one model run's hourly precipitation forecast for the
    /// five-day window starting at `run_datetime`. A response without a
    /// payload yields an empty row set, this layer's empty-result
    /// convention.
    #[builder]
    pub async fn download_forecasts(
        &self,
        model_id: i64,
        region_id: i64,
        run_datetime: i64,
    ) -> Result<Vec<ForecastSample>, ProviderError> {
        let path = format!("/forecast-models/{model_id}/download");
        let samples: Option<Vec<ForecastSample>> = self
            .get_data(
                &path,
                &[
                    ("region_id", region_id.to_string()),
                    ("run_datetime", run_datetime.to_string()),
                    ("datetimeStart", run_datetime.to_string()),
                    ("datetimeEnd", (run_datetime + FIVE_DAYS_IN_MS).to_string()),
                    ("precipitation", "abs".to_string()),
                    ("frequency", DOWNLOAD_FREQUENCY_MS.to_string()),
                ],
            )
            .await?;
        Ok(samples.unwrap_or_default())
    }

    /// Retrieves observed station precipitation sums for a time range.
    ///
    /// On any failure (transport, status, malformed body) this returns an
    /// empty result set and logs the cause, matching the provider I/O
    /// convention; rows without a timestamp or a usable precipitation
    /// value are dropped.
    #[builder]
    pub async fn station_measures(
        &self,
        datetime_start: i64,
        datetime_end: i64,
        station_ids: Vec<i64>,
    ) -> Vec<StationMeasure> {
        match self
            .try_station_measures(datetime_start, datetime_end, station_ids)
            .await
        {
            Ok(measures) => measures,
            Err(err) => {
                warn!("station measures request failed, returning an empty result set: {err}");
                Vec::new()
            }
        }
    }

    async fn try_station_measures(
        &self,
        datetime_start: i64,
        datetime_end: i64,
        station_ids: Vec<i64>,
    ) -> Result<Vec<StationMeasure>, ProviderError> {
        let url = format!("{}/stations/measures", self.config.base_url);
        debug!("POST {url}");
        let body = json!({
            "datetime_start": datetime_start,
            "datetime_end": datetime_end,
            "station_ids": station_ids,
            "variables": [{"variable_id": PRECIPITATION_VARIABLE_ID, "operations": ["sum"]}],
        });
        let response = self
            .http
            .post(&url)
            .header("authorization", &self.config.authorization)
            .header("api_key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                url: url.clone(),
                source,
            })?
            .error_for_status()
            .map_err(|source| ProviderError::Request {
                url: url.clone(),
                source,
            })?;
        let envelope: Envelope<Vec<MeasureSet>> =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Decode {
                    url: url.clone(),
                    source,
                })?;
        let rows = envelope
            .data
            .and_then(|sets| sets.into_iter().next())
            .and_then(|set| set.results)
            .unwrap_or_default();
        let measures: Vec<StationMeasure> = rows
            .into_iter()
            .filter_map(|row| {
                let datetime = row.datetime?;
                let precipitation_obs = extract_absolute_sum(row.precipitation.as_ref()?)?;
                Some(StationMeasure {
                    datetime,
                    precipitation_obs,
                })
            })
            .collect();
        info!("retrieved {} station measures", measures.len());
        Ok(measures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_an_explicit_config() {
        let api = ForecastApi::new(ProviderConfig::new("http://localhost:9", "auth", "key"));
        assert!(api.is_ok());
    }

    #[test]
    fn measure_envelope_shapes_deserialize() {
        let payload = serde_json::json!({
            "data": [{
                "results": [
                    {"datetime": 1000, "precipitation": {"abs": "0.4"}},
                    {"datetime": 2000, "precipitation": 1.5},
                    {"datetime": null, "precipitation": 2.0},
                ]
            }]
        });
        let envelope: Envelope<Vec<MeasureSet>> = serde_json::from_value(payload).unwrap();
        let rows = envelope.data.unwrap().remove(0).results.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].datetime, None);
        assert_eq!(
            extract_absolute_sum(rows[0].precipitation.as_ref().unwrap()),
            Some(0.4)
        );
    }
}
