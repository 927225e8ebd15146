//! Async client for the forecast provider's catalogs, downloads and
//! station measurements.

mod client;
mod config;
mod error;
mod types;

pub use client::ForecastApi;
pub use config::{ProviderConfig, API_KEY_VAR, API_URL_VAR, AUTHORIZATION_VAR};
pub use error::ProviderError;
pub use types::{ForecastModel, ForecastRegion, ForecastSample, StationMeasure};
