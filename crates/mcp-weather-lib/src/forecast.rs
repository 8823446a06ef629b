//! Forecast fetcher backed by the Open-Meteo `/v1/forecast` endpoint.
//!
//! The fetcher never fails from the caller's point of view: transport errors,
//! non-2xx statuses and unexpected bodies all collapse into an absent reading.
//! The orchestrator decides how to report missing data.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ForecastSettings;

/// Result of one forecast lookup. `None` is a normal outcome, not an error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForecastReading {
    pub temperature_celsius: Option<f64>,
}

impl ForecastReading {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn celsius(value: f64) -> Self {
        Self {
            temperature_celsius: Some(value),
        }
    }

    /// Temperature rendered for prompts and results, `"unknown"` when absent.
    pub fn temperature_text(&self) -> String {
        match self.temperature_celsius {
            Some(t) => decimal_text(t),
            None => "unknown".to_string(),
        }
    }
}

/// Render a reading or coordinate with at least one fractional digit (`21.0`, not `21`).
pub fn decimal_text(value: f64) -> String {
    format!("{value:?}")
}

/// Internal failure reasons; only ever logged, never returned to callers of [`ForecastProvider`].
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("forecast request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("forecast response has no current.temperature_2m")]
    MissingTemperature,
}

/// Source of current temperature readings.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> ForecastReading;
}

/// Subset of the Open-Meteo response we read. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct ForecastBody {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
}

/// HTTP client for Open-Meteo. Cheap to clone; the inner `reqwest::Client` pools connections.
#[derive(Clone, Debug)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Http`] if the TLS backend cannot be initialised.
    pub fn new(settings: &ForecastSettings) -> Result<Self, ForecastError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn try_fetch(&self, latitude: f64, longitude: f64) -> Result<f64, ForecastError> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!(%url, latitude, longitude, "requesting forecast");

        let body: ForecastBody = self
            .client
            .get(&url)
            .query(&[("latitude", latitude), ("longitude", longitude)])
            .query(&[("current", "temperature_2m")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(?body, "weather API response");

        body.current
            .and_then(|c| c.temperature_2m)
            .ok_or(ForecastError::MissingTemperature)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn fetch(&self, latitude: f64, longitude: f64) -> ForecastReading {
        match self.try_fetch(latitude, longitude).await {
            Ok(t) => ForecastReading::celsius(t),
            Err(err) => {
                warn!(latitude, longitude, error = %err, "no temperature data from API");
                ForecastReading::absent()
            }
        }
    }
}
