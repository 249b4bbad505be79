// SPDX-License-Identifier: Apache-2.0

use crate::error::GatewayError;
use async_trait::async_trait;
use bima_dash_model::{Coordinates, WeatherLookup};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

pub const ARCHIVE_PATH: &str = "/v1/archive";
pub const DAILY_VARIABLE: &str = "precipitation_sum";

#[async_trait]
pub trait WeatherArchive: Send + Sync + 'static {
    /// Daily precipitation for `[start, end]` at `coords`.
    async fn daily_precipitation(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherLookup, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timezone: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://archive-api.open-meteo.com".to_string(),
            timezone: "Africa/Nairobi".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    daily: Option<ArchiveDaily>,
}

#[derive(Debug, Deserialize, Default)]
struct ArchiveDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

/// Open-Meteo style historical archive client.
pub struct OpenMeteoArchive {
    config: WeatherConfig,
    client: reqwest::Client,
}

impl OpenMeteoArchive {
    #[must_use]
    pub fn new(config: WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }
}

#[async_trait]
impl WeatherArchive for OpenMeteoArchive {
    #[instrument(name = "weather_daily_precipitation", skip(self))]
    async fn daily_precipitation(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherLookup, GatewayError> {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            ARCHIVE_PATH
        );
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coords.lat.to_string()),
                ("longitude", coords.lng.to_string()),
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
                ("daily", DAILY_VARIABLE.to_string()),
                ("timezone", self.config.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::transport(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::status(status.as_u16(), &url));
        }
        let body: ArchiveResponse = resp.json().await.map_err(GatewayError::decode)?;
        let daily = body.daily.unwrap_or_default();
        Ok(WeatherLookup::from_columns(
            &daily.time,
            &daily.precipitation_sum,
        ))
    }
}
