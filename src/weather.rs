//! Destination weather lookup
//!
//! Weather is cosmetic: any failure here degrades to an absent snapshot at
//! the planner level, and missing response fields are replaced with
//! placeholders instead of failing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::WeatherConfig;
use crate::error::{PlanError, Result};
use crate::models::{Coordinate, WeatherSnapshot};

/// Placeholder used when the response carries no description
const NO_DESCRIPTION: &str = "no description";

/// Fetches current conditions for a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, point: &Coordinate) -> Result<WeatherSnapshot>;
}

/// OpenWeatherMap current-conditions client
pub struct OpenWeatherClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("roadtrip/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, point: &Coordinate) -> Result<WeatherSnapshot> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PlanError::WeatherUnavailable("OPENWEATHER_API_KEY is not set".to_string())
        })?;

        debug!("Fetching weather for ({:.4}, {:.4})", point.lat, point.lon);
        let url = format!(
            "{}?lat={}&lon={}&units=metric&lang=en&appid={}",
            self.base_url, point.lat, point.lon, api_key
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PlanError::WeatherUnavailable(format!("weather request failed: {e}")))?;

        let payload: WeatherResponse = response.json().await.map_err(|e| {
            PlanError::WeatherUnavailable(format!("weather response unreadable: {e}"))
        })?;

        Ok(snapshot_from(payload))
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    main: Option<MainReadings>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: Option<f64>,
}

/// Reduce the response to a snapshot, padding missing fields
fn snapshot_from(payload: WeatherResponse) -> WeatherSnapshot {
    let description = payload
        .weather
        .into_iter()
        .next()
        .and_then(|c| c.description)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let temperature_celsius = payload.main.and_then(|m| m.temp).unwrap_or(0.0);

    WeatherSnapshot {
        description,
        temperature_celsius,
    }
}
