//! Configuration for the trip planner
//!
//! All secrets come from the process environment (a `.env` file is honored).
//! The three required credentials fail fast at load time; everything else has
//! a sensible default and can be overridden in code, e.g. to point a client
//! at a test server.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Wrapper over `env::var` that rejects unset or blank values
fn env_check(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PlanError::MissingCredential(name)),
    }
}

/// Geoapify settings, shared by geocoding, routing and static-map rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoapifyConfig {
    /// API key used by all three Geoapify endpoints
    pub api_key: String,
    pub geocode_url: String,
    pub routing_url: String,
    pub staticmap_url: String,
}

impl GeoapifyConfig {
    fn with_key(api_key: String) -> Self {
        Self {
            api_key,
            geocode_url: "https://api.geoapify.com/v1/geocode/search".to_string(),
            routing_url: "https://api.geoapify.com/v1/routing".to_string(),
            staticmap_url: "https://maps.geoapify.com/v1/staticmap".to_string(),
        }
    }
}

/// OpenWeatherMap settings
///
/// The key is optional: weather is cosmetic, so a missing key degrades the
/// weather stage at fetch time instead of failing startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl WeatherConfig {
    fn with_key(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
        }
    }
}

/// Spotify settings for the client-credentials exchange and track search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base: String,
}

impl SpotifyConfig {
    fn with_credentials(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base: "https://api.spotify.com/v1".to_string(),
        }
    }
}

/// Root configuration for a planner session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadtripConfig {
    pub geoapify: GeoapifyConfig,
    pub weather: WeatherConfig,
    pub spotify: SpotifyConfig,
}

impl RoadtripConfig {
    /// Load configuration from the environment
    ///
    /// Required: `GEOAPIFY_API_KEY`, `SPOTIFY_CLIENT_ID`,
    /// `SPOTIFY_CLIENT_SECRET`. Optional: `OPENWEATHER_API_KEY`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let geoapify_key = env_check("GEOAPIFY_API_KEY")?;
        let client_id = env_check("SPOTIFY_CLIENT_ID")?;
        let client_secret = env_check("SPOTIFY_CLIENT_SECRET")?;
        let weather_key = std::env::var("OPENWEATHER_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            geoapify: GeoapifyConfig::with_key(geoapify_key),
            weather: WeatherConfig::with_key(weather_key),
            spotify: SpotifyConfig::with_credentials(client_id, client_secret),
        })
    }
}
