//! Forward geocoding: free-text place name to coordinate
//!
//! Policy is "first result wins": the first candidate the provider returns
//! is trusted with no ranking or disambiguation step. That mirrors the
//! product behavior this pipeline serves; callers wanting confirmation UIs
//! should wrap [`Geocoder::resolve`] themselves.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::GeoapifyConfig;
use crate::error::{PlanError, Result};
use crate::models::Coordinate;

/// Resolves a place name to a coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, place: &str) -> Result<Coordinate>;
}

/// Geoapify forward-geocoding client
pub struct GeoapifyGeocoder {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeoapifyGeocoder {
    pub fn new(config: &GeoapifyConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("roadtrip/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.geocode_url.clone(),
        }
    }
}

#[async_trait]
impl Geocoder for GeoapifyGeocoder {
    async fn resolve(&self, place: &str) -> Result<Coordinate> {
        debug!("Geocoding place name: {}", place);

        let url = format!(
            "{}?text={}&apiKey={}",
            self.base_url,
            urlencoding::encode(place),
            self.api_key
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PlanError::LocationNotFound(format!("{place}: {e}")))?;

        let payload: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| PlanError::LocationNotFound(format!("{place}: {e}")))?;

        let coordinate = first_coordinate(&payload)
            .ok_or_else(|| PlanError::LocationNotFound(place.to_string()))?;

        debug!(
            "Resolved {} to ({:.4}, {:.4})",
            place, coordinate.lon, coordinate.lat
        );
        Ok(coordinate)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: Option<PointGeometry>,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// GeoJSON point: [lon, lat]
    #[serde(default)]
    coordinates: Vec<f64>,
}

/// First candidate's coordinate, or None on an empty or malformed payload
fn first_coordinate(payload: &GeocodeResponse) -> Option<Coordinate> {
    let geometry = payload.features.first()?.geometry.as_ref()?;
    match geometry.coordinates.as_slice() {
        [lon, lat, ..] => Coordinate::new(*lon, *lat),
        _ => None,
    }
}
