//! Driving-route computation between two resolved coordinates

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::GeoapifyConfig;
use crate::error::{PlanError, Result};
use crate::models::{Coordinate, RouteSummary};

/// Computes a driving route with aggregate distance and time
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn compute_route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<RouteSummary>;
}

/// Wire form of the waypoint pair for the routing call
///
/// Coordinates are stored (lon, lat) but the routing endpoint wants
/// `lat,lon|lat,lon`. Getting this backward produces nonsensical routes
/// rather than an error, so the transposition is confined to this one
/// function.
#[must_use]
pub fn waypoints_param(origin: &Coordinate, destination: &Coordinate) -> String {
    format!(
        "{},{}|{},{}",
        origin.lat, origin.lon, destination.lat, destination.lon
    )
}

/// Geoapify routing client
pub struct GeoapifyRouter {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeoapifyRouter {
    pub fn new(config: &GeoapifyConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("roadtrip/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.routing_url.clone(),
        }
    }
}

#[async_trait]
impl RouteProvider for GeoapifyRouter {
    #[instrument(skip(self))]
    async fn compute_route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<RouteSummary> {
        debug!("Requesting driving route");
        let url = format!(
            "{}?waypoints={}&mode=drive&details=instruction&apiKey={}",
            self.base_url,
            waypoints_param(origin, destination),
            self.api_key
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PlanError::RouteNotFound(format!("routing request failed: {e}")))?;

        let payload: RoutingResponse = response
            .json()
            .await
            .map_err(|e| PlanError::RouteNotFound(format!("routing response unreadable: {e}")))?;

        summarize(payload)
    }
}

#[derive(Debug, Deserialize)]
struct RoutingResponse {
    #[serde(default)]
    features: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    distance: f64,
    time: f64,
}

/// First route feature, reduced to a summary; SI units kept as-is
fn summarize(payload: RoutingResponse) -> Result<RouteSummary> {
    let feature = payload
        .features
        .into_iter()
        .next()
        .ok_or_else(|| PlanError::RouteNotFound("no route features in response".to_string()))?;

    let properties: RouteProperties = serde_json::from_value(
        feature.get("properties").cloned().unwrap_or_default(),
    )
    .map_err(|e| PlanError::RouteNotFound(format!("route feature missing figures: {e}")))?;

    if properties.distance <= 0.0 || properties.time <= 0.0 {
        return Err(PlanError::RouteNotFound(
            "route feature carried non-positive distance or time".to_string(),
        ));
    }

    Ok(RouteSummary {
        geometry: feature,
        distance_meters: properties.distance,
        duration_seconds: properties.time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_waypoints_param_transposes_axes() {
        // Stored (lon, lat); the wire wants lat,lon|lat,lon.
        let origin = Coordinate { lon: -46.63, lat: -23.55 };
        let destination = Coordinate { lon: -43.17, lat: -22.91 };
        assert_eq!(
            waypoints_param(&origin, &destination),
            "-23.55,-46.63|-22.91,-43.17"
        );
    }

    #[test]
    fn test_summarize_takes_first_feature() {
        let payload: RoutingResponse = serde_json::from_value(json!({
            "features": [
                {
                    "type": "Feature",
                    "properties": { "distance": 465300.0, "time": 16380.0, "mode": "drive" },
                    "geometry": { "type": "MultiLineString", "coordinates": [] }
                },
                {
                    "type": "Feature",
                    "properties": { "distance": 1.0, "time": 1.0 }
                }
            ]
        }))
        .unwrap();

        let summary = summarize(payload).unwrap();
        assert_eq!(summary.distance_meters, 465300.0);
        assert_eq!(summary.duration_seconds, 16380.0);
        assert_eq!(summary.geometry["properties"]["mode"], "drive");
    }

    #[test]
    fn test_summarize_no_features_is_route_not_found() {
        let payload: RoutingResponse = serde_json::from_value(json!({ "features": [] })).unwrap();
        assert!(matches!(
            summarize(payload),
            Err(PlanError::RouteNotFound(_))
        ));
    }

    #[test]
    fn test_summarize_rejects_non_positive_figures() {
        let payload: RoutingResponse = serde_json::from_value(json!({
            "features": [ { "properties": { "distance": 0.0, "time": 120.0 } } ]
        }))
        .unwrap();
        assert!(matches!(
            summarize(payload),
            Err(PlanError::RouteNotFound(_))
        ));
    }
}
