//! Static-map rendering of a computed route
//!
//! The renderer is handed the raw route feature. Styling is applied to a
//! fresh copy inside [`build_render_request`]; the caller's geometry is
//! never mutated.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::GeoapifyConfig;
use crate::error::{PlanError, Result};
use crate::models::{Coordinate, MapImage};

/// Fixed route styling; kept consistent regardless of upstream defaults
const LINE_COLOR: &str = "#2563eb";
const LINE_WIDTH: &str = "6";

/// Fixed marker styling, one marker per waypoint
const MARKER_COLOR: &str = "#ef4444";
const MARKER_SIZE: &str = "medium";
const MARKER_TYPE: &str = "awesome";

/// Fixed canvas parameters, balancing legibility and payload size
const MAP_STYLE: &str = "osm-bright";
const MAP_WIDTH: u32 = 900;
const MAP_HEIGHT: u32 = 450;
const SCALE_FACTOR: u32 = 2;

/// Renders route geometry to a static image
#[async_trait]
pub trait MapRenderer: Send + Sync {
    /// Render the route; `markers` is the fallback marker set used when the
    /// geometry carries no waypoint list of its own
    async fn render(&self, geometry: &Value, markers: &[Coordinate]) -> Result<MapImage>;
}

/// Geoapify static-map client
pub struct GeoapifyStaticMap {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeoapifyStaticMap {
    pub fn new(config: &GeoapifyConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("roadtrip/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.staticmap_url.clone(),
        }
    }
}

#[async_trait]
impl MapRenderer for GeoapifyStaticMap {
    async fn render(&self, geometry: &Value, markers: &[Coordinate]) -> Result<MapImage> {
        debug!("Rendering static map");
        let request = build_render_request(geometry, markers);

        let url = format!("{}?apiKey={}", self.base_url, self.api_key);
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PlanError::RenderFailed(format!("staticmap request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PlanError::RenderFailed(format!(
                "staticmap returned status {}",
                response.status()
            )));
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlanError::RenderFailed(format!("staticmap body unreadable: {e}")))?;

        Ok(MapImage {
            media_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// Build the render request as a new value
///
/// Clones the route feature, injects the fixed line styling into its
/// properties, and attaches one styled marker per waypoint. Waypoint
/// locations arrive GeoJSON-ordered ([lon, lat]); markers are emitted
/// lat/lon keyed.
pub fn build_render_request(geometry: &Value, fallback_markers: &[Coordinate]) -> Value {
    let mut styled = geometry.clone();
    if !styled.is_object() {
        styled = json!({});
    }
    if let Some(feature) = styled.as_object_mut() {
        let properties = feature.entry("properties").or_insert_with(|| json!({}));
        if let Some(props) = properties.as_object_mut() {
            props.insert("linecolor".to_string(), json!(LINE_COLOR));
            props.insert("linewidth".to_string(), json!(LINE_WIDTH));
        }
    }

    let mut markers: Vec<Value> = waypoint_coordinates(&styled)
        .iter()
        .map(|c| marker_value(c))
        .collect();
    if markers.is_empty() {
        markers = fallback_markers.iter().map(marker_value).collect();
    }

    json!({
        "style": MAP_STYLE,
        "width": MAP_WIDTH,
        "height": MAP_HEIGHT,
        "scaleFactor": SCALE_FACTOR,
        "geojson": styled,
        "markers": markers,
    })
}

fn marker_value(coordinate: &Coordinate) -> Value {
    json!({
        "lat": coordinate.lat,
        "lon": coordinate.lon,
        "color": MARKER_COLOR,
        "size": MARKER_SIZE,
        "type": MARKER_TYPE,
    })
}

/// Waypoints listed in the route feature's properties, if any
fn waypoint_coordinates(geometry: &Value) -> Vec<Coordinate> {
    geometry["properties"]["waypoints"]
        .as_array()
        .map(|waypoints| {
            waypoints
                .iter()
                .filter_map(|w| {
                    let location = w.get("location")?.as_array()?;
                    let lon = location.first()?.as_f64()?;
                    let lat = location.get(1)?.as_f64()?;
                    Coordinate::new(lon, lat)
                })
                .collect()
        })
        .unwrap_or_default()
}
