//! Data models for the trip-planning pipeline
//!
//! Shared types that flow between the pipeline stages. API response shapes
//! stay private to the client modules that parse them; these are the
//! internal representations the planner assembles and hands to callers.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate, stored longitude-first
///
/// Note the storage order: (lon, lat), matching the GeoJSON convention of
/// the geocoding payloads. The routing wire call wants latitude first; that
/// transposition lives in [`crate::route::waypoints_param`], nowhere else.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Latitude in decimal degrees
    pub lat: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite components
    #[must_use]
    pub fn new(lon: f64, lat: f64) -> Option<Self> {
        (lon.is_finite() && lat.is_finite()).then_some(Self { lon, lat })
    }
}

/// A computed driving route: opaque geometry plus aggregate figures
///
/// Distance and time are stored in SI units as returned by the routing
/// provider; conversion to presentation units happens at the accessor
/// boundary so callers never see pre-formatted values.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteSummary {
    /// First route feature of the routing response, kept whole for the
    /// static-map renderer (it reads the waypoint list out of it)
    pub geometry: serde_json::Value,
    /// Route length in meters
    pub distance_meters: f64,
    /// Driving time in seconds
    pub duration_seconds: f64,
}

impl RouteSummary {
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}

/// Rendered static map image
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MapImage {
    /// Content type reported by the renderer, e.g. `image/png`
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl MapImage {
    /// Self-contained `data:` URL, embeddable without a follow-up fetch
    #[must_use]
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.media_type, encoded)
    }
}

/// Current conditions at the destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub description: String,
    pub temperature_celsius: f64,
}

/// One recommended track
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub play_url: String,
    /// Album art; absent art is tolerated, never an error
    pub cover_url: Option<String>,
}

/// One page of track results, tagged with the offset used to fetch it
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MusicPage {
    pub tracks: Vec<Track>,
    pub offset: u32,
}

/// Bearer credential for the music catalog
///
/// No expiry is modeled; the planner session holds one credential per full
/// build and mints a fresh one on the next build. If the upstream rejects it
/// mid-session, the extension call fails and the caller rebuilds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MusicCredential {
    pub token: String,
}

/// The assembled plan for one trip
///
/// Everything except `tracks` and `next_music_offset` is replace-only: a new
/// build produces a whole new plan. The two mutable fields are advanced by
/// the planner's music-extension operation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TripPlan {
    pub origin: String,
    pub destination: String,
    pub route: RouteSummary,
    /// Absent when rendering failed; the plan still carries the route figures
    pub map: Option<MapImage>,
    /// Absent when the weather lookup failed
    pub weather: Option<WeatherSnapshot>,
    pub tracks: Vec<Track>,
    /// Offset the next music page will be requested at
    pub next_music_offset: u32,
    /// Directions link for opening the route in the browser; pure string
    /// construction, no network call
    pub maps_link: String,
    pub generated_at: DateTime<Utc>,
}
