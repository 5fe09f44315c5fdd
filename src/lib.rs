//! Roadtrip - trip planning between two place names
//!
//! Resolves origin and destination to coordinates, computes a driving
//! route, renders a static map, fetches destination weather and recommends
//! travel music, with incremental "load more" pagination for the music
//! list. The orchestration lives in [`TripPlanner`]; each upstream service
//! sits behind its own provider trait.

pub mod config;
pub mod error;
pub mod geocode;
pub mod map;
pub mod models;
pub mod music;
pub mod planner;
pub mod route;
pub mod weather;

// Re-export core types for public API
pub use config::RoadtripConfig;
pub use error::{PlanError, Result};
pub use geocode::{GeoapifyGeocoder, Geocoder};
pub use map::{GeoapifyStaticMap, MapRenderer};
pub use models::{
    Coordinate, MapImage, MusicCredential, MusicPage, RouteSummary, Track, TripPlan,
    WeatherSnapshot,
};
pub use music::{MusicCatalog, MusicTokenProvider, SpotifyClient, TRACK_PAGE_SIZE};
pub use planner::{PlanPhase, TripPlanner, google_maps_link};
pub use route::{GeoapifyRouter, RouteProvider};
pub use weather::{OpenWeatherClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
