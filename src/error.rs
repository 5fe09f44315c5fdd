//! Error types for the trip-planning pipeline

use thiserror::Error;

/// Main error type for the planning pipeline
///
/// Variants map one-to-one onto the failure points of the pipeline: the
/// load-bearing stages (geocoding, routing) abort a build, while the
/// supplementary stages (map, weather, music) are caught by the planner and
/// degrade the plan instead.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Geocoding returned no usable candidate for a place name
    #[error("location not found: {0}")]
    LocationNotFound(String),

    /// Routing returned no route feature (no drivable path, or provider error)
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// Static-map rendering failed; the route itself is still valid
    #[error("map render failed: {0}")]
    RenderFailed(String),

    /// Weather lookup failed; never blocks a plan
    #[error("weather unavailable: {0}")]
    WeatherUnavailable(String),

    /// Music token exchange produced no usable credential
    #[error("music auth failed: {0}")]
    AuthFailed(String),

    /// Music search failed; previously accumulated tracks are kept
    #[error("music search failed: {0}")]
    SearchFailed(String),

    /// A required secret is absent from the environment (startup fatal)
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// Caller-supplied input rejected before any network call
    #[error("invalid input: {0}")]
    Validation(String),

    /// Result discarded because a newer invocation was issued in the meantime
    #[error("superseded by a newer request")]
    Superseded,
}

impl PlanError {
    /// Get a user-friendly error message naming the stage that failed
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlanError::LocationNotFound(place) => {
                format!("Could not locate \"{place}\". Try \"City, Country\" for better precision.")
            }
            PlanError::RouteNotFound(_) => {
                "No drivable route was found between those places.".to_string()
            }
            PlanError::RenderFailed(_) => "The route map could not be rendered.".to_string(),
            PlanError::WeatherUnavailable(_) => {
                "Destination weather is currently unavailable.".to_string()
            }
            PlanError::AuthFailed(_) | PlanError::SearchFailed(_) => {
                "Music recommendations are currently unavailable.".to_string()
            }
            PlanError::MissingCredential(name) => {
                format!("Configuration error: {name} is not set.")
            }
            PlanError::Validation(message) => {
                format!("Invalid input: {message}")
            }
            PlanError::Superseded => "This request was replaced by a newer one.".to_string(),
        }
    }
}

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlanError>;
