//! Trip-planning orchestration
//!
//! `TripPlanner` is the session object behind the two externally observable
//! operations: `build_plan` turns two place names into a full plan bundle,
//! and `extend_music` grows the plan's track list one page at a time.
//!
//! The session owns exactly three pieces of mutable state: the current
//! phase, the current plan (which carries the music offset) and the cached
//! music credential. All of it sits behind one async mutex; network phases
//! run without the lock and commit under it. Every invocation is tagged with
//! a monotonically increasing sequence number, and a commit whose sequence
//! number is no longer the latest issued is discarded, so a slow-finishing
//! call can never clobber the result of a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RoadtripConfig;
use crate::error::{PlanError, Result};
use crate::geocode::{GeoapifyGeocoder, Geocoder};
use crate::map::{GeoapifyStaticMap, MapRenderer};
use crate::models::{MusicCredential, Track, TripPlan};
use crate::music::{MusicCatalog, MusicTokenProvider, SpotifyClient, TRACK_PAGE_SIZE, travel_query};
use crate::route::{GeoapifyRouter, RouteProvider};
use crate::weather::{OpenWeatherClient, WeatherProvider};

/// Primary state of a planner session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanPhase {
    #[default]
    Idle,
    Planning,
    Ready,
    Failed,
}

#[derive(Default)]
struct Session {
    phase: PlanPhase,
    plan: Option<TripPlan>,
    credential: Option<MusicCredential>,
}

/// Orchestrates the plan-building pipeline and the music extension
pub struct TripPlanner {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RouteProvider>,
    renderer: Arc<dyn MapRenderer>,
    weather: Arc<dyn WeatherProvider>,
    music_auth: Arc<dyn MusicTokenProvider>,
    music: Arc<dyn MusicCatalog>,
    session: Mutex<Session>,
    seq: AtomicU64,
}

impl TripPlanner {
    /// Planner wired to the production providers
    #[must_use]
    pub fn new(config: &RoadtripConfig) -> Self {
        let spotify = Arc::new(SpotifyClient::new(&config.spotify));
        Self::with_providers(
            Arc::new(GeoapifyGeocoder::new(&config.geoapify)),
            Arc::new(GeoapifyRouter::new(&config.geoapify)),
            Arc::new(GeoapifyStaticMap::new(&config.geoapify)),
            Arc::new(OpenWeatherClient::new(&config.weather)),
            spotify.clone(),
            spotify,
        )
    }

    /// Planner over caller-supplied providers
    #[must_use]
    pub fn with_providers(
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn RouteProvider>,
        renderer: Arc<dyn MapRenderer>,
        weather: Arc<dyn WeatherProvider>,
        music_auth: Arc<dyn MusicTokenProvider>,
        music: Arc<dyn MusicCatalog>,
    ) -> Self {
        Self {
            geocoder,
            router,
            renderer,
            weather,
            music_auth,
            music,
            session: Mutex::new(Session::default()),
            seq: AtomicU64::new(0),
        }
    }

    /// Current primary state
    pub async fn phase(&self) -> PlanPhase {
        self.session.lock().await.phase
    }

    /// Snapshot of the current plan, if one is ready
    pub async fn current_plan(&self) -> Option<TripPlan> {
        self.session.lock().await.plan.clone()
    }

    /// Build a complete plan for the trip between two place names
    ///
    /// Geocoding and routing failures abort the build; map, weather and
    /// music failures degrade the plan (absent image, absent snapshot, empty
    /// track list) instead. Empty inputs are rejected before any state
    /// change or network call.
    pub async fn build_plan(&self, origin: &str, destination: &str) -> Result<TripPlan> {
        let origin = origin.trim();
        let destination = destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(PlanError::Validation(
                "origin and destination must both be provided".to_string(),
            ));
        }

        let seq = self.issue_seq();
        {
            let mut session = self.session.lock().await;
            session.phase = PlanPhase::Planning;
            // A fresh build never reuses a credential minted for an earlier
            // query; the offset resets with the plan itself.
            session.credential = None;
        }
        info!(origin, destination, "Building trip plan");

        let outcome = self.run_pipeline(origin, destination).await;

        let mut session = self.session.lock().await;
        if self.seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "Discarding stale build result");
            return Err(PlanError::Superseded);
        }
        match outcome {
            Ok((plan, credential)) => {
                session.phase = PlanPhase::Ready;
                session.credential = credential;
                session.plan = Some(plan.clone());
                Ok(plan)
            }
            Err(e) => {
                session.phase = PlanPhase::Failed;
                session.plan = None;
                session.credential = None;
                Err(e)
            }
        }
    }

    /// Fetch the next music page and append it to the current plan
    ///
    /// No-op (returns an empty page) unless a plan is ready and a credential
    /// is held. On success the returned tracks are exactly the appended
    /// page; on search failure the plan is left untouched.
    pub async fn extend_music(&self) -> Result<Vec<Track>> {
        let (query, offset, credential, seq) = {
            let session = self.session.lock().await;
            if session.phase != PlanPhase::Ready {
                debug!("extend_music ignored: no plan is ready");
                return Ok(Vec::new());
            }
            let Some(plan) = session.plan.as_ref() else {
                return Ok(Vec::new());
            };
            let Some(credential) = session.credential.clone() else {
                debug!("extend_music ignored: no music credential held");
                return Ok(Vec::new());
            };
            (
                travel_query(&plan.origin, &plan.destination),
                plan.next_music_offset,
                credential,
                self.issue_seq(),
            )
        };

        debug!(offset, "Extending music recommendations");
        let page = self
            .music
            .search_tracks(&query, offset, TRACK_PAGE_SIZE, &credential)
            .await?;

        let mut session = self.session.lock().await;
        if self.seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "Discarding stale music page");
            return Err(PlanError::Superseded);
        }
        let Some(plan) = session.plan.as_mut() else {
            return Err(PlanError::Superseded);
        };
        plan.tracks.extend(page.tracks.iter().cloned());
        plan.next_music_offset = offset + TRACK_PAGE_SIZE;
        info!(
            total = plan.tracks.len(),
            next_offset = plan.next_music_offset,
            "Appended music page"
        );
        Ok(page.tracks)
    }

    fn issue_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The ordered pipeline: geocode both ends, route, then the
    /// supplementary stages with per-stage degradation
    async fn run_pipeline(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<(TripPlan, Option<MusicCredential>)> {
        // The two lookups are independent; only routing needs both.
        let (from, to) = tokio::try_join!(
            self.geocoder.resolve(origin),
            self.geocoder.resolve(destination),
        )?;

        let route = self.router.compute_route(&from, &to).await?;

        let map = match self.renderer.render(&route.geometry, &[from, to]).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(error = %e, "Map render failed, continuing without an image");
                None
            }
        };

        let weather = match self.weather.current(&to).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Weather lookup failed, continuing without a snapshot");
                None
            }
        };

        let (credential, tracks) = match self.music_auth.fetch_token().await {
            Ok(credential) => {
                let query = travel_query(origin, destination);
                match self
                    .music
                    .search_tracks(&query, 0, TRACK_PAGE_SIZE, &credential)
                    .await
                {
                    Ok(page) => (Some(credential), page.tracks),
                    Err(e) => {
                        warn!(error = %e, "Initial music search failed, continuing without tracks");
                        (Some(credential), Vec::new())
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Music token unavailable, continuing without tracks");
                (None, Vec::new())
            }
        };

        let plan = TripPlan {
            origin: origin.to_string(),
            destination: destination.to_string(),
            route,
            map,
            weather,
            tracks,
            next_music_offset: TRACK_PAGE_SIZE,
            maps_link: google_maps_link(origin, destination),
            generated_at: Utc::now(),
        };
        Ok((plan, credential))
    }
}

/// Directions link for opening the trip in the browser
///
/// Pure string construction; no network call and no API key involved.
#[must_use]
pub fn google_maps_link(origin: &str, destination: &str) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=driving",
        urlencoding::encode(origin),
        urlencoding::encode(destination)
    )
}
