//! End-to-end pipeline tests over mock providers
//!
//! Every upstream collaborator is replaced with a canned implementation of
//! its provider trait, so these tests exercise the real orchestration logic
//! (ordering, degradation, pagination, supersession) without any network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rstest::rstest;
use serde_json::json;

use roadtrip::{
    Coordinate, Geocoder, MapImage, MapRenderer, MusicCatalog, MusicCredential, MusicPage,
    MusicTokenProvider, PlanError, PlanPhase, RouteProvider, RouteSummary, Track, TripPlanner,
    WeatherProvider, WeatherSnapshot,
};

const PARIS: Coordinate = Coordinate { lon: 2.3514, lat: 48.8575 };
const LYON: Coordinate = Coordinate { lon: 4.8357, lat: 45.7640 };

struct MockGeocoder {
    places: HashMap<String, Coordinate>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    fn new(places: &[(&str, Coordinate)]) -> Self {
        Self {
            places: places
                .iter()
                .map(|(name, c)| ((*name).to_string(), *c))
                .collect(),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, place: &str, delay: Duration) -> Self {
        self.delays.insert(place.to_string(), delay);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn resolve(&self, place: &str) -> Result<Coordinate, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(place) {
            tokio::time::sleep(*delay).await;
        }
        self.places
            .get(place)
            .copied()
            .ok_or_else(|| PlanError::LocationNotFound(place.to_string()))
    }
}

struct MockRouter;

#[async_trait]
impl RouteProvider for MockRouter {
    async fn compute_route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<RouteSummary, PlanError> {
        Ok(RouteSummary {
            geometry: json!({
                "type": "Feature",
                "properties": {
                    "waypoints": [
                        { "location": [origin.lon, origin.lat] },
                        { "location": [destination.lon, destination.lat] }
                    ]
                }
            }),
            distance_meters: 465_300.0,
            duration_seconds: 16_380.0,
        })
    }
}

struct MockRenderer {
    fail: bool,
}

#[async_trait]
impl MapRenderer for MockRenderer {
    async fn render(
        &self,
        _geometry: &serde_json::Value,
        _markers: &[Coordinate],
    ) -> Result<MapImage, PlanError> {
        if self.fail {
            return Err(PlanError::RenderFailed("canned failure".to_string()));
        }
        Ok(MapImage {
            media_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        })
    }
}

struct MockWeather {
    fail: bool,
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn current(&self, _point: &Coordinate) -> Result<WeatherSnapshot, PlanError> {
        if self.fail {
            return Err(PlanError::WeatherUnavailable("canned failure".to_string()));
        }
        Ok(WeatherSnapshot {
            description: "clear sky".to_string(),
            temperature_celsius: 21.0,
        })
    }
}

struct MockTokenProvider {
    fail: bool,
    calls: AtomicUsize,
}

impl MockTokenProvider {
    fn new(fail: bool) -> Self {
        Self { fail, calls: AtomicUsize::new(0) }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MusicTokenProvider for MockTokenProvider {
    async fn fetch_token(&self) -> Result<MusicCredential, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PlanError::AuthFailed("canned failure".to_string()));
        }
        Ok(MusicCredential { token: "test-token".to_string() })
    }
}

/// Catalog returning six uniquely titled tracks per offset, recording every
/// request it sees
struct RecordingCatalog {
    requests: Mutex<Vec<(String, u32, u32, String)>>,
    fail_offsets: Vec<u32>,
}

impl RecordingCatalog {
    fn new() -> Self {
        Self { requests: Mutex::new(Vec::new()), fail_offsets: Vec::new() }
    }

    fn failing_at(offsets: &[u32]) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_offsets: offsets.to_vec(),
        }
    }

    fn offsets(&self) -> Vec<u32> {
        self.requests.lock().unwrap().iter().map(|r| r.1).collect()
    }

    fn queries(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.0.clone()).collect()
    }
}

#[async_trait]
impl MusicCatalog for RecordingCatalog {
    async fn search_tracks(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
        credential: &MusicCredential,
    ) -> Result<MusicPage, PlanError> {
        self.requests.lock().unwrap().push((
            query.to_string(),
            offset,
            limit,
            credential.token.clone(),
        ));
        if self.fail_offsets.contains(&offset) {
            return Err(PlanError::SearchFailed("canned failure".to_string()));
        }
        let tracks = (0..limit)
            .map(|i| Track {
                title: format!("track-{}", offset + i),
                play_url: format!("https://open.spotify.com/track/{}", offset + i),
                cover_url: (i % 2 == 0).then(|| format!("https://img/{}", offset + i)),
            })
            .collect();
        Ok(MusicPage { tracks, offset })
    }
}

struct Fixture {
    geocoder: Arc<MockGeocoder>,
    tokens: Arc<MockTokenProvider>,
    catalog: Arc<RecordingCatalog>,
    planner: TripPlanner,
}

fn fixture() -> Fixture {
    fixture_with(
        MockGeocoder::new(&[("Paris, France", PARIS), ("Lyon, France", LYON)]),
        MockRenderer { fail: false },
        MockWeather { fail: false },
        MockTokenProvider::new(false),
        RecordingCatalog::new(),
    )
}

fn fixture_with(
    geocoder: MockGeocoder,
    renderer: MockRenderer,
    weather: MockWeather,
    tokens: MockTokenProvider,
    catalog: RecordingCatalog,
) -> Fixture {
    let geocoder = Arc::new(geocoder);
    let tokens = Arc::new(tokens);
    let catalog = Arc::new(catalog);
    let planner = TripPlanner::with_providers(
        geocoder.clone(),
        Arc::new(MockRouter),
        Arc::new(renderer),
        Arc::new(weather),
        tokens.clone(),
        catalog.clone(),
    );
    Fixture { geocoder, tokens, catalog, planner }
}

#[tokio::test]
async fn test_end_to_end_build_and_extend() {
    let f = fixture();

    let plan = f
        .planner
        .build_plan("Paris, France", "Lyon, France")
        .await
        .expect("build should succeed");

    assert_eq!(f.planner.phase().await, PlanPhase::Ready);
    assert!(plan.route.distance_meters > 0.0);
    assert!(plan.route.duration_seconds > 0.0);
    assert!(plan.map.is_some());
    assert!(!plan.map.unwrap().bytes.is_empty());
    assert_eq!(
        plan.weather,
        Some(WeatherSnapshot {
            description: "clear sky".to_string(),
            temperature_celsius: 21.0
        })
    );
    assert_eq!(plan.tracks.len(), 6);
    assert_eq!(plan.next_music_offset, 6);
    assert!(plan.maps_link.contains("travelmode=driving"));

    let appended = f.planner.extend_music().await.expect("extension should succeed");
    assert_eq!(appended.len(), 6);

    let plan = f.planner.current_plan().await.unwrap();
    assert_eq!(plan.tracks.len(), 12);
    assert_eq!(plan.next_music_offset, 12);

    assert_eq!(f.catalog.offsets(), vec![0, 6]);
    assert_eq!(
        f.catalog.queries()[0],
        "Paris, France to Lyon, France travel music"
    );
}

#[tokio::test]
async fn test_extension_offsets_strictly_increase() {
    let f = fixture();
    f.planner.build_plan("Paris, France", "Lyon, France").await.unwrap();

    f.planner.extend_music().await.unwrap();
    f.planner.extend_music().await.unwrap();

    assert_eq!(f.catalog.offsets(), vec![0, 6, 12]);
    let plan = f.planner.current_plan().await.unwrap();
    assert_eq!(plan.next_music_offset, 18);
}

#[tokio::test]
async fn test_extension_appends_in_order() {
    let f = fixture();
    let first = f
        .planner
        .build_plan("Paris, France", "Lyon, France")
        .await
        .unwrap()
        .tracks;

    let second = f.planner.extend_music().await.unwrap();

    let mut expected = first;
    expected.extend(second);
    let plan = f.planner.current_plan().await.unwrap();
    assert_eq!(plan.tracks, expected);
    assert_eq!(plan.tracks[0].title, "track-0");
    assert_eq!(plan.tracks[6].title, "track-6");
}

#[tokio::test]
async fn test_unknown_origin_aborts_build() {
    let f = fixture();

    let err = f
        .planner
        .build_plan("Qwzxnoplace123", "Lyon, France")
        .await
        .unwrap_err();

    assert!(matches!(err, PlanError::LocationNotFound(ref place) if place == "Qwzxnoplace123"));
    assert_eq!(f.planner.phase().await, PlanPhase::Failed);
    assert!(f.planner.current_plan().await.is_none());
    // Nothing downstream of geocoding ran.
    assert_eq!(f.tokens.call_count(), 0);
    assert!(f.catalog.offsets().is_empty());
}

#[rstest]
#[case("", "Lyon, France")]
#[case("Paris, France", "")]
#[case("   ", "Lyon, France")]
#[tokio::test]
async fn test_empty_input_makes_no_calls(#[case] origin: &str, #[case] destination: &str) {
    let f = fixture();

    let err = f.planner.build_plan(origin, destination).await.unwrap_err();

    assert!(matches!(err, PlanError::Validation(_)));
    assert_eq!(f.planner.phase().await, PlanPhase::Idle);
    assert_eq!(f.geocoder.call_count(), 0);
}

#[tokio::test]
async fn test_empty_input_keeps_ready_plan() {
    let f = fixture();
    f.planner.build_plan("Paris, France", "Lyon, France").await.unwrap();

    let err = f.planner.build_plan("", "Lyon, France").await.unwrap_err();

    assert!(matches!(err, PlanError::Validation(_)));
    assert_eq!(f.planner.phase().await, PlanPhase::Ready);
    assert!(f.planner.current_plan().await.is_some());
}

#[tokio::test]
async fn test_render_failure_degrades_to_mapless_plan() {
    let f = fixture_with(
        MockGeocoder::new(&[("Paris, France", PARIS), ("Lyon, France", LYON)]),
        MockRenderer { fail: true },
        MockWeather { fail: false },
        MockTokenProvider::new(false),
        RecordingCatalog::new(),
    );

    let plan = f
        .planner
        .build_plan("Paris, France", "Lyon, France")
        .await
        .expect("build should still succeed");

    assert_eq!(f.planner.phase().await, PlanPhase::Ready);
    assert!(plan.map.is_none());
    assert!(plan.route.distance_meters > 0.0);
    assert_eq!(plan.tracks.len(), 6);
}

#[tokio::test]
async fn test_weather_failure_degrades_to_absent_snapshot() {
    let f = fixture_with(
        MockGeocoder::new(&[("Paris, France", PARIS), ("Lyon, France", LYON)]),
        MockRenderer { fail: false },
        MockWeather { fail: true },
        MockTokenProvider::new(false),
        RecordingCatalog::new(),
    );

    let plan = f.planner.build_plan("Paris, France", "Lyon, France").await.unwrap();
    assert!(plan.weather.is_none());
    assert!(plan.map.is_some());
}

#[tokio::test]
async fn test_auth_failure_degrades_and_disables_extension() {
    let f = fixture_with(
        MockGeocoder::new(&[("Paris, France", PARIS), ("Lyon, France", LYON)]),
        MockRenderer { fail: false },
        MockWeather { fail: false },
        MockTokenProvider::new(true),
        RecordingCatalog::new(),
    );

    let plan = f.planner.build_plan("Paris, France", "Lyon, France").await.unwrap();
    assert_eq!(f.planner.phase().await, PlanPhase::Ready);
    assert!(plan.tracks.is_empty());

    // No credential is held, so the extension is a silent no-op.
    let appended = f.planner.extend_music().await.unwrap();
    assert!(appended.is_empty());
    assert!(f.catalog.offsets().is_empty());
}

#[tokio::test]
async fn test_extension_failure_leaves_plan_untouched() {
    let f = fixture_with(
        MockGeocoder::new(&[("Paris, France", PARIS), ("Lyon, France", LYON)]),
        MockRenderer { fail: false },
        MockWeather { fail: false },
        MockTokenProvider::new(false),
        RecordingCatalog::failing_at(&[6]),
    );

    f.planner.build_plan("Paris, France", "Lyon, France").await.unwrap();

    let err = f.planner.extend_music().await.unwrap_err();
    assert!(matches!(err, PlanError::SearchFailed(_)));

    let plan = f.planner.current_plan().await.unwrap();
    assert_eq!(plan.tracks.len(), 6);
    assert_eq!(plan.next_music_offset, 6);
    assert_eq!(f.planner.phase().await, PlanPhase::Ready);
}

#[tokio::test]
async fn test_extension_before_any_build_is_a_noop() {
    let f = fixture();
    let appended = f.planner.extend_music().await.unwrap();
    assert!(appended.is_empty());
    assert_eq!(f.planner.phase().await, PlanPhase::Idle);
    assert!(f.catalog.offsets().is_empty());
}

#[tokio::test]
async fn test_rebuild_resets_offset_and_credential() {
    let f = fixture();

    f.planner.build_plan("Paris, France", "Lyon, France").await.unwrap();
    f.planner.extend_music().await.unwrap();
    assert_eq!(f.planner.current_plan().await.unwrap().tracks.len(), 12);

    let plan = f.planner.build_plan("Lyon, France", "Paris, France").await.unwrap();
    assert_eq!(plan.tracks.len(), 6);
    assert_eq!(plan.next_music_offset, 6);
    // A fresh credential was minted for the new build.
    assert_eq!(f.tokens.call_count(), 2);
    assert_eq!(f.catalog.offsets(), vec![0, 6, 0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_newer_build_supersedes_slow_one() {
    let f = fixture_with(
        MockGeocoder::new(&[
            ("Paris, France", PARIS),
            ("Lyon, France", LYON),
            ("Slow City", PARIS),
        ])
        .with_delay("Slow City", Duration::from_millis(200)),
        MockRenderer { fail: false },
        MockWeather { fail: false },
        MockTokenProvider::new(false),
        RecordingCatalog::new(),
    );

    let planner = Arc::new(f.planner);
    let slow = {
        let planner = planner.clone();
        tokio::spawn(async move { planner.build_plan("Slow City", "Lyon, France").await })
    };
    // Let the slow build claim its sequence number first.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast = planner.build_plan("Paris, France", "Lyon, France").await;
    assert!(fast.is_ok());

    let stale = slow.await.unwrap();
    assert!(matches!(stale, Err(PlanError::Superseded)));

    // The newer build's result is the one that stuck.
    let plan = planner.current_plan().await.unwrap();
    assert_eq!(plan.origin, "Paris, France");
    assert_eq!(planner.phase().await, PlanPhase::Ready);
}
