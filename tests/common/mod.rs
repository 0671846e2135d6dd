#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tripforge::cache::{GeocodeCache, MemoryGeocodeCache};
use tripforge::config::RouteSynthesisConfig;
use tripforge::error::ProviderError;
use tripforge::models::{Coordinates, GeocodeHit, RoutingProfile};
use tripforge::services::geocoding::GeocodingResolver;
use tripforge::services::providers::{
    DirectionsResponse, GeocodeProvider, RoutingProvider, TextGenerator,
};
use tripforge::services::route_synthesis::{
    RouteSynthesizer, RoutingResolver, SkeletonGenerator, Sleeper,
};

pub const PARIS_WEEKEND: &str = r#"Here is your route:
```json
{
  "day1": {"start": "Paris", "end": "Fontainebleau", "distanceKm": 55, "waypoints": ["Evry", "Melun"]},
  "day2": {"start": "Fontainebleau", "end": "Sens", "distanceKm": 45, "waypoints": ["Nemours"]},
  "totalDistanceKm": 100,
  "estimatedDuration": "2 days",
  "difficulty": "moderate"
}
```"#;

pub const NICE_LOOP: &str = r#"{
  "day1": {"start": "Nice", "end": "Nice", "distanceKm": 8, "waypoints": ["Colline du Château", "Mont Boron"]},
  "totalDistanceKm": 8,
  "difficulty": "easy"
}"#;

/// Places known to [`MockGeocoder::france`], keyed by the qualified query.
pub const FRENCH_PLACES: &[(&str, f64, f64)] = &[
    ("Paris, France", 48.8566, 2.3522),
    ("Evry, France", 48.6239, 2.4294),
    ("Melun, France", 48.5421, 2.6554),
    ("Fontainebleau, France", 48.4047, 2.7016),
    ("Nemours, France", 48.2676, 2.6966),
    ("Sens, France", 48.1975, 3.2833),
    ("Nice, France", 43.7102, 7.2620),
    ("Colline du Château, France", 43.6950, 7.2810),
    ("Mont Boron, France", 43.6960, 7.2990),
];

pub fn coords(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).unwrap()
}

pub fn known_place(query: &str) -> Coordinates {
    FRENCH_PLACES
        .iter()
        .find(|(name, _, _)| *name == query)
        .map(|(_, lat, lng)| coords(*lat, *lng))
        .unwrap_or_else(|| panic!("unknown test place {}", query))
}

/// Replies from a queue, recording which model was asked. An empty queue
/// answers with a retryable HTTP error.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(ScriptedModel {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers `times` times with `reply`.
    pub fn repeating(reply: &str, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Ok(reply.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Http("503 Service Unavailable".into())))
    }
}

/// Never answers.
pub struct HangingModel;

#[async_trait]
impl TextGenerator for HangingModel {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ProviderError> {
        std::future::pending().await
    }
}

/// Hangs whenever `stalled` is asked; any other model gets `reply`.
pub struct StalledModel {
    stalled: String,
    reply: String,
    calls: Mutex<Vec<String>>,
}

impl StalledModel {
    pub fn new(stalled: &str, reply: &str) -> Arc<Self> {
        Arc::new(StalledModel {
            stalled: stalled.to_string(),
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StalledModel {
    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(model.to_string());
        if model == self.stalled {
            std::future::pending::<()>().await;
        }
        Ok(self.reply.clone())
    }
}

/// Fixed name → position table; counts every lookup that reaches it.
pub struct MockGeocoder {
    places: HashMap<String, Coordinates>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn with_places(places: &[(&str, f64, f64)]) -> Arc<Self> {
        Arc::new(MockGeocoder {
            places: places
                .iter()
                .map(|(name, lat, lng)| (name.to_string(), coords(*lat, *lng)))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn france() -> Arc<Self> {
        Self::with_places(FRENCH_PLACES)
    }

    pub fn empty() -> Arc<Self> {
        Self::with_places(&[])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocoder {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<GeocodeHit, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.places
            .get(query)
            .map(|coordinates| GeocodeHit {
                coordinates: *coordinates,
                display_name: query.to_string(),
                place_type: "city".to_string(),
                raw: serde_json::Value::Null,
            })
            .ok_or_else(|| ProviderError::NotFound(query.to_string()))
    }
}

/// Returns the waypoints themselves as the routed path, with a fixed
/// measured distance.
pub struct MockRouter {
    pub distance_km: f64,
    calls: AtomicUsize,
}

impl MockRouter {
    pub fn new(distance_km: f64) -> Arc<Self> {
        Arc::new(MockRouter {
            distance_km,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingProvider for MockRouter {
    fn id(&self) -> &'static str {
        "mock-router"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn directions(
        &self,
        waypoints: &[Coordinates],
        _profile: RoutingProfile,
    ) -> Result<DirectionsResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DirectionsResponse {
            distance_meters: self.distance_km * 1000.0,
            duration_seconds: self.distance_km * 240.0,
            geometry: waypoints.iter().map(|c| [c.lng, c.lat]).collect(),
        })
    }
}

/// Records backoff delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn test_synthesis_config() -> RouteSynthesisConfig {
    RouteSynthesisConfig {
        generative_models: vec!["primary".into(), "fallback".into()],
        ..RouteSynthesisConfig::default()
    }
}

pub struct Pipeline {
    pub synthesizer: RouteSynthesizer,
    pub cache: Arc<dyn GeocodeCache>,
    pub sleeper: Arc<RecordingSleeper>,
}

pub fn pipeline(
    model: Arc<dyn TextGenerator>,
    geocoder: Arc<MockGeocoder>,
    routers: Vec<Arc<dyn RoutingProvider>>,
) -> Pipeline {
    let config = test_synthesis_config();
    let cache: Arc<dyn GeocodeCache> = Arc::new(MemoryGeocodeCache::new());
    let sleeper = Arc::new(RecordingSleeper::default());

    let generator = SkeletonGenerator::new(model, &config).with_sleeper(sleeper.clone());
    let geocoder = GeocodingResolver::new(
        vec![geocoder as Arc<dyn GeocodeProvider>],
        cache.clone(),
        config.geocode_timeout(),
    );
    let router = RoutingResolver::new(routers, &config);

    Pipeline {
        synthesizer: RouteSynthesizer::new(generator, geocoder, router, config),
        cache,
        sleeper,
    }
}

/// Same wiring as [`pipeline`] but backing off on the tokio clock, for
/// tests that measure wall-clock budgets with a paused runtime.
pub fn pipeline_on_tokio_clock(
    model: Arc<dyn TextGenerator>,
    geocoder: Arc<MockGeocoder>,
) -> RouteSynthesizer {
    let config = test_synthesis_config();
    let cache: Arc<dyn GeocodeCache> = Arc::new(MemoryGeocodeCache::new());

    let generator = SkeletonGenerator::new(model, &config);
    let geocoder = GeocodingResolver::new(
        vec![geocoder as Arc<dyn GeocodeProvider>],
        cache,
        config.geocode_timeout(),
    );
    let router = RoutingResolver::new(vec![], &config);

    RouteSynthesizer::new(generator, geocoder, router, config)
}

/// Check if we should skip tests that call live APIs
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("SKIP_REAL_API_TESTS").is_ok()
}
