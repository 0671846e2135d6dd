//! Stable application-wide constants.
//!
//! Values here are structural invariants, physical coefficients, and default
//! fallbacks for env-var-based configuration. Tuning knobs that benefit from
//! runtime experimentation are surfaced through
//! [`RouteSynthesisConfig`](crate::config::RouteSynthesisConfig) and only
//! take their defaults from here.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";
/// Default wall-clock budget for one synthesis request.
pub const DEFAULT_SYNTHESIS_TIMEOUT_SECS: u64 = 90;

// --- Provider endpoints and identifiers ---

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Primary model first, fallback models after it.
pub const DEFAULT_GENERATIVE_MODELS: &str = "gemini-2.0-flash,gemini-1.5-flash";
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_NOMINATIM_USER_AGENT: &str = "tripforge/0.1 (route synthesis)";
pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";
/// Free-tier directions allowance per UTC day.
pub const DEFAULT_ORS_DAILY_LIMIT: u32 = 2_000;

/// Source id recorded for paths built without any routing provider.
pub const GEOMETRIC_SOURCE: &str = "geometric";

// --- Generation retry policy ---

pub const DEFAULT_MODEL_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MODEL_BACKOFF_BASE_MS: u64 = 2_000;

// --- Activity constraints ---

pub const DEFAULT_MAX_CYCLING_DAY_KM: f64 = 60.0;
pub const DEFAULT_TREKKING_MIN_KM: f64 = 5.0;
pub const DEFAULT_TREKKING_MAX_KM: f64 = 15.0;
/// Last-resort authoritative total when the skeleton carries no usable figure.
pub const DEFAULT_TOTAL_DISTANCE_KM: f64 = 10.0;
/// Day distance used when a cycling route has to be built without a skeleton.
pub const DEFAULT_CYCLING_DAY_KM: f64 = 50.0;
/// Maximum walking hop between consecutive trekking waypoints.
pub const DEFAULT_MAX_TREKKING_HOP_KM: f64 = 8.0;
/// First and last coordinate of a loop must coincide within this distance.
pub const DEFAULT_LOOP_CLOSURE_TOLERANCE_M: f64 = 100.0;

// --- Loop quality scoring ---

pub const LOOP_SCORE_MAX: f64 = 100.0;
pub const DEFAULT_LOOP_LINEAR_PENALTY: f64 = 20.0;
pub const DEFAULT_LOOP_LOW_VARIANCE_BONUS: f64 = 10.0;
/// A vertex whose turn angle is within this many degrees of 180 counts as linear.
pub const DEFAULT_LOOP_STRAIGHT_TOLERANCE_DEG: f64 = 30.0;
/// Normalized centroid-distance variance below which a loop counts as round.
pub const DEFAULT_LOOP_VARIANCE_THRESHOLD: f64 = 0.2;

// --- Circular routes ---

/// Points placed around the centre of a synthesized circular route.
pub const CIRCULAR_ROUTE_POINTS: usize = 5;
/// `radius_km = distance_km / (2π) × factor`
pub const DEFAULT_CIRCULAR_RADIUS_FACTOR: f64 = 1.5;

// --- Geometry ---

/// Mean kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;
/// Amplitude cap (degrees) for synthetic road curvature.
pub const ROAD_CURVE_MAX_AMPLITUDE_DEG: f64 = 0.02;
/// Amplitude cap (degrees) for synthetic trail curvature.
pub const TRAIL_CURVE_MAX_AMPLITUDE_DEG: f64 = 0.03;
/// Spacing between synthetic path samples.
pub const ROAD_SAMPLE_SPACING_KM: f64 = 0.5;
pub const TRAIL_SAMPLE_SPACING_KM: f64 = 0.15;
pub const MIN_SAMPLES_PER_SEGMENT: usize = 8;
pub const MAX_SAMPLES_PER_SEGMENT: usize = 120;

// --- Speeds used when no provider measured a duration ---

pub const CYCLING_AVERAGE_SPEED_KMH: f64 = 18.0;
pub const TREKKING_AVERAGE_SPEED_KMH: f64 = 4.0;

// --- Timeouts (seconds) ---

pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ROUTING_TIMEOUT_SECS: u64 = 15;
/// Per-attempt limit; the synthesis timeout must cover every model's
/// attempts plus backoff.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 10;
pub const IMAGE_LOOKUP_TIMEOUT_SECS: u64 = 5;
