use crate::constants::{
    KM_PER_DEGREE, MAX_SAMPLES_PER_SEGMENT, MIN_SAMPLES_PER_SEGMENT, ROAD_CURVE_MAX_AMPLITUDE_DEG,
    ROAD_SAMPLE_SPACING_KM, TRAIL_CURVE_MAX_AMPLITUDE_DEG, TRAIL_SAMPLE_SPACING_KM,
};
use crate::models::{Coordinates, TripType};
use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};
use std::f64::consts::{PI, TAU};

/// Lateral amplitude as a share of the segment length, before the cap.
const AMPLITUDE_SEGMENT_RATIO: f64 = 0.08;

/// Relative noise applied to trail samples.
const TRAIL_JITTER_STEPS: &[f64] = &[-0.12, -0.08, -0.04, 0.0, 0.04, 0.08, 0.12];

/// Bearing change between consecutive legs of an open centroid path.
const OPEN_PATH_BEND_RAD: f64 = 0.35;

/// How synthetic curvature is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// Long, gentle bends
    Road,
    /// Tighter, more irregular winding
    Trail,
}

impl PathStyle {
    pub fn for_trip(trip_type: TripType) -> Self {
        match trip_type {
            TripType::Cycling => PathStyle::Road,
            TripType::Trekking => PathStyle::Trail,
        }
    }

    fn max_amplitude_deg(&self) -> f64 {
        match self {
            PathStyle::Road => ROAD_CURVE_MAX_AMPLITUDE_DEG,
            PathStyle::Trail => TRAIL_CURVE_MAX_AMPLITUDE_DEG,
        }
    }

    fn sample_spacing_km(&self) -> f64 {
        match self {
            PathStyle::Road => ROAD_SAMPLE_SPACING_KM,
            PathStyle::Trail => TRAIL_SAMPLE_SPACING_KM,
        }
    }
}

/// Densify `points` into a winding path that still passes through every
/// input point. Each segment is interpolated linearly and offset sideways by
/// a sinusoid whose envelope vanishes at both ends.
pub fn synthesize_path(points: &[Coordinates], style: PathStyle) -> Vec<Coordinates> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let mut path = Vec::new();
    for (index, w) in points.windows(2).enumerate() {
        path.push(w[0]);
        path.extend(curve_segment(&w[0], &w[1], style, index));
    }
    if let Some(last) = points.last() {
        path.push(*last);
    }
    path
}

/// Interior samples of one segment, endpoints excluded.
fn curve_segment(from: &Coordinates, to: &Coordinates, style: PathStyle, index: usize) -> Vec<Coordinates> {
    let distance_km = from.distance_to(to);
    if distance_km < 1e-6 {
        return Vec::new();
    }

    let samples = ((distance_km / style.sample_spacing_km()).ceil() as usize)
        .clamp(MIN_SAMPLES_PER_SEGMENT, MAX_SAMPLES_PER_SEGMENT);
    let amplitude_deg =
        (distance_km / KM_PER_DEGREE * AMPLITUDE_SEGMENT_RATIO).min(style.max_amplitude_deg());

    // Unit normal to the segment in a locally isotropic frame
    let cos_lat = from.lat.to_radians().cos().max(0.01);
    let dx = (to.lng - from.lng) * cos_lat;
    let dy = to.lat - from.lat;
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1e-12 {
        return Vec::new();
    }
    let (nx, ny) = (-dy / length, dx / length);

    // Alternate the bend direction between segments
    let side = if index % 2 == 0 { 1.0 } else { -1.0 };
    let waves = (distance_km / 15.0).round().clamp(1.0, 6.0);
    let mut rng = StdRng::seed_from_u64(segment_seed(from, to));

    (1..samples)
        .map(|i| {
            let t = i as f64 / samples as f64;
            let envelope = (PI * t).sin();
            let mut wave = (TAU * waves * t).sin();
            if style == PathStyle::Trail {
                wave += 0.35 * (TAU * waves * 3.0 * t).sin();
                wave += TRAIL_JITTER_STEPS.choose(&mut rng).copied().unwrap_or(0.0);
            }
            let offset = side * amplitude_deg * envelope * wave;

            let base = from.lerp(to, t);
            Coordinates {
                lat: (base.lat + ny * offset).clamp(-90.0, 90.0),
                lng: (base.lng + nx * offset / cos_lat).clamp(-180.0, 180.0),
            }
        })
        .collect()
}

/// Reproducible per-segment seed so the same waypoints give the same path.
fn segment_seed(from: &Coordinates, to: &Coordinates) -> u64 {
    let quantize = |v: f64| (v * 1e5).round() as i64 as u64;
    quantize(from.lat)
        .wrapping_mul(31)
        .wrapping_add(quantize(from.lng))
        .wrapping_mul(37)
        .wrapping_add(quantize(to.lat))
        .wrapping_mul(41)
        .wrapping_add(quantize(to.lng))
}

/// `count` points evenly spaced on a circle of `radius_km` around `center`,
/// starting due north and going clockwise.
pub fn circle_points(center: &Coordinates, radius_km: f64, count: usize) -> Vec<Coordinates> {
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * TAU;
            center.offset_km(radius_km * angle.cos(), radius_km * angle.sin())
        })
        .collect()
}

/// `count` points on a circle of `radius_km` whose rim passes through
/// `start`; the first point is `start` itself.
pub fn circle_through(start: &Coordinates, radius_km: f64, count: usize) -> Vec<Coordinates> {
    let center = start.offset_km(-radius_km, 0.0);
    let mut points = circle_points(&center, radius_km, count);
    if let Some(first) = points.first_mut() {
        *first = *start;
    }
    points
}

/// Open path of `legs` gently bending legs starting at `start`, with a
/// straight-line length of `total_km`.
pub fn open_path_points(start: &Coordinates, total_km: f64, legs: usize) -> Vec<Coordinates> {
    let legs = legs.max(1);
    let leg_km = total_km / legs as f64;
    let mut bearing: f64 = PI / 3.0;
    let mut points = vec![*start];
    let mut current = *start;

    for i in 0..legs {
        current = current.offset_km(leg_km * bearing.cos(), leg_km * bearing.sin());
        points.push(current);
        bearing += if i % 2 == 0 { OPEN_PATH_BEND_RAD } else { -OPEN_PATH_BEND_RAD / 2.0 };
    }
    points
}
