use crate::constants::KM_PER_DEGREE;
use crate::models::Coordinates;
use geo::{Centroid, MultiPoint, Point};

/// Arithmetic centroid of a point set, in degree space.
pub fn centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|c| Point::new(c.lng, c.lat))
        .collect::<Vec<_>>()
        .into();
    let center = multi.centroid()?;
    Coordinates::new(center.y(), center.x()).ok()
}

/// Equirectangular projection around `origin`, in kilometers (x east, y north).
/// Accurate enough at the tens-of-km scale of a single route.
pub fn to_local_km(origin: &Coordinates, point: &Coordinates) -> (f64, f64) {
    let cos_lat = origin.lat.to_radians().cos();
    let x = (point.lng - origin.lng) * KM_PER_DEGREE * cos_lat;
    let y = (point.lat - origin.lat) * KM_PER_DEGREE;
    (x, y)
}

/// Polar angle (radians, -PI to PI) of `target` as seen from `center`.
pub fn angle_from(center: &Coordinates, target: &Coordinates) -> f64 {
    let (x, y) = to_local_km(center, target);
    y.atan2(x)
}

/// Interior angle at `vertex` between the legs to `prev` and `next`, in
/// degrees. 180 means the path goes straight through; 0 means it doubles
/// back. `None` when either leg has zero length.
pub fn turn_angle_deg(prev: &Coordinates, vertex: &Coordinates, next: &Coordinates) -> Option<f64> {
    let (ax, ay) = to_local_km(vertex, prev);
    let (bx, by) = to_local_km(vertex, next);
    let len_a = (ax * ax + ay * ay).sqrt();
    let len_b = (bx * bx + by * by).sqrt();
    if len_a < 1e-9 || len_b < 1e-9 {
        return None;
    }
    let cos = ((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Population variance of `values` divided by the squared mean. Zero for
/// empty input or a zero mean.
pub fn normalized_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean.abs() < 1e-12 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance / (mean * mean)
}
