use crate::constants::KM_PER_DEGREE;
use serde::{Deserialize, Serialize};

/// A WGS84 position. Serialized as a `[lat, lng]` pair, the order map
/// clients of this service consume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lng
            ));
        }
        Ok(Coordinates { lat, lng })
    }

    /// Calculate distance between two coordinates using Haversine formula
    /// Returns distance in kilometers
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        self.distance_to(other) * 1000.0
    }

    /// Move by the given kilometre offsets (flat-earth approximation, fine
    /// for the few-dozen-km scale of a day route). Latitude is clamped and
    /// longitude wrapped so the result is always valid.
    pub fn offset_km(&self, north_km: f64, east_km: f64) -> Coordinates {
        let lat = (self.lat + north_km / KM_PER_DEGREE).clamp(-89.9, 89.9);
        let cos_lat = self.lat.to_radians().cos().max(0.01);
        let mut lng = self.lng + east_km / (KM_PER_DEGREE * cos_lat);
        if lng > 180.0 {
            lng -= 360.0;
        } else if lng < -180.0 {
            lng += 360.0;
        }
        Coordinates { lat, lng }
    }

    /// Linear interpolation in degree space; `t` in [0, 1].
    pub fn lerp(&self, other: &Coordinates, t: f64) -> Coordinates {
        Coordinates {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Index of the path vertex closest to this point.
    pub fn nearest_index(&self, path: &[Coordinates]) -> Option<usize> {
        path.iter()
            .enumerate()
            .map(|(i, p)| (i, self.distance_to(p)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

impl TryFrom<[f64; 2]> for Coordinates {
    type Error = String;

    fn try_from(pair: [f64; 2]) -> Result<Self, Self::Error> {
        Coordinates::new(pair[0], pair[1])
    }
}

/// Sum of great-circle segment lengths along a path, in kilometers.
pub fn path_length_km(path: &[Coordinates]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(48.8566, 2.3522).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err()); // Invalid lat
        assert!(Coordinates::new(0.0, 181.0).is_err()); // Invalid lng
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_distance_calculation() {
        let paris = Coordinates::new(48.8566, 2.3522).unwrap();
        let london = Coordinates::new(51.5074, -0.1278).unwrap();

        let distance = paris.distance_to(&london);
        // Paris to London is approximately 344 km
        assert!((distance - 344.0).abs() < 10.0);
    }

    #[test]
    fn test_serializes_as_lat_lng_pair() {
        let coords = Coordinates::new(43.7102, 7.262).unwrap();
        let json = serde_json::to_string(&coords).unwrap();
        assert_eq!(json, "[43.7102,7.262]");

        let back: Coordinates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coords);

        assert!(serde_json::from_str::<Coordinates>("[95.0,0.0]").is_err());
    }

    #[test]
    fn test_offset_km() {
        let start = Coordinates::new(45.0, 6.0).unwrap();
        let north = start.offset_km(10.0, 0.0);
        let east = start.offset_km(0.0, 10.0);

        assert!((start.distance_to(&north) - 10.0).abs() < 0.2);
        assert!((start.distance_to(&east) - 10.0).abs() < 0.2);
        assert!(north.lat > start.lat);
        assert!(east.lng > start.lng);
    }

    #[test]
    fn test_offset_wraps_antimeridian() {
        let start = Coordinates::new(0.0, 179.99).unwrap();
        let moved = start.offset_km(0.0, 10.0);
        assert!(Coordinates::new(moved.lat, moved.lng).is_ok());
        assert!(moved.lng < 0.0);
    }

    #[test]
    fn test_nearest_index() {
        let path = vec![
            Coordinates::new(48.0, 2.0).unwrap(),
            Coordinates::new(48.1, 2.1).unwrap(),
            Coordinates::new(48.2, 2.2).unwrap(),
        ];
        let probe = Coordinates::new(48.11, 2.09).unwrap();
        assert_eq!(probe.nearest_index(&path), Some(1));
        assert_eq!(probe.nearest_index(&[]), None);
    }

    #[test]
    fn test_path_length() {
        let a = Coordinates::new(48.0, 2.0).unwrap();
        let b = a.offset_km(3.0, 0.0);
        let c = b.offset_km(0.0, 4.0);
        let total = path_length_km(&[a, b, c]);
        assert!((total - 7.0).abs() < 0.1);
        assert_eq!(path_length_km(&[a]), 0.0);
    }
}
