use serde::{Deserialize, Deserializer, Serialize};

use super::route::TripType;

/// Day-by-day route description produced by the generative model, before any
/// coordinates exist. Fields are optional where the model may omit them so the
/// validator, not the parser, decides what is fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSkeleton {
    #[serde(default)]
    pub day1: Option<DaySpec>,
    #[serde(default)]
    pub day2: Option<DaySpec>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_distance_km: Option<f64>,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySpec {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    /// `None` when the model produced anything other than a JSON number
    #[serde(default, deserialize_with = "lenient_number")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub waypoints: Vec<String>,
}

/// Accept any JSON value; keep it only when it is a finite number.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

impl DaySpec {
    pub fn new(start: &str, end: &str, distance_km: f64, waypoints: &[&str]) -> Self {
        DaySpec {
            start: start.to_string(),
            end: end.to_string(),
            distance_km: Some(distance_km),
            waypoints: waypoints.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn positive_distance(&self) -> Option<f64> {
        self.distance_km.filter(|d| *d > 0.0)
    }
}

impl RouteSkeleton {
    pub fn days(&self) -> impl Iterator<Item = &DaySpec> {
        self.day1.iter().chain(self.day2.iter())
    }

    /// The distance the output must report: sum of per-day figures, else the
    /// declared total, else `default_km`.
    pub fn authoritative_total_km(&self, default_km: f64) -> f64 {
        let per_day: Vec<f64> = self.days().filter_map(DaySpec::positive_distance).collect();
        if !per_day.is_empty() {
            return per_day.iter().sum();
        }
        self.total_distance_km
            .filter(|d| *d > 0.0)
            .unwrap_or(default_km)
    }

    /// Skeleton used when no model output is available at all.
    pub fn fallback(trip_type: TripType, place: &str, default_total_km: f64, cycling_day_km: f64) -> Self {
        match trip_type {
            TripType::Trekking => RouteSkeleton {
                day1: Some(DaySpec::new(place, place, default_total_km, &[])),
                day2: None,
                total_distance_km: Some(default_total_km),
                estimated_duration: None,
                difficulty: None,
            },
            TripType::Cycling => RouteSkeleton {
                day1: Some(DaySpec::new(place, "", cycling_day_km, &[])),
                day2: Some(DaySpec::new("", "", cycling_day_km, &[])),
                total_distance_km: Some(cycling_day_km * 2.0),
                estimated_duration: None,
                difficulty: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_camel_case_skeleton() {
        let json = r#"{
            "day1": {"start": "Paris", "end": "Fontainebleau", "distanceKm": 55, "waypoints": ["Evry"]},
            "day2": {"start": "Fontainebleau", "end": "Sens", "distanceKm": 45.5, "waypoints": []},
            "totalDistanceKm": 100.5,
            "estimatedDuration": "2 days",
            "difficulty": "moderate"
        }"#;
        let skeleton: RouteSkeleton = serde_json::from_str(json).unwrap();
        let day1 = skeleton.day1.as_ref().unwrap();
        assert_eq!(day1.start, "Paris");
        assert_eq!(day1.distance_km, Some(55.0));
        assert_eq!(day1.waypoints, vec!["Evry"]);
        assert_eq!(skeleton.day2.as_ref().unwrap().distance_km, Some(45.5));
        assert_eq!(skeleton.difficulty.as_deref(), Some("moderate"));
    }

    #[test]
    fn test_non_numeric_distance_becomes_none() {
        let json = r#"{"day1": {"start": "A", "end": "B", "distanceKm": "55 km"}}"#;
        let skeleton: RouteSkeleton = serde_json::from_str(json).unwrap();
        assert_eq!(skeleton.day1.unwrap().distance_km, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let skeleton: RouteSkeleton = serde_json::from_str("{}").unwrap();
        assert!(skeleton.day1.is_none());
        assert!(skeleton.total_distance_km.is_none());
    }

    #[test]
    fn test_authoritative_total_prefers_day_sum() {
        let skeleton = RouteSkeleton {
            day1: Some(DaySpec::new("Paris", "Fontainebleau", 55.0, &[])),
            day2: Some(DaySpec::new("Fontainebleau", "Sens", 45.0, &[])),
            total_distance_km: Some(120.0),
            ..Default::default()
        };
        assert_eq!(skeleton.authoritative_total_km(10.0), 100.0);
    }

    #[test]
    fn test_authoritative_total_falls_back() {
        let declared = RouteSkeleton {
            day1: Some(DaySpec {
                distance_km: None,
                ..Default::default()
            }),
            total_distance_km: Some(12.0),
            ..Default::default()
        };
        assert_eq!(declared.authoritative_total_km(10.0), 12.0);

        let empty = RouteSkeleton::default();
        assert_eq!(empty.authoritative_total_km(10.0), 10.0);
    }

    #[test]
    fn test_fallback_shapes() {
        let trek = RouteSkeleton::fallback(TripType::Trekking, "Nice", 10.0, 50.0);
        assert!(trek.day2.is_none());
        assert_eq!(trek.authoritative_total_km(10.0), 10.0);

        let ride = RouteSkeleton::fallback(TripType::Cycling, "France", 10.0, 50.0);
        assert_eq!(ride.days().count(), 2);
        assert_eq!(ride.authoritative_total_km(10.0), 100.0);
    }
}
