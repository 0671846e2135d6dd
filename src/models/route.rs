use crate::models::Coordinates;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Cycling,
    Trekking,
}

impl TripType {
    pub fn routing_profile(&self) -> RoutingProfile {
        match self {
            TripType::Cycling => RoutingProfile::RoadCycling,
            TripType::Trekking => RoutingProfile::FootHiking,
        }
    }

    /// Trekking routes are single-day loops that must return to their start.
    pub fn is_loop(&self) -> bool {
        matches!(self, TripType::Trekking)
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripType::Cycling => write!(f, "cycling"),
            TripType::Trekking => write!(f, "trekking"),
        }
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cycling" | "bike" | "bicycle" => Ok(TripType::Cycling),
            "trekking" | "hiking" | "walking" => Ok(TripType::Trekking),
            _ => Err(format!("Invalid trip type: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingProfile {
    RoadCycling,
    FootHiking,
}

impl RoutingProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingProfile::RoadCycling => "road-cycling",
            RoutingProfile::FootHiking => "foot-hiking",
        }
    }
}

impl fmt::Display for RoutingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl Difficulty {
    /// Classify from a measured distance and duration.
    pub fn classify(trip_type: TripType, distance_km: f64, duration_min: f64) -> Self {
        let hours = duration_min / 60.0;
        let (easy_km, easy_h, moderate_km, moderate_h) = match trip_type {
            TripType::Cycling => (30.0, 2.0, 60.0, 4.0),
            TripType::Trekking => (8.0, 3.0, 15.0, 6.0),
        };
        if distance_km < easy_km && hours < easy_h {
            Difficulty::Easy
        } else if distance_km < moderate_km && hours < moderate_h {
            Difficulty::Moderate
        } else {
            Difficulty::Hard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
        }
    }
}

/// Dense path produced by the routing resolver for one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteGeometry {
    pub coordinates: Vec<Coordinates>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub difficulty: Difficulty,
    pub source: String,
    pub profile: RoutingProfile,
}

/// Which rung of the degradation ladder produced the coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// Geocoded waypoints routed by a routing provider
    Provider,
    /// Geocoded waypoints joined by synthetic curvature
    GeocodedGeometric,
    /// Synthetic shape around the country's centroid
    CountryCentroid,
    /// Synthetic shape around the fixed default centroid
    DefaultCentroid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub country: String,
    #[serde(rename = "tripType")]
    pub trip_type: TripType,
    #[serde(default)]
    pub city: Option<String>,
}

impl RouteRequest {
    pub fn new(country: &str, trip_type: TripType, city: Option<&str>) -> Self {
        RouteRequest {
            country: country.to_string(),
            trip_type,
            city: city.map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let country = self.country.trim();
        if country.is_empty() {
            return Err("country must not be empty".to_string());
        }
        if country.chars().count() > 100 {
            return Err("country must be at most 100 characters".to_string());
        }
        if let Some(city) = &self.city {
            if city.chars().count() > 100 {
                return Err("city must be at most 100 characters".to_string());
            }
        }
        Ok(())
    }

    /// Trimmed city, with blank strings treated as absent.
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn country(&self) -> &str {
        self.country.trim()
    }

    /// Most specific place name in the request.
    pub fn place(&self) -> &str {
        self.city().unwrap_or_else(|| self.country())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRoute {
    pub day: u32,
    pub start_point: String,
    pub end_point: String,
    pub distance_km: f64,
    pub coordinates: Vec<Coordinates>,
    pub waypoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    pub coordinates: Vec<Coordinates>,
    pub waypoints: Vec<String>,
    pub daily_routes: Vec<DailyRoute>,
    /// Authoritative: always taken from the skeleton, never from a provider
    pub total_distance_km: f64,
    pub estimated_duration: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingMetadata {
    pub source: String,
    pub profile: RoutingProfile,
    pub fallback_tier: FallbackTier,
    /// What the router measured; diagnostic only
    pub measured_distance_km: f64,
    pub measured_duration_min: f64,
    /// `(measured - authoritative) / authoritative`
    pub distance_discrepancy: f64,
    pub geocoded_waypoints: Vec<GeocodedWaypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedWaypoint {
    pub name: String,
    pub coordinates: Coordinates,
    pub source: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub id: Uuid,
    pub model: String,
    pub generated_at: String,
    /// Skeleton exactly as the model returned it
    pub skeleton: serde_json::Value,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedRoute {
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub trip_type: TripType,
    pub route_data: RouteData,
    pub image_url: Option<String>,
    pub routing_metadata: RoutingMetadata,
    pub generation_metadata: GenerationMetadata,
}

impl SynthesizedRoute {
    /// Render the route as GeoJSON: the full path, one line per day, and one
    /// point per geocoded waypoint. GeoJSON positions are `[lng, lat]`.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::new();

        features.push(feature(
            line_string(&self.route_data.coordinates),
            json!({
                "kind": "route",
                "tripType": self.trip_type,
                "totalDistanceKm": self.route_data.total_distance_km,
                "difficulty": self.route_data.difficulty,
            }),
        ));

        for day in &self.route_data.daily_routes {
            features.push(feature(
                line_string(&day.coordinates),
                json!({
                    "kind": "day",
                    "day": day.day,
                    "startPoint": day.start_point,
                    "endPoint": day.end_point,
                    "distanceKm": day.distance_km,
                }),
            ));
        }

        for waypoint in &self.routing_metadata.geocoded_waypoints {
            features.push(feature(
                Value::Point(vec![waypoint.coordinates.lng, waypoint.coordinates.lat]),
                json!({
                    "kind": "waypoint",
                    "name": waypoint.name,
                    "displayName": waypoint.display_name,
                }),
            ));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

fn line_string(path: &[Coordinates]) -> Value {
    Value::LineString(path.iter().map(|c| vec![c.lng, c.lat]).collect())
}

fn feature(value: Value, properties: serde_json::Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties,
        foreign_members: None,
    }
}
