use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

/// A place name resolved to a position. Immutable once created; the
/// geocoding cache hands out clones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedPoint {
    /// The query as it was asked
    pub name: String,
    pub coordinates: Coordinates,
    /// Id of the provider that resolved it
    pub source: String,
    /// Provider-specific precision hint (e.g. "ROOFTOP", "tourism", "city")
    pub accuracy: String,
    pub display_name: String,
}

/// Raw hit returned by a single geocoding provider.
#[derive(Debug, Clone)]
pub struct GeocodeHit {
    pub coordinates: Coordinates,
    pub display_name: String,
    pub place_type: String,
    pub raw: serde_json::Value,
}

impl GeocodedPoint {
    pub fn from_hit(name: &str, source: &str, hit: GeocodeHit) -> Self {
        GeocodedPoint {
            name: name.to_string(),
            coordinates: hit.coordinates,
            source: source.to_string(),
            accuracy: hit.place_type,
            display_name: hit.display_name,
        }
    }
}
