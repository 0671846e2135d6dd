//! Capability traits for the external collaborators of the pipeline.
//!
//! Each provider exposes one uniform call returning
//! `Result<_, ProviderError>`; resolvers hold ordered lists of them and
//! short-circuit on the first success.

use crate::error::ProviderError;
use crate::models::{Coordinates, GeocodeHit, RoutingProfile};
use async_trait::async_trait;

/// Generative text model endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run `prompt` against `model` and return the raw text of the reply.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// One geocoding backend in the resolver's chain.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Providers sharing credentials share a scope. An auth or quota failure
    /// in one skips the rest of that scope.
    fn credential_scope(&self) -> Option<&'static str> {
        None
    }

    async fn search(&self, query: &str) -> Result<GeocodeHit, ProviderError>;
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Configured and still within its call budget.
    fn is_available(&self) -> bool;

    async fn directions(
        &self,
        waypoints: &[Coordinates],
        profile: RoutingProfile,
    ) -> Result<DirectionsResponse, ProviderError>;
}

/// Best-effort representative image for a destination.
#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn find_image(&self, query: &str) -> Result<Option<String>, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct DirectionsResponse {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// GeoJSON coordinates as [lng, lat] pairs
    pub geometry: Vec<[f64; 2]>,
}

impl DirectionsResponse {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }

    /// Convert GeoJSON coordinates to our Coordinates type
    pub fn to_coordinates(&self) -> Vec<Coordinates> {
        self.geometry
            .iter()
            .filter_map(|coord| Coordinates::new(coord[1], coord[0]).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_response_conversions() {
        let response = DirectionsResponse {
            distance_meters: 5240.0,
            duration_seconds: 3720.0,
            geometry: vec![[2.3522, 48.8566], [2.2945, 48.8584], [500.0, 0.0]],
        };

        assert_eq!(response.distance_km(), 5.24);
        assert_eq!(response.duration_minutes(), 62.0);

        // Out-of-range positions are dropped
        let coords = response.to_coordinates();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0].lat, 48.8566);
        assert_eq!(coords[0].lng, 2.3522);
    }
}
