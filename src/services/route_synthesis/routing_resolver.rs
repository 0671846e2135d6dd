use super::geometric_path::{circle_points, circle_through, synthesize_path, PathStyle};
use crate::config::RouteSynthesisConfig;
use crate::constants::{
    CIRCULAR_ROUTE_POINTS, CYCLING_AVERAGE_SPEED_KMH, GEOMETRIC_SOURCE, TREKKING_AVERAGE_SPEED_KMH,
};
use crate::error::{AppError, ProviderError, Result};
use crate::models::{path_length_km, Coordinates, Difficulty, RouteGeometry, TripType};
use crate::services::providers::RoutingProvider;
use std::sync::Arc;
use std::time::Duration;

/// Turns sparse coordinates into a dense path. Routing providers are tried
/// in order; when none is available or all fail, the path is synthesized
/// geometrically. Routing itself never fails for two or more points.
#[derive(Clone)]
pub struct RoutingResolver {
    providers: Vec<Arc<dyn RoutingProvider>>,
    timeout: Duration,
    closure_tolerance_m: f64,
    circular_radius_factor: f64,
}

impl RoutingResolver {
    pub fn new(providers: Vec<Arc<dyn RoutingProvider>>, config: &RouteSynthesisConfig) -> Self {
        RoutingResolver {
            providers,
            timeout: config.routing_timeout(),
            closure_tolerance_m: config.loop_closure_tolerance_m,
            circular_radius_factor: config.circular_radius_factor,
        }
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub async fn route(&self, points: &[Coordinates], trip_type: TripType) -> Result<RouteGeometry> {
        if points.len() < 2 {
            return Err(AppError::RoutingFailed(format!(
                "at least 2 points required, got {}",
                points.len()
            )));
        }

        let mut geometry = match self.route_with_providers(points, trip_type).await {
            Some(geometry) => geometry,
            None => {
                tracing::warn!(
                    points = points.len(),
                    "No routing provider produced a path, synthesizing geometrically"
                );
                Self::geometric(points, trip_type)
            }
        };

        if trip_type.is_loop() {
            self.close_loop(&mut geometry, trip_type);
        }
        Ok(geometry)
    }

    /// Loop of roughly `distance_km` that starts and ends at `start`,
    /// through evenly spaced points on a circle passing through it.
    pub async fn circular_route(
        &self,
        start: &Coordinates,
        distance_km: f64,
        trip_type: TripType,
    ) -> Result<RouteGeometry> {
        let radius_km = self.circular_radius_km(distance_km);
        let mut points = circle_through(start, radius_km, CIRCULAR_ROUTE_POINTS);
        points.push(*start);

        tracing::debug!(
            radius_km = radius_km,
            "Circular route: {} points on a {:.2}km circle from ({:.4}, {:.4})",
            CIRCULAR_ROUTE_POINTS,
            radius_km,
            start.lat,
            start.lng
        );

        let mut geometry = self.route(&points, trip_type).await?;
        self.close_loop(&mut geometry, trip_type);
        Ok(geometry)
    }

    /// Same shape as [`circular_route`](Self::circular_route), synthesized
    /// without any provider.
    pub fn geometric_loop(&self, center: &Coordinates, distance_km: f64, trip_type: TripType) -> RouteGeometry {
        let points = closed_circle(center, self.circular_radius_km(distance_km));
        let mut geometry = Self::geometric(&points, trip_type);
        self.close_loop(&mut geometry, trip_type);
        geometry
    }

    fn circular_radius_km(&self, distance_km: f64) -> f64 {
        distance_km / std::f64::consts::TAU * self.circular_radius_factor
    }

    /// Path built from the points alone, with no provider involved.
    pub fn geometric(points: &[Coordinates], trip_type: TripType) -> RouteGeometry {
        let coordinates = synthesize_path(points, PathStyle::for_trip(trip_type));
        let distance_km = path_length_km(&coordinates);
        let duration_min = estimated_duration_min(distance_km, trip_type);
        RouteGeometry {
            difficulty: Difficulty::classify(trip_type, distance_km, duration_min),
            coordinates,
            distance_km,
            duration_min,
            source: GEOMETRIC_SOURCE.to_string(),
            profile: trip_type.routing_profile(),
        }
    }

    async fn route_with_providers(
        &self,
        points: &[Coordinates],
        trip_type: TripType,
    ) -> Option<RouteGeometry> {
        let profile = trip_type.routing_profile();

        for provider in &self.providers {
            if !provider.is_available() {
                tracing::debug!(
                    provider = provider.id(),
                    "Routing provider {} unavailable (unconfigured or over budget)",
                    provider.id()
                );
                continue;
            }

            let outcome = match tokio::time::timeout(self.timeout, provider.directions(points, profile)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };

            match outcome {
                Ok(directions) => {
                    let coordinates = directions.to_coordinates();
                    if coordinates.len() < 2 {
                        tracing::warn!(
                            provider = provider.id(),
                            "Routing provider {} returned a degenerate path",
                            provider.id()
                        );
                        continue;
                    }
                    let distance_km = directions.distance_km();
                    let duration_min = directions.duration_minutes();
                    tracing::info!(
                        provider = provider.id(),
                        profile = %profile,
                        "Routed {} points via {}: {:.2}km, {:.0}min",
                        points.len(),
                        provider.id(),
                        distance_km,
                        duration_min
                    );
                    return Some(RouteGeometry {
                        coordinates,
                        distance_km,
                        duration_min,
                        difficulty: Difficulty::classify(trip_type, distance_km, duration_min),
                        source: provider.id().to_string(),
                        profile,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.id(),
                        error = %e,
                        "Routing via {} failed: {}",
                        provider.id(),
                        e
                    );
                }
            }
        }

        None
    }

    /// Append the start when the path ends beyond the closure tolerance.
    fn close_loop(&self, geometry: &mut RouteGeometry, trip_type: TripType) {
        let (Some(first), Some(last)) = (
            geometry.coordinates.first().copied(),
            geometry.coordinates.last().copied(),
        ) else {
            return;
        };

        let gap_m = first.distance_m(&last);
        if gap_m > self.closure_tolerance_m {
            tracing::debug!(gap_m = gap_m, "Closing loop: path ended {:.0}m from its start", gap_m);
            geometry.coordinates.push(first);
            geometry.distance_km += gap_m / 1000.0;
            geometry.duration_min = geometry
                .duration_min
                .max(estimated_duration_min(geometry.distance_km, trip_type));
        }
    }
}

fn closed_circle(center: &Coordinates, radius_km: f64) -> Vec<Coordinates> {
    let mut points = circle_points(center, radius_km, CIRCULAR_ROUTE_POINTS);
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}

/// Duration at the activity's average speed.
pub fn estimated_duration_min(distance_km: f64, trip_type: TripType) -> f64 {
    let speed = match trip_type {
        TripType::Cycling => CYCLING_AVERAGE_SPEED_KMH,
        TripType::Trekking => TREKKING_AVERAGE_SPEED_KMH,
    };
    distance_km / speed * 60.0
}
